use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::Timestamp;

/// Identity of the process producing telemetry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Node {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<ProcessIdentifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library_info: Option<LibraryInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_info: Option<ServiceInfo>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl Node {
    /// A node carrying only a service name.
    pub fn for_service(name: impl Into<String>) -> Self {
        Self {
            service_info: Some(ServiceInfo { name: name.into() }),
            ..Default::default()
        }
    }

    pub fn service_name(&self) -> Option<&str> {
        self.service_info
            .as_ref()
            .map(|s| s.name.as_str())
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessIdentifier {
    pub host_name: String,
    pub pid: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_timestamp: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryInfo {
    pub language: Language,
    pub exporter_version: String,
    pub core_library_version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    Unspecified,
    Cpp,
    CSharp,
    Erlang,
    GoLang,
    Java,
    NodeJs,
    Php,
    Python,
    Ruby,
    WebJs,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Unspecified => "unspecified",
            Language::Cpp => "cpp",
            Language::CSharp => "c_sharp",
            Language::Erlang => "erlang",
            Language::GoLang => "go_lang",
            Language::Java => "java",
            Language::NodeJs => "node_js",
            Language::Php => "php",
            Language::Python => "python",
            Language::Ruby => "ruby",
            Language::WebJs => "web_js",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unspecified" | "" => Ok(Language::Unspecified),
            "cpp" | "c++" => Ok(Language::Cpp),
            "c_sharp" | "csharp" | "c#" => Ok(Language::CSharp),
            "erlang" => Ok(Language::Erlang),
            "go_lang" | "go" | "golang" => Ok(Language::GoLang),
            "java" => Ok(Language::Java),
            "node_js" | "nodejs" | "node" => Ok(Language::NodeJs),
            "php" => Ok(Language::Php),
            "python" => Ok(Language::Python),
            "ruby" => Ok(Language::Ruby),
            "web_js" | "webjs" => Ok(Language::WebJs),
            other => Err(format!("unknown library language: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceInfo {
    pub name: String,
}

/// Descriptive metadata about the environment producing telemetry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Resource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub labels: BTreeMap<String, String>,
}
