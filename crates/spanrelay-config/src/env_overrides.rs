use super::{ForwardExporterConfig, JaegerExporterConfig, LogFormat, RuntimeConfig, TlsConfig};
use anyhow::{anyhow, Context, Result};
use std::str::FromStr;

pub const ENV_PREFIX: &str = "SPANRELAY_";

/// Abstraction over environment-variable lookups so tests and embedders can
/// supply their own source of overrides.
pub trait EnvSource {
    /// Get a variable by its name without the SPANRELAY_ prefix.
    fn get(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides to the runtime config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    // Receiver
    if let Some(addr) = env.get("ADDRESS") {
        config.receiver.address = addr;
    }
    if let Some(val) = get_env_parsed::<usize, _>(env, "WORKERS")? {
        config.receiver.workers = val;
    }
    if let Some(val) = get_env_parsed::<usize, _>(env, "QUEUE_SIZE")? {
        config.receiver.queue_size = val;
    }
    if let Some(val) = get_env_parsed::<u64, _>(env, "BUFFER_PERIOD_MS")? {
        config.receiver.buffer_period_ms = val;
    }
    if let Some(val) = get_env_parsed::<usize, _>(env, "BUFFER_MAX_ITEMS")? {
        config.receiver.buffer_max_items = val;
    }
    if let Some(val) = get_env_parsed::<bool, _>(env, "DISABLE_TRACING")? {
        config.receiver.disable_tracing = val;
    }
    if let Some(val) = get_env_parsed::<bool, _>(env, "DISABLE_METRICS")? {
        config.receiver.disable_metrics = val;
    }
    if let Some(cert) = env.get("TLS_CERT_FILE") {
        ensure_tls(config).cert_file = cert;
    }
    if let Some(key) = env.get("TLS_KEY_FILE") {
        ensure_tls(config).key_file = key;
    }

    // Server (gateway, logging)
    if let Some(addr) = env.get("HTTP_ADDRESS") {
        config.server.http_address = if addr.is_empty() { None } else { Some(addr) };
    }
    if let Some(origins) = env.get("CORS_ALLOWED_ORIGINS") {
        config.server.cors_allowed_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Some(level) = env.get("LOG_LEVEL") {
        config.server.log_level = level;
    }
    if let Some(format) = env.get("LOG_FORMAT") {
        config.server.log_format = format
            .parse::<LogFormat>()
            .context("Invalid SPANRELAY_LOG_FORMAT value")?;
    }

    // Exporters
    if let Some(address) = env.get("FORWARD_ADDRESS") {
        match config.exporters.forward.as_mut() {
            Some(forward) => forward.address = address,
            None => {
                config.exporters.forward = Some(ForwardExporterConfig {
                    address,
                    connect_timeout_ms: super::default_connect_timeout_ms(),
                })
            }
        }
    }
    if let Some(endpoint) = env.get("JAEGER_ENDPOINT") {
        match config.exporters.jaeger.as_mut() {
            Some(jaeger) => jaeger.collector_endpoint = endpoint,
            None => {
                config.exporters.jaeger = Some(JaegerExporterConfig {
                    collector_endpoint: endpoint,
                    timeout_secs: super::default_jaeger_timeout_secs(),
                    headers: Default::default(),
                })
            }
        }
    }
    if let Some(val) = get_env_parsed::<bool, _>(env, "LOGGING_EXPORTER")? {
        if !val {
            config.exporters.logging = None;
        } else if config.exporters.logging.is_none() {
            config.exporters.logging = Some(Default::default());
        }
    }

    Ok(())
}

fn ensure_tls(config: &mut RuntimeConfig) -> &mut TlsConfig {
    config.receiver.tls.get_or_insert_with(TlsConfig::default)
}

fn get_env_parsed<T, E>(env: &E, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    E: EnvSource,
{
    match env.get(key) {
        Some(val) => {
            let parsed = val
                .trim()
                .parse::<T>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapEnv(HashMap<&'static str, &'static str>);

    impl EnvSource for MapEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(key).map(|v| v.to_string())
        }
    }

    #[test]
    fn test_env_overrides_apply() {
        let env = MapEnv(HashMap::from([
            ("ADDRESS", "127.0.0.1:9000"),
            ("WORKERS", "16"),
            ("DISABLE_METRICS", "true"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example,"),
            ("LOG_FORMAT", "json"),
            ("FORWARD_ADDRESS", "upstream:55678"),
            ("LOGGING_EXPORTER", "false"),
        ]));
        let mut config = RuntimeConfig::default();
        apply_env_overrides(&mut config, &env).unwrap();

        assert_eq!(config.receiver.address, "127.0.0.1:9000");
        assert_eq!(config.receiver.workers, 16);
        assert!(config.receiver.disable_metrics);
        assert!(!config.receiver.disable_tracing);
        assert_eq!(
            config.server.cors_allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(config.server.log_format, LogFormat::Json);
        assert_eq!(
            config.exporters.forward.as_ref().map(|f| f.address.as_str()),
            Some("upstream:55678")
        );
        assert!(config.exporters.logging.is_none());
    }

    #[test]
    fn test_env_parse_failure_names_variable() {
        let env = MapEnv(HashMap::from([("QUEUE_SIZE", "lots")]));
        let err = apply_env_overrides(&mut RuntimeConfig::default(), &env).unwrap_err();
        assert!(err.to_string().contains("SPANRELAY_QUEUE_SIZE"));
    }
}
