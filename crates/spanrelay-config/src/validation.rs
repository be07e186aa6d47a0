// Configuration validation
//
// Validates that required fields are present and values are sensible

use crate::*;
use anyhow::{bail, Result};
use std::path::Path;
use tracing::warn;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_receiver_config(&config.receiver)?;
    validate_exporters_config(&config.exporters)?;
    validate_server_config(&config.server)?;
    Ok(())
}

fn validate_address(field: &str, addr: &str) -> Result<()> {
    if addr.is_empty() {
        bail!("{} must not be empty", field);
    }
    // Basic validation that it looks like an address
    if !addr.contains(':') {
        bail!("{} must be in format 'host:port'", field);
    }
    Ok(())
}

fn validate_receiver_config(config: &ReceiverConfig) -> Result<()> {
    validate_address("receiver.address", &config.address)?;

    if config.workers == 0 {
        bail!("receiver.workers must be greater than 0");
    }

    if config.queue_size == 0 {
        bail!("receiver.queue_size must be greater than 0");
    }

    if config.buffering_enabled() && config.buffer_max_items == 0 {
        bail!("receiver.buffer_max_items must be greater than 0 when buffering is enabled");
    }

    if config.workers > 1024 {
        warn!(
            workers = config.workers,
            "receiver.workers is very large; most workers will sit idle"
        );
    }

    if config.disable_tracing && config.disable_metrics {
        warn!("Both tracing and metrics reception are disabled; every stream will be rejected");
    }

    if let Some(tls) = &config.tls {
        validate_tls_config(tls)?;
    }

    Ok(())
}

fn validate_tls_config(config: &TlsConfig) -> Result<()> {
    match (config.cert_file.is_empty(), config.key_file.is_empty()) {
        (true, true) => bail!("receiver.tls requires cert_file and key_file"),
        (false, true) => bail!("receiver.tls.key_file is required when cert_file is set"),
        (true, false) => bail!("receiver.tls.cert_file is required when key_file is set"),
        (false, false) => {}
    }

    for (field, path) in [("cert_file", &config.cert_file), ("key_file", &config.key_file)] {
        if let Err(e) = std::fs::File::open(Path::new(path)) {
            bail!("receiver.tls.{} '{}' is not readable: {}", field, path, e);
        }
    }

    Ok(())
}

fn validate_exporters_config(config: &ExportersConfig) -> Result<()> {
    if config.is_empty() {
        warn!("No exporters configured; received telemetry will be discarded");
    }

    if let Some(forward) = &config.forward {
        validate_address("exporters.forward.address", &forward.address)?;
        if forward.connect_timeout_ms == 0 {
            bail!("exporters.forward.connect_timeout_ms must be greater than 0");
        }
    }

    if let Some(jaeger) = &config.jaeger {
        let endpoint = &jaeger.collector_endpoint;
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            bail!(
                "exporters.jaeger.collector_endpoint must be an http(s) URL, got '{}'",
                endpoint
            );
        }
        if jaeger.timeout_secs == 0 {
            bail!("exporters.jaeger.timeout_secs must be greater than 0");
        }
    }

    Ok(())
}

fn validate_server_config(config: &ServerConfig) -> Result<()> {
    if let Some(addr) = &config.http_address {
        validate_address("server.http_address", addr)?;
    }

    if config.cors_allowed_origins.iter().any(|o| o == "*")
        && config.cors_allowed_origins.len() > 1
    {
        warn!("server.cors_allowed_origins contains '*'; other entries are redundant");
    }

    Ok(())
}
