// Initialization utilities for server mode
//
// Logging setup and the startup summary of what the relay will do

use spanrelay_config::{LogFormat, RuntimeConfig, ServerConfig};
use tracing::{info, warn};

/// Initialize tracing/logging from ServerConfig
pub fn init_tracing(server: &ServerConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Parse log level from config
    let env_filter =
        EnvFilter::try_new(&server.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // Try to set the global subscriber; ignore error if already set (idempotent)
    let _ = match server.log_format {
        LogFormat::Json => {
            tracing::subscriber::set_global_default(registry.with(fmt::layer().json()))
        }
        LogFormat::Text => tracing::subscriber::set_global_default(registry.with(fmt::layer())),
    };
}

/// Log the resolved receiver, exporter and TLS settings.
pub(crate) fn log_startup(config: &RuntimeConfig) {
    let receiver = &config.receiver;
    info!(
        address = %receiver.address,
        workers = receiver.workers,
        queue_size = receiver.queue_size,
        traces = !receiver.disable_tracing,
        metrics = !receiver.disable_metrics,
        "Receiver configuration"
    );

    if receiver.buffering_enabled() {
        info!(
            period_ms = receiver.buffer_period_ms,
            max_items = receiver.buffer_max_items,
            "Buffering enabled"
        );
    }

    if let Some(tls) = receiver.tls.as_ref() {
        warn!(
            cert_file = %tls.cert_file,
            key_file = %tls.key_file,
            "TLS credentials validated but not used: the relay serves plaintext, \
             terminate TLS in a proxy in front of it"
        );
    }

    let exporters = &config.exporters;
    if let Some(logging) = exporters.logging.as_ref() {
        info!(verbose = logging.verbose, "Exporter: logging");
    }
    if let Some(forward) = exporters.forward.as_ref() {
        info!(address = %forward.address, "Exporter: forward");
    }
    if let Some(jaeger) = exporters.jaeger.as_ref() {
        info!(endpoint = %jaeger.collector_endpoint, "Exporter: jaeger");
    }
    if exporters.is_empty() {
        warn!("No exporters configured, received data will be discarded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spanrelay_config::TlsConfig;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn startup_log(config: &RuntimeConfig) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || log_startup(config));
        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_tls_pair_warns_about_plaintext() {
        let mut config = RuntimeConfig::default();
        config.receiver.tls = Some(TlsConfig {
            cert_file: "/etc/relay/cert.pem".into(),
            key_file: "/etc/relay/key.pem".into(),
        });

        let log = startup_log(&config);
        let line = log
            .lines()
            .find(|l| l.contains("cert.pem"))
            .expect("TLS line logged");
        assert!(line.contains("WARN"));
        assert!(line.contains("plaintext"));
    }

    #[test]
    fn test_no_tls_line_without_pair() {
        let log = startup_log(&RuntimeConfig::default());
        assert!(!log.contains("TLS"));
    }
}
