//! Received/dropped accounting per receiver and per (receiver, exporter).
//!
//! Counters are kept in an explicitly constructed registry so that tests and
//! embedders can inspect them, and every update is mirrored to the `metrics`
//! facade.

use metrics::counter;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Default)]
struct Counters {
    received: AtomicU64,
    dropped: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            received: self.received.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub received: u64,
    pub dropped: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservabilitySnapshot {
    pub receivers: BTreeMap<String, CounterSnapshot>,
    pub exporters: BTreeMap<(String, String), CounterSnapshot>,
}

#[derive(Debug, Default)]
pub struct Observability {
    receivers: RwLock<BTreeMap<String, Arc<Counters>>>,
    exporters: RwLock<BTreeMap<(String, String), Arc<Counters>>>,
}

impl Observability {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn receiver(&self, receiver: &str) -> Arc<Counters> {
        if let Some(counters) = self.receivers.read().get(receiver) {
            return counters.clone();
        }
        self.receivers
            .write()
            .entry(receiver.to_string())
            .or_default()
            .clone()
    }

    fn exporter(&self, receiver: &str, exporter: &str) -> Arc<Counters> {
        let key = (receiver.to_string(), exporter.to_string());
        if let Some(counters) = self.exporters.read().get(&key) {
            return counters.clone();
        }
        self.exporters.write().entry(key).or_default().clone()
    }

    pub fn record_received(&self, receiver: &str, items: usize) {
        if items == 0 {
            return;
        }
        self.receiver(receiver)
            .received
            .fetch_add(items as u64, Ordering::Relaxed);
        counter!("spanrelay.receiver.received", items as u64, "receiver" => receiver.to_string());
    }

    pub fn record_dropped(&self, receiver: &str, items: usize) {
        if items == 0 {
            return;
        }
        self.receiver(receiver)
            .dropped
            .fetch_add(items as u64, Ordering::Relaxed);
        counter!("spanrelay.receiver.dropped", items as u64, "receiver" => receiver.to_string());
    }

    /// Record the outcome of one push to an exporter.
    pub fn record_exported(&self, receiver: &str, exporter: &str, sent: usize, dropped: usize) {
        let counters = self.exporter(receiver, exporter);
        if sent > 0 {
            counters.received.fetch_add(sent as u64, Ordering::Relaxed);
            counter!(
                "spanrelay.exporter.sent",
                sent as u64,
                "receiver" => receiver.to_string(),
                "exporter" => exporter.to_string()
            );
        }
        if dropped > 0 {
            counters.dropped.fetch_add(dropped as u64, Ordering::Relaxed);
            counter!(
                "spanrelay.exporter.dropped",
                dropped as u64,
                "receiver" => receiver.to_string(),
                "exporter" => exporter.to_string()
            );
        }
    }

    pub fn receiver_stats(&self, receiver: &str) -> CounterSnapshot {
        self.receivers
            .read()
            .get(receiver)
            .map(|c| c.snapshot())
            .unwrap_or_default()
    }

    pub fn exporter_stats(&self, receiver: &str, exporter: &str) -> CounterSnapshot {
        self.exporters
            .read()
            .get(&(receiver.to_string(), exporter.to_string()))
            .map(|c| c.snapshot())
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> ObservabilitySnapshot {
        ObservabilitySnapshot {
            receivers: self
                .receivers
                .read()
                .iter()
                .map(|(k, v)| (k.clone(), v.snapshot()))
                .collect(),
            exporters: self
                .exporters
                .read()
                .iter()
                .map(|(k, v)| (k.clone(), v.snapshot()))
                .collect(),
        }
    }

    /// Log the final counters, one line per receiver and exporter.
    pub fn log_summary(&self) {
        let snapshot = self.snapshot();
        for (receiver, stats) in &snapshot.receivers {
            info!(
                receiver = %receiver,
                received = stats.received,
                dropped = stats.dropped,
                "Receiver totals"
            );
        }
        for ((receiver, exporter), stats) in &snapshot.exporters {
            info!(
                receiver = %receiver,
                exporter = %exporter,
                sent = stats.received,
                dropped = stats.dropped,
                "Exporter totals"
            );
        }
    }
}
