// spanrelay-exporter - Where received telemetry goes
//
// Each exporter implements `Push<T>`; wrapping it in `Exporter` gives a
// named `Consumer<T>` with per-exporter sent/dropped accounting, ready to be
// placed in a fan-out.

mod error;
mod forward;
mod helper;
mod jaeger;
mod logging;
mod sink;

pub use error::ExporterError;
pub use forward::ForwardExporter;
pub use helper::{Exporter, Push};
pub use jaeger::{HttpJaegerClient, JaegerClient, JaegerExporter};
pub use logging::LoggingExporter;
pub use sink::SinkExporter;
