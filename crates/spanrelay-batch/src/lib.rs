// spanrelay-batch - Decoupling network receipt from downstream processing
//
// `Dispatcher` owns the bounded queue and the worker pool that drains it.
// `BufferedConsumer` optionally sits between the workers and the exporters
// and coalesces small batches from the same node and resource.

mod buffered;
mod dispatch;

pub use buffered::{BufferConfig, BufferedConsumer};
pub use dispatch::{
    DispatchConfig, DispatchError, DispatchHandle, DispatchMetrics, DispatchMetricsSnapshot,
    Dispatcher,
};
