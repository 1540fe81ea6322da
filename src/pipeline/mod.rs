// Alert pipeline
// Serializes trigger matches into alert events: resolve location, then dispatch.
// At most one event is in flight; later matches queue in arrival order.

mod handle;
mod worker;

pub use handle::{PipelineError, PipelineHandle};
pub use worker::{AlertPipeline, PipelineState};

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
