//! Per-element lifecycle events (create, move, destroy) and the pipeline
//! that applies them at a fixed point in the frame.

mod flags;
mod pipeline;

pub use flags::EventFlags;
pub use pipeline::{mark_create, mark_destroy, mark_move, EventPipeline};
