//! Module lifecycle, ordered dispatch, scene gating, and the clock and
//! render-hook abstractions a frame driver wires together.

mod clock;
mod module;
mod registry;
mod render;
mod scene;

pub use clock::{Clock, FixedClock, SystemClock};
pub use module::Module;
pub use registry::ModuleRegistry;
pub use render::RenderHook;
pub use scene::{gate_task, scene_driver_task, SceneGate, SceneId, SceneState};
