// Device-scoped input actions
//
// One catalog of logical actions ("jump", "ui_accept", ...) drives any number
// of devices without them interfering with each other.
//
// ## Architecture
//
// - `event`: Device ids and the physical events actions are bound to
// - `catalog`: Logical action definitions loaded from the input config
// - `action_map`: Active actions and their per-frame state
// - `source`: Interface to the platform layer that owns the devices
// - `registry`: Per-device action namespaces and device-scoped queries
// - `session`: A device's view of the registry
// - `virtual_backend`: In-memory device source fed by winit events
//
// ## Usage Example
//
// ```rust
// use couch_input::engine::input::{
//     ActionRegistry, DeviceId, DeviceSession, InputConfig, VirtualBackend,
// };
//
// let config = InputConfig::builtin()?;
// let mut registry = ActionRegistry::initialize(config.catalog, VirtualBackend::new());
// let pad = DeviceSession::bind(DeviceId::joypad(0), &mut registry);
//
// // Once per frame, after feeding events to the backend
// registry.update();
//
// if pad.just_pressed(&registry, "jump", false) {
//     // Joypad 0 just pressed jump, no matter what the other devices do
// }
// ```

pub mod action_map;
pub mod catalog;
pub mod event;
pub mod registry;
pub mod session;
pub mod source;
pub mod virtual_backend;

// Re-export commonly used types
pub use action_map::{ActionKey, ActionMap, ActionState};
pub use catalog::{ActionCatalog, ActionDefinition, CatalogError, InputConfig};
pub use event::{AxisDirection, DeviceFilter, DeviceId, InputEvent};
pub use registry::{ActionRegistry, RegistryError, UiRouting, UnresolvedReason};
pub use session::DeviceSession;
pub use source::{ConnectionChange, DeviceSource};
pub use virtual_backend::VirtualBackend;
