//! Device-scoped input actions and player sessions for local multiplayer games.
//!
//! A single catalog of logical actions is cloned per connected joypad so that
//! every device (and every player bound to one) can be queried with the same
//! action names without interfering with the others.

pub mod core;
pub mod engine;

pub use engine::input::{
    ActionCatalog, ActionRegistry, DeviceId, DeviceSession, DeviceSource, InputConfig,
    UiRouting, VirtualBackend,
};
pub use engine::players::{PlayerEvent, PlayerManager, PlayerValue};
