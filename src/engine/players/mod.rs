// Local players
//
// Player slots are bound to a device when they join and carry an open-ended
// bag of typed values (team, loadout, ...) until they leave.

pub mod data;
pub mod manager;

pub use data::{PlayerData, PlayerValue};
pub use manager::{PlayerError, PlayerEvent, PlayerManager, PlayerSession, MAX_PLAYERS};
