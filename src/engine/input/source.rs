// Interface to the platform layer that owns the physical devices

use super::event::{DeviceId, InputEvent};
use glam::Vec2;

/// A joypad attached or detached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionChange {
    pub device: DeviceId,
    pub connected: bool,
}

impl ConnectionChange {
    pub fn connected(device: DeviceId) -> Self {
        Self {
            device,
            connected: true,
        }
    }

    pub fn disconnected(device: DeviceId) -> Self {
        Self {
            device,
            connected: false,
        }
    }
}

/// Raw device state and joypad capabilities, as reported by the platform
///
/// Implementations only report physical state. Mapping that state onto
/// actions, per-device namespaces and players is done by the registry.
pub trait DeviceSource {
    /// Joypads currently connected, in platform order
    fn connected_joypads(&self) -> Vec<DeviceId>;

    /// Hardware GUID of a joypad (empty if unknown)
    fn joypad_guid(&self, device: DeviceId) -> String;

    /// Human readable joypad name
    fn joypad_name(&self, device: DeviceId) -> String;

    /// Whether the platform recognizes the joypad's layout
    fn is_joypad_known(&self, device: DeviceId) -> bool;

    /// Remaining duration of the current vibration, in seconds
    fn vibration_duration(&self, device: DeviceId) -> f32;

    /// Current vibration strength as (weak, strong) magnitudes
    fn vibration_strength(&self, device: DeviceId) -> Vec2;

    /// Start vibrating a joypad. A duration of 0.0 vibrates until stopped.
    fn start_vibration(&mut self, device: DeviceId, weak: f32, strong: f32, duration: f32);

    fn stop_vibration(&mut self, device: DeviceId);

    /// Raw strength (0.0 to 1.0) of a bound event at this moment.
    ///
    /// Joypad events honour their device filter. With `exact`, key events
    /// only count when the held modifiers match exactly.
    fn event_strength(&self, event: &InputEvent, exact: bool) -> f32;

    /// Connection changes since the last call, oldest first
    fn take_connection_changes(&mut self) -> Vec<ConnectionChange> {
        Vec::new()
    }
}
