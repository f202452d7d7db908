// In-memory device source fed by winit events and scripted joypads

use super::event::{DeviceFilter, DeviceId, InputEvent};
use super::source::{ConnectionChange, DeviceSource};
use glam::Vec2;
use std::collections::{BTreeMap, HashMap, HashSet};
use winit::event::{ElementState, KeyEvent, MouseButton};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};

/// Vibration currently requested on a joypad
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vibration {
    pub weak: f32,
    pub strong: f32,
    pub duration: f32,
}

/// State of one virtual joypad
#[derive(Debug, Clone)]
pub struct VirtualJoypad {
    guid: String,
    name: String,
    known: bool,
    buttons: HashSet<u8>,
    axes: HashMap<u8, f32>,
    vibration: Option<Vibration>,
}

impl VirtualJoypad {
    fn new(guid: String, name: String) -> Self {
        Self {
            guid,
            name,
            known: true,
            buttons: HashSet::new(),
            axes: HashMap::new(),
            vibration: None,
        }
    }

    fn button_strength(&self, button: u8) -> f32 {
        if self.buttons.contains(&button) {
            1.0
        } else {
            0.0
        }
    }

    fn axis_value(&self, axis: u8) -> f32 {
        self.axes.get(&axis).copied().unwrap_or(0.0)
    }
}

/// Device source backed by plain memory
///
/// The keyboard and mouse are fed from winit window events; joypads are
/// attached, detached and driven through method calls. Every attach/detach
/// is queued as a [`ConnectionChange`] for the registry to pick up.
#[derive(Debug)]
pub struct VirtualBackend {
    keys: HashSet<KeyCode>,
    mouse_buttons: HashSet<MouseButton>,
    modifiers: ModifiersState,
    joypads: BTreeMap<DeviceId, VirtualJoypad>,
    pending: Vec<ConnectionChange>,
}

impl VirtualBackend {
    pub fn new() -> Self {
        Self {
            keys: HashSet::new(),
            mouse_buttons: HashSet::new(),
            modifiers: ModifiersState::empty(),
            joypads: BTreeMap::new(),
            pending: Vec::new(),
        }
    }

    /// Process a keyboard event from winit
    pub fn process_keyboard_event(&mut self, event: &KeyEvent) {
        // Only process physical key presses
        if let PhysicalKey::Code(key_code) = event.physical_key {
            match event.state {
                ElementState::Pressed => {
                    if !event.repeat {
                        self.press_key(key_code);
                    }
                }
                ElementState::Released => self.release_key(key_code),
            }
        }
    }

    /// Process a mouse button event from winit
    pub fn process_mouse_button(&mut self, state: ElementState, button: MouseButton) {
        match state {
            ElementState::Pressed => self.press_mouse(button),
            ElementState::Released => self.release_mouse(button),
        }
    }

    pub fn set_modifiers(&mut self, modifiers: ModifiersState) {
        self.modifiers = modifiers;
    }

    pub fn press_key(&mut self, code: KeyCode) {
        self.keys.insert(code);
    }

    pub fn release_key(&mut self, code: KeyCode) {
        self.keys.remove(&code);
    }

    pub fn press_mouse(&mut self, button: MouseButton) {
        self.mouse_buttons.insert(button);
    }

    pub fn release_mouse(&mut self, button: MouseButton) {
        self.mouse_buttons.remove(&button);
    }

    /// Attach a joypad at a platform index. Reattaching an attached index is a no-op.
    pub fn connect_joypad(&mut self, index: u16, guid: &str, name: &str) -> DeviceId {
        let device = DeviceId::joypad(index);
        if !self.joypads.contains_key(&device) {
            self.joypads.insert(
                device,
                VirtualJoypad::new(guid.to_string(), name.to_string()),
            );
            self.pending.push(ConnectionChange::connected(device));
        }
        device
    }

    /// Detach a joypad, dropping its state
    pub fn disconnect_joypad(&mut self, device: DeviceId) {
        if self.joypads.remove(&device).is_some() {
            self.pending.push(ConnectionChange::disconnected(device));
        }
    }

    pub fn is_connected(&self, device: DeviceId) -> bool {
        device.is_keyboard() || self.joypads.contains_key(&device)
    }

    /// Mark a joypad as having an unrecognized layout
    pub fn set_known(&mut self, device: DeviceId, known: bool) {
        if let Some(pad) = self.joypads.get_mut(&device) {
            pad.known = known;
        }
    }

    pub fn press_button(&mut self, device: DeviceId, button: u8) {
        if let Some(pad) = self.joypads.get_mut(&device) {
            pad.buttons.insert(button);
        }
    }

    pub fn release_button(&mut self, device: DeviceId, button: u8) {
        if let Some(pad) = self.joypads.get_mut(&device) {
            pad.buttons.remove(&button);
        }
    }

    /// Set a joypad axis (-1.0 to 1.0)
    pub fn set_axis(&mut self, device: DeviceId, axis: u8, value: f32) {
        if let Some(pad) = self.joypads.get_mut(&device) {
            pad.axes.insert(axis, value.clamp(-1.0, 1.0));
        }
    }

    /// Vibration currently requested on a joypad
    pub fn vibration(&self, device: DeviceId) -> Option<Vibration> {
        self.joypads.get(&device).and_then(|pad| pad.vibration)
    }

    fn matching_joypads(&self, filter: DeviceFilter) -> impl Iterator<Item = &VirtualJoypad> {
        self.joypads
            .iter()
            .filter(move |(id, _)| filter.matches(**id))
            .map(|(_, pad)| pad)
    }
}

impl Default for VirtualBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceSource for VirtualBackend {
    fn connected_joypads(&self) -> Vec<DeviceId> {
        self.joypads.keys().copied().collect()
    }

    fn joypad_guid(&self, device: DeviceId) -> String {
        self.joypads
            .get(&device)
            .map(|pad| pad.guid.clone())
            .unwrap_or_default()
    }

    fn joypad_name(&self, device: DeviceId) -> String {
        self.joypads
            .get(&device)
            .map(|pad| pad.name.clone())
            .unwrap_or_default()
    }

    fn is_joypad_known(&self, device: DeviceId) -> bool {
        self.joypads.get(&device).is_some_and(|pad| pad.known)
    }

    fn vibration_duration(&self, device: DeviceId) -> f32 {
        self.vibration(device).map_or(0.0, |v| v.duration)
    }

    fn vibration_strength(&self, device: DeviceId) -> Vec2 {
        self.vibration(device)
            .map_or(Vec2::ZERO, |v| Vec2::new(v.weak, v.strong))
    }

    fn start_vibration(&mut self, device: DeviceId, weak: f32, strong: f32, duration: f32) {
        if let Some(pad) = self.joypads.get_mut(&device) {
            pad.vibration = Some(Vibration {
                weak: weak.clamp(0.0, 1.0),
                strong: strong.clamp(0.0, 1.0),
                duration: duration.max(0.0),
            });
        }
    }

    fn stop_vibration(&mut self, device: DeviceId) {
        if let Some(pad) = self.joypads.get_mut(&device) {
            pad.vibration = None;
        }
    }

    fn event_strength(&self, event: &InputEvent, exact: bool) -> f32 {
        match *event {
            InputEvent::Key { code, .. } => {
                if self.keys.contains(&code) && event.modifiers_match(self.modifiers, exact) {
                    1.0
                } else {
                    0.0
                }
            }
            InputEvent::MouseButton(button) => {
                if self.mouse_buttons.contains(&button) {
                    1.0
                } else {
                    0.0
                }
            }
            InputEvent::JoypadButton { device, button } => self
                .matching_joypads(device)
                .map(|pad| pad.button_strength(button))
                .fold(0.0, f32::max),
            InputEvent::JoypadMotion {
                device,
                axis,
                direction,
            } => self
                .matching_joypads(device)
                .map(|pad| direction.project(pad.axis_value(axis)))
                .fold(0.0, f32::max),
        }
    }

    fn take_connection_changes(&mut self) -> Vec<ConnectionChange> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::input::event::AxisDirection;

    #[test]
    fn test_keyboard_strength() {
        let mut backend = VirtualBackend::new();
        let space = InputEvent::key(KeyCode::Space);
        assert_eq!(backend.event_strength(&space, false), 0.0);

        backend.press_key(KeyCode::Space);
        assert_eq!(backend.event_strength(&space, false), 1.0);

        backend.release_key(KeyCode::Space);
        assert_eq!(backend.event_strength(&space, false), 0.0);
    }

    #[test]
    fn test_exact_modifiers() {
        let mut backend = VirtualBackend::new();
        let save = InputEvent::key_with(KeyCode::KeyS, ModifiersState::CONTROL);
        backend.press_key(KeyCode::KeyS);
        backend.set_modifiers(ModifiersState::CONTROL | ModifiersState::SHIFT);

        assert_eq!(backend.event_strength(&save, false), 1.0);
        assert_eq!(backend.event_strength(&save, true), 0.0);
    }

    #[test]
    fn test_mouse_strength() {
        let mut backend = VirtualBackend::new();
        backend.process_mouse_button(ElementState::Pressed, MouseButton::Left);
        assert_eq!(backend.event_strength(&InputEvent::mouse(MouseButton::Left), false), 1.0);
        assert_eq!(backend.event_strength(&InputEvent::mouse(MouseButton::Right), false), 0.0);
    }

    #[test]
    fn test_joypad_button_respects_filter() {
        let mut backend = VirtualBackend::new();
        let pad0 = backend.connect_joypad(0, "guid-a", "Pad A");
        let pad1 = backend.connect_joypad(1, "guid-b", "Pad B");
        backend.press_button(pad1, 0);

        let any = InputEvent::joypad_button(0);
        assert_eq!(backend.event_strength(&any, false), 1.0);
        let only0 = any.with_device(DeviceFilter::Only(pad0));
        assert_eq!(backend.event_strength(&only0, false), 0.0);
        let only1 = any.with_device(DeviceFilter::Only(pad1));
        assert_eq!(backend.event_strength(&only1, false), 1.0);
        let disabled = any.with_device(DeviceFilter::Disabled);
        assert_eq!(backend.event_strength(&disabled, false), 0.0);
    }

    #[test]
    fn test_joypad_axis_strength() {
        let mut backend = VirtualBackend::new();
        let pad = backend.connect_joypad(0, "guid-a", "Pad A");
        backend.set_axis(pad, 0, -0.75);

        let left = InputEvent::joypad_motion(0, AxisDirection::Negative);
        let right = InputEvent::joypad_motion(0, AxisDirection::Positive);
        assert_eq!(backend.event_strength(&left, false), 0.75);
        assert_eq!(backend.event_strength(&right, false), 0.0);
    }

    #[test]
    fn test_connection_changes_are_queued_in_order() {
        let mut backend = VirtualBackend::new();
        let pad = backend.connect_joypad(2, "guid", "Pad");
        backend.connect_joypad(2, "guid", "Pad");
        backend.disconnect_joypad(pad);
        backend.disconnect_joypad(pad);

        assert_eq!(
            backend.take_connection_changes(),
            vec![
                ConnectionChange::connected(pad),
                ConnectionChange::disconnected(pad)
            ]
        );
        assert!(backend.take_connection_changes().is_empty());
    }

    #[test]
    fn test_joypad_identity() {
        let mut backend = VirtualBackend::new();
        let pad = backend.connect_joypad(3, "guid-x", "Pad X");
        assert_eq!(backend.connected_joypads(), vec![pad]);
        assert_eq!(backend.joypad_guid(pad), "guid-x");
        assert_eq!(backend.joypad_name(pad), "Pad X");
        assert!(backend.is_joypad_known(pad));

        backend.set_known(pad, false);
        assert!(!backend.is_joypad_known(pad));
        assert_eq!(backend.joypad_name(DeviceId::joypad(7)), "");
    }

    #[test]
    fn test_vibration() {
        let mut backend = VirtualBackend::new();
        let pad = backend.connect_joypad(0, "guid", "Pad");
        backend.start_vibration(pad, 0.25, 0.5, 1.5);

        assert_eq!(backend.vibration_strength(pad), Vec2::new(0.25, 0.5));
        assert_eq!(backend.vibration_duration(pad), 1.5);

        backend.stop_vibration(pad);
        assert_eq!(backend.vibration(pad), None);
        assert_eq!(backend.vibration_strength(pad), Vec2::ZERO);
    }

    #[test]
    fn test_disconnect_drops_state() {
        let mut backend = VirtualBackend::new();
        let pad = backend.connect_joypad(0, "guid", "Pad");
        backend.press_button(pad, 0);
        backend.disconnect_joypad(pad);
        backend.connect_joypad(0, "guid", "Pad");

        assert_eq!(backend.event_strength(&InputEvent::joypad_button(0), false), 0.0);
        assert!(backend.is_connected(DeviceId::KEYBOARD_MOUSE));
    }
}
