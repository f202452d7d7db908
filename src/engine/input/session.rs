// Device sessions: the action vocabulary bound to one device

use super::event::DeviceId;
use super::registry::{ActionRegistry, RegistryError, UiRouting};
use super::source::DeviceSource;
use glam::Vec2;
use std::cell::Cell;
use std::rc::{Rc, Weak};

/// Name reported for the keyboard/mouse device
pub const KEYBOARD_NAME: &str = "Keyboard";

/// Connectivity flags of live sessions, keyed by device
///
/// Sessions hold the strong side of their flag; dropping a session
/// unregisters it on the next watch or broadcast.
#[derive(Debug, Default)]
pub struct ConnectionWatchers {
    watchers: Vec<(DeviceId, Weak<Cell<bool>>)>,
}

impl ConnectionWatchers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a flag for `device`, initially connected
    pub fn watch(&mut self, device: DeviceId) -> Rc<Cell<bool>> {
        self.watchers.retain(|(_, flag)| flag.strong_count() > 0);
        let flag = Rc::new(Cell::new(true));
        self.watchers.push((device, Rc::downgrade(&flag)));
        flag
    }

    /// Update every live flag watching `device`
    pub fn broadcast(&mut self, device: DeviceId, connected: bool) {
        self.watchers.retain(|(_, flag)| flag.strong_count() > 0);
        for (watched, flag) in &self.watchers {
            if *watched != device {
                continue;
            }
            if let Some(flag) = flag.upgrade() {
                flag.set(connected);
            }
        }
    }

    /// Number of registered flags whose session is still alive
    pub fn len(&self) -> usize {
        self.watchers
            .iter()
            .filter(|(_, flag)| flag.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.watchers.clear();
    }
}

/// Handle that queries actions on behalf of one device
///
/// Several sessions may share a device. While the device is disconnected
/// every query returns its zero value.
#[derive(Debug, Clone)]
pub struct DeviceSession {
    device: DeviceId,
    connected: Rc<Cell<bool>>,
}

impl DeviceSession {
    /// Bind a session to a device and start tracking its connectivity
    pub fn bind<S: DeviceSource>(device: DeviceId, registry: &mut ActionRegistry<S>) -> Self {
        let connected = registry.watchers_mut().watch(device);
        Self { device, connected }
    }

    pub fn device(&self) -> DeviceId {
        self.device
    }

    pub fn is_keyboard(&self) -> bool {
        self.device.is_keyboard()
    }

    pub fn is_joypad(&self) -> bool {
        self.device.is_joypad()
    }

    /// Connectivity as of the last broadcast for this device
    pub fn is_connected(&self) -> bool {
        self.connected.get()
    }

    pub fn raw_strength<S: DeviceSource>(
        &self,
        registry: &ActionRegistry<S>,
        action: &str,
        exact: bool,
    ) -> f32 {
        self.query(|| registry.raw_strength(self.device, action, exact))
    }

    pub fn strength<S: DeviceSource>(
        &self,
        registry: &ActionRegistry<S>,
        action: &str,
        exact: bool,
    ) -> f32 {
        self.query(|| registry.strength(self.device, action, exact))
    }

    pub fn axis<S: DeviceSource>(
        &self,
        registry: &ActionRegistry<S>,
        negative: &str,
        positive: &str,
    ) -> f32 {
        self.query(|| registry.axis(self.device, negative, positive))
    }

    pub fn vector<S: DeviceSource>(
        &self,
        registry: &ActionRegistry<S>,
        negative_x: &str,
        positive_x: &str,
        negative_y: &str,
        positive_y: &str,
        deadzone: Option<f32>,
    ) -> Vec2 {
        self.query(|| {
            registry.vector(
                self.device,
                negative_x,
                positive_x,
                negative_y,
                positive_y,
                deadzone,
            )
        })
    }

    pub fn just_pressed<S: DeviceSource>(
        &self,
        registry: &ActionRegistry<S>,
        action: &str,
        exact: bool,
    ) -> bool {
        self.query(|| registry.just_pressed(self.device, action, exact))
    }

    pub fn just_released<S: DeviceSource>(
        &self,
        registry: &ActionRegistry<S>,
        action: &str,
        exact: bool,
    ) -> bool {
        self.query(|| registry.just_released(self.device, action, exact))
    }

    pub fn held<S: DeviceSource>(
        &self,
        registry: &ActionRegistry<S>,
        action: &str,
        exact: bool,
    ) -> bool {
        self.query(|| registry.held(self.device, action, exact))
    }

    /// Restrict the UI actions to this session's device
    pub fn take_exclusive_ui_actions<S: DeviceSource>(&self, registry: &mut ActionRegistry<S>) {
        registry.set_exclusive_ui_device(UiRouting::Exclusive(self.device));
    }

    pub fn name<S: DeviceSource>(&self, registry: &ActionRegistry<S>) -> String {
        if self.is_keyboard() {
            return KEYBOARD_NAME.to_string();
        }
        registry.source().joypad_name(self.device)
    }

    /// Stable identifier of the device's hardware
    pub fn guid<S: DeviceSource>(&self, registry: &ActionRegistry<S>) -> String {
        if self.is_keyboard() {
            return KEYBOARD_NAME.to_string();
        }
        registry.source().joypad_guid(self.device)
    }

    pub fn is_known<S: DeviceSource>(&self, registry: &ActionRegistry<S>) -> bool {
        if self.is_keyboard() {
            return true;
        }
        registry.source().is_joypad_known(self.device)
    }

    pub fn vibration_duration<S: DeviceSource>(&self, registry: &ActionRegistry<S>) -> f32 {
        if self.is_keyboard() {
            return 0.0;
        }
        registry.source().vibration_duration(self.device)
    }

    pub fn vibration_strength<S: DeviceSource>(&self, registry: &ActionRegistry<S>) -> Vec2 {
        if self.is_keyboard() {
            return Vec2::ZERO;
        }
        registry.source().vibration_strength(self.device)
    }

    pub fn start_vibration<S: DeviceSource>(
        &self,
        registry: &mut ActionRegistry<S>,
        weak: f32,
        strong: f32,
        duration: f32,
    ) {
        if self.is_keyboard() {
            return;
        }
        registry
            .source_mut()
            .start_vibration(self.device, weak, strong, duration);
    }

    pub fn stop_vibration<S: DeviceSource>(&self, registry: &mut ActionRegistry<S>) {
        if self.is_keyboard() {
            return;
        }
        registry.source_mut().stop_vibration(self.device);
    }

    fn query<T: Default>(&self, query: impl FnOnce() -> Result<T, RegistryError>) -> T {
        if !self.is_connected() {
            return T::default();
        }
        query().unwrap_or_else(|err| {
            log::debug!("Device {} query failed: {}", self.device, err);
            T::default()
        })
    }
}
