// Action registry: per-device action namespaces over one logical catalog
//
// Every connected joypad gets its own clone of each logical action that has
// joypad events bound, with those events pinned to that joypad. Queries name
// the logical action plus a device, and the registry resolves the clone.
// The logical actions keep their keyboard/mouse events; their joypad events
// are disabled so a joypad only ever drives its own clones. UI actions are
// the exception and stay shared unless one device claims them.

use super::action_map::{ActionKey, ActionMap};
use super::catalog::{ActionCatalog, ActionDefinition};
use super::event::{DeviceFilter, DeviceId, InputEvent};
use super::session::ConnectionWatchers;
use super::source::DeviceSource;
use crate::core::math::{axis, circular_deadzone};
use glam::Vec2;
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Why a device-qualified action could not be found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// The joypad is not connected
    NotConnected,
    /// The joypad is connected but the action has no joypad events
    NoJoypadActions,
    /// The joypad's GUID is on the ignore list
    Ignored,
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UnresolvedReason::NotConnected => "device not connected",
            UnresolvedReason::NoJoypadActions => "action has no joypad events",
            UnresolvedReason::Ignored => "device is ignored",
        };
        f.write_str(text)
    }
}

/// Registry query errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Cannot resolve action {action} for device {device}: {reason}")]
    Unresolved {
        device: DeviceId,
        action: String,
        reason: UnresolvedReason,
    },
}

/// Which devices may drive the logical UI actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiRouting {
    /// Every device (the catalog bindings as written)
    #[default]
    Shared,
    /// A single device
    Exclusive(DeviceId),
}

/// Logical action name -> device-qualified key, for one joypad
pub type DeviceActions = BTreeMap<String, ActionKey>;

/// Owns the active actions and the per-device namespaces
pub struct ActionRegistry<S: DeviceSource> {
    source: S,
    catalog: ActionCatalog,
    map: ActionMap,
    namespaces: HashMap<DeviceId, DeviceActions>,

    /// Connected joypads skipped because of their GUID
    ignored: HashSet<DeviceId>,
    routing: UiRouting,
    watchers: ConnectionWatchers,
}

impl<S: DeviceSource> ActionRegistry<S> {
    /// Build the registry from the catalog and clone actions for the joypads already connected
    pub fn initialize(catalog: ActionCatalog, source: S) -> Self {
        let mut registry = Self {
            source,
            catalog,
            map: ActionMap::new(),
            namespaces: HashMap::new(),
            ignored: HashSet::new(),
            routing: UiRouting::Shared,
            watchers: ConnectionWatchers::new(),
        };
        registry.rebuild();
        info!(
            "Action registry initialized: {} actions, {} joypads",
            registry.catalog.len(),
            registry.namespaces.len()
        );
        registry
    }

    /// Tear down every namespace and hand the device source back
    pub fn shutdown(mut self) -> S {
        self.namespaces.clear();
        self.ignored.clear();
        self.watchers.clear();
        info!("Action registry shut down");
        self.source
    }

    /// Per-frame tick: dispatch pending connection changes, then sample every action
    pub fn update(&mut self) {
        for change in self.source.take_connection_changes() {
            self.handle_connection_changed(change.device, change.connected);
        }
        self.map.poll(&self.source);
    }

    /// Entry point for the platform's connect/disconnect broadcast.
    ///
    /// The namespace is updated before any session watching `device` hears about it.
    pub fn handle_connection_changed(&mut self, device: DeviceId, connected: bool) {
        if connected {
            info!("Device {} connected", device);
            self.on_device_connected(device);
        } else {
            info!("Device {} disconnected", device);
            self.on_device_disconnected(device);
        }
        self.watchers.broadcast(device, connected);
    }

    /// Restrict the logical UI actions to one device, or share them again.
    ///
    /// Always starts from the catalog, so earlier exclusivity edits are discarded.
    /// Device-qualified names resolved before this call may be stale afterwards.
    pub fn set_exclusive_ui_device(&mut self, routing: UiRouting) {
        self.rebuild();
        self.routing = routing;

        let UiRouting::Exclusive(target) = routing else {
            info!("UI actions shared by all devices");
            return;
        };

        let ui_keys: Vec<ActionKey> = self.map.keys().filter(|k| k.is_ui()).cloned().collect();
        for key in ui_keys {
            if let Some(definition) = self.map.get_mut(&key) {
                if target.is_keyboard() {
                    definition.retain_events(|e| !e.is_joypad());
                } else {
                    definition.retain_events(InputEvent::is_joypad);
                    definition.set_joypad_filter(DeviceFilter::Only(target));
                }
            }
        }
        info!("UI actions now exclusive to device {}", target);
    }

    /// Swap the catalog (after remapping) and rebuild, keeping the UI routing
    pub fn replace_catalog(&mut self, catalog: ActionCatalog) {
        self.catalog = catalog;
        self.set_exclusive_ui_device(self.routing);
    }

    /// Resolve a logical action to the key that answers for `device`
    pub fn resolve(&self, device: DeviceId, action: &str) -> Result<ActionKey, RegistryError> {
        let logical = ActionKey::logical(action);
        if !self.map.contains(&logical) {
            return Err(RegistryError::UnknownAction(action.to_string()));
        }
        if device.is_keyboard() {
            return Ok(logical);
        }

        let unresolved = |reason| RegistryError::Unresolved {
            device,
            action: action.to_string(),
            reason,
        };
        match self.namespaces.get(&device) {
            Some(actions) => actions
                .get(action)
                .cloned()
                .ok_or_else(|| unresolved(UnresolvedReason::NoJoypadActions)),
            None if self.ignored.contains(&device) => Err(unresolved(UnresolvedReason::Ignored)),
            None => Err(unresolved(UnresolvedReason::NotConnected)),
        }
    }

    /// Strongest raw event strength of an action, ignoring the deadzone
    pub fn raw_strength(
        &self,
        device: DeviceId,
        action: &str,
        exact: bool,
    ) -> Result<f32, RegistryError> {
        let key = self.resolve(device, action)?;
        Ok(self.map.state(&key).raw_strength(exact))
    }

    /// Action strength rescaled past the deadzone (0.0 to 1.0)
    pub fn strength(
        &self,
        device: DeviceId,
        action: &str,
        exact: bool,
    ) -> Result<f32, RegistryError> {
        let key = self.resolve(device, action)?;
        Ok(self.map.state(&key).strength(exact))
    }

    /// `strength(positive) - strength(negative)`
    pub fn axis(
        &self,
        device: DeviceId,
        negative: &str,
        positive: &str,
    ) -> Result<f32, RegistryError> {
        Ok(axis(
            self.strength(device, negative, false)?,
            self.strength(device, positive, false)?,
        ))
    }

    /// Combine four actions into a vector with a circular deadzone.
    ///
    /// Without an explicit deadzone the mean of the four actions' deadzones is used.
    pub fn vector(
        &self,
        device: DeviceId,
        negative_x: &str,
        positive_x: &str,
        negative_y: &str,
        positive_y: &str,
        deadzone: Option<f32>,
    ) -> Result<Vec2, RegistryError> {
        let keys = [
            self.resolve(device, negative_x)?,
            self.resolve(device, positive_x)?,
            self.resolve(device, negative_y)?,
            self.resolve(device, positive_y)?,
        ];
        let raw = |key: &ActionKey| self.map.state(key).raw_strength(false);
        let vector = Vec2::new(raw(&keys[1]) - raw(&keys[0]), raw(&keys[3]) - raw(&keys[2]));

        let deadzone = deadzone.unwrap_or_else(|| {
            let total: f32 = keys
                .iter()
                .filter_map(|key| self.map.get(key))
                .map(ActionDefinition::deadzone)
                .sum();
            total / keys.len() as f32
        });
        Ok(circular_deadzone(vector, deadzone))
    }

    /// Check if an action went down on the last tick
    pub fn just_pressed(
        &self,
        device: DeviceId,
        action: &str,
        exact: bool,
    ) -> Result<bool, RegistryError> {
        let key = self.resolve(device, action)?;
        Ok(self.map.state(&key).just_pressed(exact))
    }

    /// Check if an action went up on the last tick
    pub fn just_released(
        &self,
        device: DeviceId,
        action: &str,
        exact: bool,
    ) -> Result<bool, RegistryError> {
        let key = self.resolve(device, action)?;
        Ok(self.map.state(&key).just_released(exact))
    }

    /// Check if an action is held
    pub fn held(&self, device: DeviceId, action: &str, exact: bool) -> Result<bool, RegistryError> {
        let key = self.resolve(device, action)?;
        Ok(self.map.state(&key).is_pressed(exact))
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    /// Actions currently in effect, including device-qualified clones
    pub fn action_map(&self) -> &ActionMap {
        &self.map
    }

    /// Namespace of a connected, non-ignored joypad
    pub fn device_actions(&self, device: DeviceId) -> Option<&DeviceActions> {
        self.namespaces.get(&device)
    }

    /// Whether a connected joypad was skipped because of its GUID
    pub fn is_ignored(&self, device: DeviceId) -> bool {
        self.ignored.contains(&device)
    }

    pub fn ui_routing(&self) -> UiRouting {
        self.routing
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub(crate) fn watchers_mut(&mut self) -> &mut ConnectionWatchers {
        &mut self.watchers
    }

    /// Reload from the catalog and recreate the namespaces of every connected joypad
    fn rebuild(&mut self) {
        let mut map = ActionMap::from_catalog(&self.catalog);

        // Joypad events on logical actions must not fire before a clone exists
        let keys: Vec<ActionKey> = map.keys().filter(|k| !k.is_ui()).cloned().collect();
        for key in keys {
            if let Some(definition) = map.get_mut(&key) {
                definition.set_joypad_filter(DeviceFilter::Disabled);
            }
        }

        self.namespaces.clear();
        self.ignored.clear();
        for device in self.source.connected_joypads() {
            if self.is_ignored_guid(device) {
                self.ignored.insert(device);
            } else {
                let actions = clone_device_actions(&mut map, &self.catalog, device);
                self.namespaces.insert(device, actions);
            }
        }

        self.map.replace_definitions(map);
        self.routing = UiRouting::Shared;
    }

    fn is_ignored_guid(&self, device: DeviceId) -> bool {
        self.catalog.is_ignored_guid(&self.source.joypad_guid(device))
    }

    fn on_device_connected(&mut self, device: DeviceId) {
        if device.is_keyboard() {
            return;
        }
        if self.is_ignored_guid(device) {
            warn!(
                "Ignoring device {} ({})",
                device,
                self.source.joypad_guid(device)
            );
            self.ignored.insert(device);
            return;
        }
        if self.namespaces.contains_key(&device) {
            debug!("Device {} already has actions", device);
            return;
        }

        let actions = clone_device_actions(&mut self.map, &self.catalog, device);
        self.namespaces.insert(device, actions);
    }

    fn on_device_disconnected(&mut self, device: DeviceId) {
        self.namespaces.remove(&device);
        self.ignored.remove(&device);

        // Sweep the whole table as well: anything still keyed to this device goes
        let stale: Vec<ActionKey> = self
            .map
            .keys()
            .filter(|key| key.device_id() == Some(device))
            .cloned()
            .collect();
        for key in stale {
            debug!("Erasing action {}", key);
            self.map.erase_action(&key);
        }
    }
}

/// Clone every catalog action with joypad events for one joypad.
///
/// Reads the catalog rather than the active logical actions, which UI
/// exclusivity may have stripped.
fn clone_device_actions(
    map: &mut ActionMap,
    catalog: &ActionCatalog,
    device: DeviceId,
) -> DeviceActions {
    let mut actions = DeviceActions::new();
    for (name, definition) in catalog.actions() {
        let events: Vec<InputEvent> = definition
            .joypad_events()
            .into_iter()
            .map(|event| event.with_device(DeviceFilter::Only(device)))
            .collect();
        if events.is_empty() {
            continue;
        }

        let key = ActionKey::device(device, name);
        debug!("Creating action {}", key);
        map.add_action(
            key.clone(),
            ActionDefinition::with_events(definition.deadzone(), events),
        );
        actions.insert(name.to_string(), key);
    }
    actions
}
