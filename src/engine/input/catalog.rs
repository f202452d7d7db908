// Action catalog: logical action definitions and their bindings

use super::event::{AxisDirection, DeviceFilter, DeviceId, InputEvent};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use winit::event::MouseButton;
use winit::keyboard::{KeyCode, ModifiersState};

/// Deadzone used when an action does not specify one
pub const DEFAULT_DEADZONE: f32 = 0.5;

/// Actions whose name starts with this prefix are UI actions
pub const UI_ACTION_PREFIX: &str = "ui_";

/// Default number of player slots
pub const DEFAULT_MAX_PLAYERS: usize = 8;

/// Catalog loading and editing errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse input config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid action name: {0:?} (names must be non-empty and must not start with a digit)")]
    InvalidActionName(String),

    #[error("Invalid deadzone {deadzone} for action {action}")]
    InvalidDeadzone { action: String, deadzone: f32 },

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Action already defined: {0}")]
    DuplicateAction(String),
}

/// Check whether an action name belongs to the shared UI actions
pub fn is_ui_action(name: &str) -> bool {
    name.starts_with(UI_ACTION_PREFIX)
}

fn validate_name(name: &str) -> Result<(), CatalogError> {
    match name.chars().next() {
        Some(first) if !first.is_ascii_digit() => Ok(()),
        _ => Err(CatalogError::InvalidActionName(name.to_string())),
    }
}

fn validate_deadzone(action: &str, deadzone: f32) -> Result<(), CatalogError> {
    if deadzone.is_finite() && (0.0..=1.0).contains(&deadzone) {
        Ok(())
    } else {
        Err(CatalogError::InvalidDeadzone {
            action: action.to_string(),
            deadzone,
        })
    }
}

/// A named action's deadzone and bound events
#[derive(Debug, Clone, PartialEq)]
pub struct ActionDefinition {
    deadzone: f32,
    events: Vec<InputEvent>,
}

impl ActionDefinition {
    /// Create an action with no events bound
    pub fn new(deadzone: f32) -> Self {
        Self {
            deadzone,
            events: Vec::new(),
        }
    }

    /// Create an action from a list of events
    pub fn with_events(deadzone: f32, events: Vec<InputEvent>) -> Self {
        let mut definition = Self::new(deadzone);
        for event in events {
            definition.add_event(event);
        }
        definition
    }

    pub fn deadzone(&self) -> f32 {
        self.deadzone
    }

    pub fn events(&self) -> &[InputEvent] {
        &self.events
    }

    /// Add an event. Returns false if it was already bound.
    pub fn add_event(&mut self, event: InputEvent) -> bool {
        if self.events.contains(&event) {
            return false;
        }
        self.events.push(event);
        true
    }

    /// Remove an event. Returns true if it was bound.
    pub fn remove_event(&mut self, event: &InputEvent) -> bool {
        let before = self.events.len();
        self.events.retain(|e| e != event);
        self.events.len() != before
    }

    /// Keep only the events matching the predicate
    pub fn retain_events<F: FnMut(&InputEvent) -> bool>(&mut self, keep: F) {
        self.events.retain(keep);
    }

    /// Replace every joypad event's device filter
    pub fn set_joypad_filter(&mut self, filter: DeviceFilter) {
        for event in &mut self.events {
            *event = event.with_device(filter);
        }
    }

    /// Copies of the joypad events bound to this action
    pub fn joypad_events(&self) -> Vec<InputEvent> {
        self.events.iter().filter(|e| e.is_joypad()).copied().collect()
    }

    /// Whether any joypad event is bound
    pub fn has_joypad_events(&self) -> bool {
        self.events.iter().any(InputEvent::is_joypad)
    }
}

/// Process-wide table of logical actions
///
/// Read once at startup and kept by the registry, which rebuilds its
/// device namespaces from it whenever it needs a clean slate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionCatalog {
    actions: BTreeMap<String, ActionDefinition>,

    /// Hardware GUIDs of devices that never get device-qualified actions
    ignored_guids: Vec<String>,
}

impl ActionCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a catalog from TOML text, ignoring the player settings
    pub fn from_toml_str(text: &str) -> Result<Self, CatalogError> {
        Ok(InputConfig::from_toml_str(text)?.catalog)
    }

    /// Define a new action
    pub fn add_action(&mut self, name: &str, deadzone: f32) -> Result<(), CatalogError> {
        validate_name(name)?;
        validate_deadzone(name, deadzone)?;
        if self.actions.contains_key(name) {
            return Err(CatalogError::DuplicateAction(name.to_string()));
        }
        self.actions
            .insert(name.to_string(), ActionDefinition::new(deadzone));
        Ok(())
    }

    /// Define a new action together with its events
    pub fn add_action_with_events(
        &mut self,
        name: &str,
        deadzone: f32,
        events: Vec<InputEvent>,
    ) -> Result<(), CatalogError> {
        self.add_action(name, deadzone)?;
        for event in events {
            self.bind(name, event)?;
        }
        Ok(())
    }

    /// Remove an action and all its bindings
    pub fn erase_action(&mut self, name: &str) -> Option<ActionDefinition> {
        self.actions.remove(name)
    }

    /// Bind an event to an action
    pub fn bind(&mut self, action: &str, event: InputEvent) -> Result<(), CatalogError> {
        self.get_mut(action)?.add_event(event);
        Ok(())
    }

    /// Unbind one event from an action. Returns true if it was bound.
    pub fn unbind_event(&mut self, action: &str, event: &InputEvent) -> Result<bool, CatalogError> {
        Ok(self.get_mut(action)?.remove_event(event))
    }

    /// Unbind every event from an action, keeping the action itself
    pub fn unbind_all(&mut self, action: &str) -> Result<(), CatalogError> {
        self.get_mut(action)?.retain_events(|_| false);
        Ok(())
    }

    /// Change an action's deadzone
    pub fn set_deadzone(&mut self, action: &str, deadzone: f32) -> Result<(), CatalogError> {
        validate_deadzone(action, deadzone)?;
        self.get_mut(action)?.deadzone = deadzone;
        Ok(())
    }

    /// Get all events bound to an action (empty for unknown actions)
    pub fn events(&self, action: &str) -> &[InputEvent] {
        self.actions
            .get(action)
            .map(ActionDefinition::events)
            .unwrap_or_default()
    }

    /// Check if an action has any bindings
    pub fn has_binding(&self, action: &str) -> bool {
        !self.events(action).is_empty()
    }

    pub fn get(&self, action: &str) -> Option<&ActionDefinition> {
        self.actions.get(action)
    }

    pub fn contains(&self, action: &str) -> bool {
        self.actions.contains_key(action)
    }

    /// Iterate over all actions in name order
    pub fn actions(&self) -> impl Iterator<Item = (&str, &ActionDefinition)> {
        self.actions.iter().map(|(name, def)| (name.as_str(), def))
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Never create device-qualified actions for devices with this GUID
    pub fn ignore_guid(&mut self, guid: impl Into<String>) {
        let guid = guid.into();
        if !self.ignored_guids.contains(&guid) {
            self.ignored_guids.push(guid);
        }
    }

    pub fn ignored_guids(&self) -> &[String] {
        &self.ignored_guids
    }

    pub fn is_ignored_guid(&self, guid: &str) -> bool {
        self.ignored_guids.iter().any(|g| g == guid)
    }

    fn get_mut(&mut self, action: &str) -> Result<&mut ActionDefinition, CatalogError> {
        self.actions
            .get_mut(action)
            .ok_or_else(|| CatalogError::UnknownAction(action.to_string()))
    }
}

/// Everything read from the input config file
#[derive(Debug, Clone, PartialEq)]
pub struct InputConfig {
    /// Number of player slots
    pub max_players: usize,

    /// Logical actions and ignored devices
    pub catalog: ActionCatalog,
}

impl InputConfig {
    /// Load the input config from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Load the config file if it exists, otherwise fall back to the built-in defaults
    pub fn load_or_builtin<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            log::warn!(
                "Input config {} not found, using built-in actions",
                path.as_ref().display()
            );
            Self::builtin()
        }
    }

    /// The actions shipped with the crate
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_toml_str(include_str!("../../../config/input.toml"))
    }

    /// Parse the input config from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, CatalogError> {
        let file: ConfigFile = toml::from_str(text)?;

        let mut catalog = ActionCatalog::new();
        for guid in file.ignored_guids {
            catalog.ignore_guid(guid);
        }
        for (name, action) in file.actions {
            let events = action.events.into_iter().map(InputEvent::from).collect();
            catalog.add_action_with_events(&name, action.deadzone, events)?;
        }

        if file.max_players == 0 {
            log::warn!("max_players is 0, no player will be able to join");
        }

        Ok(Self {
            max_players: file.max_players,
            catalog,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default = "default_max_players")]
    max_players: usize,
    #[serde(default)]
    ignored_guids: Vec<String>,
    #[serde(default)]
    actions: BTreeMap<String, ActionFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ActionFile {
    #[serde(default = "default_deadzone")]
    deadzone: f32,
    #[serde(default)]
    events: Vec<EventFile>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum EventFile {
    Key {
        code: KeyCode,
        #[serde(default)]
        shift: bool,
        #[serde(default)]
        ctrl: bool,
        #[serde(default)]
        alt: bool,
        #[serde(default, rename = "super")]
        super_key: bool,
    },
    MouseButton {
        button: MouseButton,
    },
    JoypadButton {
        button: u8,
        #[serde(default)]
        device: Option<DeviceId>,
    },
    JoypadMotion {
        axis: u8,
        direction: AxisDirection,
        #[serde(default)]
        device: Option<DeviceId>,
    },
}

fn default_max_players() -> usize {
    DEFAULT_MAX_PLAYERS
}

fn default_deadzone() -> f32 {
    DEFAULT_DEADZONE
}

fn filter_for(device: Option<DeviceId>) -> DeviceFilter {
    match device {
        Some(id) if id.is_joypad() => DeviceFilter::Only(id),
        _ => DeviceFilter::All,
    }
}

impl From<EventFile> for InputEvent {
    fn from(event: EventFile) -> Self {
        match event {
            EventFile::Key {
                code,
                shift,
                ctrl,
                alt,
                super_key,
            } => {
                let mut modifiers = ModifiersState::empty();
                modifiers.set(ModifiersState::SHIFT, shift);
                modifiers.set(ModifiersState::CONTROL, ctrl);
                modifiers.set(ModifiersState::ALT, alt);
                modifiers.set(ModifiersState::SUPER, super_key);
                InputEvent::key_with(code, modifiers)
            }
            EventFile::MouseButton { button } => InputEvent::mouse(button),
            EventFile::JoypadButton { button, device } => InputEvent::JoypadButton {
                device: filter_for(device),
                button,
            },
            EventFile::JoypadMotion {
                axis,
                direction,
                device,
            } => InputEvent::JoypadMotion {
                device: filter_for(device),
                axis,
                direction,
            },
        }
    }
}
