// Active action table and per-frame action state

use super::catalog::{is_ui_action, ActionCatalog, ActionDefinition};
use super::event::DeviceId;
use super::source::DeviceSource;
use crate::core::math::deadzone_strength;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Key of an active action
///
/// Logical actions come straight from the catalog. Device-qualified actions
/// are per-joypad clones of a logical action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionKey {
    Logical(String),
    Device { device: DeviceId, action: String },
}

impl ActionKey {
    pub fn logical(action: &str) -> Self {
        Self::Logical(action.to_string())
    }

    pub fn device(device: DeviceId, action: &str) -> Self {
        Self::Device {
            device,
            action: action.to_string(),
        }
    }

    /// Name of the logical action this key refers to
    pub fn action_name(&self) -> &str {
        match self {
            ActionKey::Logical(action) | ActionKey::Device { action, .. } => action,
        }
    }

    /// Device of a device-qualified key
    pub fn device_id(&self) -> Option<DeviceId> {
        match self {
            ActionKey::Logical(_) => None,
            ActionKey::Device { device, .. } => Some(*device),
        }
    }

    /// Whether this is a logical UI action
    pub fn is_ui(&self) -> bool {
        matches!(self, ActionKey::Logical(action) if is_ui_action(action))
    }
}

/// Textual form: the logical name, prefixed with the device id for device-qualified keys
impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKey::Logical(action) => write!(f, "{action}"),
            ActionKey::Device { device, action } => write!(f, "{device}{action}"),
        }
    }
}

/// One evaluation of an action's events
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Sample {
    raw_strength: f32,
    strength: f32,
    pressed: bool,
}

impl Sample {
    fn evaluate<S: DeviceSource + ?Sized>(
        definition: &ActionDefinition,
        source: &S,
        exact: bool,
    ) -> Self {
        let deadzone = definition.deadzone();
        let mut sample = Sample::default();

        for event in definition.events() {
            let raw = source.event_strength(event, exact);
            sample.raw_strength = sample.raw_strength.max(raw);
            if raw > 0.0 && raw >= deadzone {
                sample.pressed = true;
                sample.strength = sample.strength.max(deadzone_strength(raw, deadzone));
            }
        }

        sample
    }
}

/// State of an action as of the last poll
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActionState {
    loose: Sample,
    exact: Sample,
    was_pressed: bool,
    was_pressed_exact: bool,
}

impl ActionState {
    fn sample(&self, exact: bool) -> &Sample {
        if exact {
            &self.exact
        } else {
            &self.loose
        }
    }

    fn was_pressed(&self, exact: bool) -> bool {
        if exact {
            self.was_pressed_exact
        } else {
            self.was_pressed
        }
    }

    /// Strongest raw event strength, ignoring the deadzone
    pub fn raw_strength(&self, exact: bool) -> f32 {
        self.sample(exact).raw_strength
    }

    /// Strength rescaled past the deadzone (0.0 to 1.0)
    pub fn strength(&self, exact: bool) -> f32 {
        self.sample(exact).strength
    }

    /// Check if the action is held
    pub fn is_pressed(&self, exact: bool) -> bool {
        self.sample(exact).pressed
    }

    /// Check if the action went down on the last poll
    pub fn just_pressed(&self, exact: bool) -> bool {
        self.sample(exact).pressed && !self.was_pressed(exact)
    }

    /// Check if the action went up on the last poll
    pub fn just_released(&self, exact: bool) -> bool {
        !self.sample(exact).pressed && self.was_pressed(exact)
    }

    fn advance(&mut self, loose: Sample, exact: Sample) {
        self.was_pressed = self.loose.pressed;
        self.was_pressed_exact = self.exact.pressed;
        self.loose = loose;
        self.exact = exact;
    }
}

/// Actions currently in effect: catalog actions plus their per-device clones
#[derive(Debug, Clone, Default)]
pub struct ActionMap {
    definitions: BTreeMap<ActionKey, ActionDefinition>,
    states: HashMap<ActionKey, ActionState>,
}

impl ActionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map holding only the catalog's logical actions
    pub fn from_catalog(catalog: &ActionCatalog) -> Self {
        let definitions = catalog
            .actions()
            .map(|(name, def)| (ActionKey::logical(name), def.clone()))
            .collect();
        Self {
            definitions,
            states: HashMap::new(),
        }
    }

    /// Add or replace an action
    pub fn add_action(&mut self, key: ActionKey, definition: ActionDefinition) {
        self.definitions.insert(key, definition);
    }

    /// Remove an action and its state
    pub fn erase_action(&mut self, key: &ActionKey) -> Option<ActionDefinition> {
        self.states.remove(key);
        self.definitions.remove(key)
    }

    pub fn get(&self, key: &ActionKey) -> Option<&ActionDefinition> {
        self.definitions.get(key)
    }

    pub fn get_mut(&mut self, key: &ActionKey) -> Option<&mut ActionDefinition> {
        self.definitions.get_mut(key)
    }

    pub fn contains(&self, key: &ActionKey) -> bool {
        self.definitions.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &ActionKey> {
        self.definitions.keys()
    }

    /// All active definitions, ordered by key
    pub fn definitions(&self) -> &BTreeMap<ActionKey, ActionDefinition> {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// State of an action as of the last poll (released for unknown actions)
    pub fn state(&self, key: &ActionKey) -> ActionState {
        self.states.get(key).copied().unwrap_or_default()
    }

    /// Swap in new definitions, keeping the state of actions that survive
    pub fn replace_definitions(&mut self, other: ActionMap) {
        self.definitions = other.definitions;
        let definitions = &self.definitions;
        self.states.retain(|key, _| definitions.contains_key(key));
    }

    /// Sample every action from the device source. Call once per frame.
    pub fn poll<S: DeviceSource + ?Sized>(&mut self, source: &S) {
        for (key, definition) in &self.definitions {
            let loose = Sample::evaluate(definition, source, false);
            let exact = Sample::evaluate(definition, source, true);
            self.states
                .entry(key.clone())
                .or_default()
                .advance(loose, exact);
        }
    }
}
