// Typed values stored per player

use crate::engine::input::DeviceId;
use std::collections::HashMap;

/// A value in a player's session data
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Device(DeviceId),
}

impl PlayerValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PlayerValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PlayerValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Floats, or ints widened to float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            PlayerValue::Float(v) => Some(*v),
            PlayerValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PlayerValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_device(&self) -> Option<DeviceId> {
        match self {
            PlayerValue::Device(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<bool> for PlayerValue {
    fn from(v: bool) -> Self {
        PlayerValue::Bool(v)
    }
}

impl From<i64> for PlayerValue {
    fn from(v: i64) -> Self {
        PlayerValue::Int(v)
    }
}

impl From<i32> for PlayerValue {
    fn from(v: i32) -> Self {
        PlayerValue::Int(v.into())
    }
}

impl From<f64> for PlayerValue {
    fn from(v: f64) -> Self {
        PlayerValue::Float(v)
    }
}

impl From<f32> for PlayerValue {
    fn from(v: f32) -> Self {
        PlayerValue::Float(v.into())
    }
}

impl From<&str> for PlayerValue {
    fn from(v: &str) -> Self {
        PlayerValue::Text(v.to_string())
    }
}

impl From<String> for PlayerValue {
    fn from(v: String) -> Self {
        PlayerValue::Text(v)
    }
}

impl From<DeviceId> for PlayerValue {
    fn from(v: DeviceId) -> Self {
        PlayerValue::Device(v)
    }
}

/// Key under which every player's device is stored
pub const DEVICE_KEY: &str = "device";

/// Open-ended keyed values owned by one joined player
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerData {
    values: HashMap<String, PlayerValue>,
}

impl PlayerData {
    /// Create the data bag of a player who joined with `device`
    pub fn for_device(device: DeviceId) -> Self {
        let mut data = Self::default();
        data.set(DEVICE_KEY, device);
        data
    }

    /// Get a value (`None` for unknown keys)
    pub fn get(&self, key: &str) -> Option<&PlayerValue> {
        self.values.get(key)
    }

    /// Set a value, returning the one it replaced
    pub fn set(&mut self, key: &str, value: impl Into<PlayerValue>) -> Option<PlayerValue> {
        self.values.insert(key.to_string(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<PlayerValue> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
