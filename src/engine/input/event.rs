// Physical input events and device identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use winit::event::MouseButton;
use winit::keyboard::{KeyCode, ModifiersState};

/// Identifies one input device
///
/// Joypads use their platform index (0 and up). The keyboard and mouse are
/// grouped into a single virtual device with id -1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(i32);

impl DeviceId {
    /// The keyboard/mouse virtual device
    pub const KEYBOARD_MOUSE: DeviceId = DeviceId(-1);

    /// Create a device id. Anything below -1 is folded into the keyboard/mouse device.
    pub const fn new(id: i32) -> Self {
        if id < -1 {
            Self::KEYBOARD_MOUSE
        } else {
            Self(id)
        }
    }

    /// Create the id of a joypad from its platform index
    pub const fn joypad(index: u16) -> Self {
        Self(index as i32)
    }

    /// Get the raw id
    pub fn raw(self) -> i32 {
        self.0
    }

    /// Whether this is the keyboard/mouse virtual device
    pub fn is_keyboard(self) -> bool {
        self.0 < 0
    }

    /// Whether this is a joypad
    pub fn is_joypad(self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for DeviceId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

/// Which joypads a joypad event listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceFilter {
    /// Every connected joypad
    #[default]
    All,
    /// A single joypad
    Only(DeviceId),
    /// No joypad at all; the event never fires
    Disabled,
}

impl DeviceFilter {
    /// Check whether an event with this filter fires for `device`
    pub fn matches(self, device: DeviceId) -> bool {
        match self {
            DeviceFilter::All => device.is_joypad(),
            DeviceFilter::Only(only) => only == device,
            DeviceFilter::Disabled => false,
        }
    }
}

/// Half of a joypad axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisDirection {
    Negative,
    Positive,
}

impl AxisDirection {
    /// Project a raw axis value (-1.0 to 1.0) onto this half, giving 0.0 to 1.0
    pub fn project(self, value: f32) -> f32 {
        let projected = match self {
            AxisDirection::Negative => -value,
            AxisDirection::Positive => value,
        };
        projected.clamp(0.0, 1.0)
    }
}

/// A physical event that can be bound to an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputEvent {
    /// Keyboard key, optionally requiring modifier keys
    Key {
        code: KeyCode,
        modifiers: ModifiersState,
    },
    /// Mouse button
    MouseButton(MouseButton),
    /// Joypad button
    JoypadButton { device: DeviceFilter, button: u8 },
    /// One direction of a joypad axis
    JoypadMotion {
        device: DeviceFilter,
        axis: u8,
        direction: AxisDirection,
    },
}

impl InputEvent {
    /// Create a keyboard event without modifiers
    pub fn key(code: KeyCode) -> Self {
        Self::Key {
            code,
            modifiers: ModifiersState::empty(),
        }
    }

    /// Create a keyboard event that requires modifiers
    pub fn key_with(code: KeyCode, modifiers: ModifiersState) -> Self {
        Self::Key { code, modifiers }
    }

    /// Create a mouse button event
    pub fn mouse(button: MouseButton) -> Self {
        Self::MouseButton(button)
    }

    /// Create a joypad button event listening to every joypad
    pub fn joypad_button(button: u8) -> Self {
        Self::JoypadButton {
            device: DeviceFilter::All,
            button,
        }
    }

    /// Create a joypad motion event listening to every joypad
    pub fn joypad_motion(axis: u8, direction: AxisDirection) -> Self {
        Self::JoypadMotion {
            device: DeviceFilter::All,
            axis,
            direction,
        }
    }

    /// Whether this event comes from a joypad (as opposed to keyboard/mouse)
    pub fn is_joypad(&self) -> bool {
        matches!(
            self,
            InputEvent::JoypadButton { .. } | InputEvent::JoypadMotion { .. }
        )
    }

    /// Device filter of a joypad event; `None` for keyboard/mouse events
    pub fn device_filter(&self) -> Option<DeviceFilter> {
        match self {
            InputEvent::JoypadButton { device, .. } | InputEvent::JoypadMotion { device, .. } => {
                Some(*device)
            }
            _ => None,
        }
    }

    /// Copy of this event with its device filter replaced.
    /// Keyboard/mouse events are returned unchanged.
    pub fn with_device(self, filter: DeviceFilter) -> Self {
        match self {
            InputEvent::JoypadButton { button, .. } => InputEvent::JoypadButton {
                device: filter,
                button,
            },
            InputEvent::JoypadMotion {
                axis, direction, ..
            } => InputEvent::JoypadMotion {
                device: filter,
                axis,
                direction,
            },
            other => other,
        }
    }

    /// Check the held modifiers against a key event's required modifiers.
    ///
    /// With `exact` the held set must equal the required set, otherwise the
    /// required set only has to be held. Non-key events always match.
    pub fn modifiers_match(&self, held: ModifiersState, exact: bool) -> bool {
        match self {
            InputEvent::Key { modifiers, .. } => {
                if exact {
                    held == *modifiers
                } else {
                    held.contains(*modifiers)
                }
            }
            _ => true,
        }
    }
}
