// Math helpers for analog input processing

use glam::Vec2;

/// Clamp a value between min and max
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Inverse of linear interpolation: where `value` sits between `a` and `b`
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if (b - a).abs() < f32::EPSILON {
        return if value >= b { 1.0 } else { 0.0 };
    }
    (value - a) / (b - a)
}

/// Rescale a raw magnitude so that the deadzone maps to 0.0 and full deflection to 1.0
pub fn deadzone_strength(raw: f32, deadzone: f32) -> f32 {
    clamp(inverse_lerp(deadzone, 1.0, raw.abs()), 0.0, 1.0)
}

/// Combine a negative and a positive strength into one axis value (-1.0 to 1.0)
pub fn axis(negative: f32, positive: f32) -> f32 {
    positive - negative
}

/// Combine four directional strengths into a vector with a circular deadzone
///
/// The length left over after the deadzone is rescaled into 0.0..=1.0, so a
/// stick pushed just past the deadzone reports a small vector instead of
/// jumping straight to the deadzone radius.
pub fn circular_deadzone(raw: Vec2, deadzone: f32) -> Vec2 {
    let length = raw.length();
    if length <= deadzone {
        return Vec2::ZERO;
    }
    let scaled = deadzone_strength(length, deadzone);
    raw / length * scaled
}
