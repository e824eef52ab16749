use crate::foundation::core::Rgba8;
use crate::foundation::math::hsl_to_rgb8;

/// Hue for the slowest particles (blue).
pub const SLOW_HUE: f64 = 240.0;

/// `speed / max_speed` clamped to `[0, 1]`; `0` when `max_speed <= 0`.
pub fn normalized_speed(speed: f64, max_speed: f64) -> f64 {
    if max_speed > 0.0 {
        (speed / max_speed).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Hue in degrees: 240 (blue) at rest down to 0 (red) at `max_speed`.
pub fn speed_to_hue(speed: f64, max_speed: f64) -> f64 {
    SLOW_HUE * (1.0 - normalized_speed(speed, max_speed))
}

/// Opaque particle color at full saturation and 50% lightness.
pub fn speed_to_color(speed: f64, max_speed: f64) -> Rgba8 {
    let [r, g, b] = hsl_to_rgb8(speed_to_hue(speed, max_speed), 1.0, 0.5);
    Rgba8::opaque(r, g, b)
}
