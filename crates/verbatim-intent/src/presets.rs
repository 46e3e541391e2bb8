//! Named speaking-rate and volume presets with their clamping ranges.

pub const RATE_MIN: u32 = 120;
pub const RATE_MAX: u32 = 260;
pub const RATE_STEP: i32 = 15;

pub const VOLUME_MIN: f32 = 0.0;
pub const VOLUME_MAX: f32 = 1.0;
pub const VOLUME_STEP: f32 = 0.10;

/// Resolve a rate word to `(words per minute, canonical label)`.
/// "low" and "high" are aliases for "slow" and "fast".
pub fn rate_preset(word: &str) -> Option<(u32, &'static str)> {
    match word.trim().to_lowercase().as_str() {
        "very slow" => Some((130, "very slow")),
        "slow" | "low" => Some((150, "slow")),
        "medium" => Some((185, "medium")),
        "fast" | "high" => Some((210, "fast")),
        "very fast" => Some((240, "very fast")),
        _ => None,
    }
}

/// Resolve a volume word to a level in `[0, 1]`.
pub fn volume_preset(word: &str) -> Option<f32> {
    match word.trim().to_lowercase().as_str() {
        "mute" => Some(0.0),
        "low" => Some(0.6),
        "medium" | "normal" => Some(0.85),
        "high" | "max" | "maximum" => Some(1.0),
        _ => None,
    }
}

pub fn clamp_rate(rate: i64) -> u32 {
    rate.clamp(RATE_MIN as i64, RATE_MAX as i64) as u32
}

pub fn clamp_volume(volume: f32) -> f32 {
    volume.clamp(VOLUME_MIN, VOLUME_MAX)
}
