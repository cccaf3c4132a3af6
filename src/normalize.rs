//! Turns raw form values into validated render input.

use serde::{Deserialize, Serialize};

use crate::qrcode::ErrorLevel;

pub const MIN_SCALE: u32 = 2;
pub const MAX_SCALE: u32 = 20;
pub const DEFAULT_SCALE: u32 = 8;

pub const MIN_MARGIN: u32 = 0;
pub const MAX_MARGIN: u32 = 10;
pub const DEFAULT_MARGIN: u32 = 4;

/// Limits `value` to `[min, max]`.
///
/// Unlike [`Ord::clamp`] this never panics: if `min > max` the result is `max`.
pub fn clamp(value: i64, min: i64, max: i64) -> i64 {
    value.max(min).min(max)
}

/// Reads the leading integer of `raw`, the way a browser number field does.
///
/// Leading whitespace and a single sign are accepted, anything after the
/// digits is ignored (`"12px"` is 12, `"7.9"` is 7). Returns `None` when no
/// digit follows. Values too large for `i64` saturate.
pub fn parse_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude = digits[..end].bytes().fold(0i64, |acc, d| {
        acc.saturating_mul(10).saturating_add(i64::from(d - b'0'))
    });
    Some(if negative { -magnitude } else { magnitude })
}

fn clamp_or_default(raw: &str, default: u32, min: u32, max: u32) -> u32 {
    let value = parse_int(raw).unwrap_or(i64::from(default));
    // The result lies in [min, max], both of which fit in u32.
    clamp(value, i64::from(min), i64::from(max)) as u32
}

/// Options the renderer works from. Scale and margin are always within range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    pub error_level: ErrorLevel,
    /// Pixels per module, in `[2, 20]`.
    pub scale: u32,
    /// Quiet-zone width in modules, in `[0, 10]`.
    pub margin: u32,
}

impl RenderOptions {
    /// Builds options, clamping `scale` and `margin` into range.
    pub fn new(error_level: ErrorLevel, scale: i64, margin: i64) -> Self {
        Self {
            error_level,
            scale: clamp(scale, i64::from(MIN_SCALE), i64::from(MAX_SCALE)) as u32,
            margin: clamp(margin, i64::from(MIN_MARGIN), i64::from(MAX_MARGIN)) as u32,
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            error_level: ErrorLevel::Low,
            scale: DEFAULT_SCALE,
            margin: DEFAULT_MARGIN,
        }
    }
}

/// A message that is ready to encode, with its render options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedInput {
    /// The message with surrounding whitespace removed; never empty.
    pub message: String,
    /// Auxiliary text, passed through untouched. Empty when absent.
    pub auxiliary: String,
    pub options: RenderOptions,
}

/// Normalizes one snapshot of the form.
///
/// Returns `None` when the trimmed message is empty, meaning there is nothing
/// to render. Otherwise the level code is mapped (unknown codes become
/// [`ErrorLevel::Low`]) and scale / margin are parsed, defaulted and clamped.
///
/// Only input with no leading integer takes the default. A typed `0` is a
/// number and is clamped like any other, so scale `"0"` becomes 2 (not 8) and
/// margin `"0"` stays 0 (not 4).
pub fn normalize(
    raw_text: &str,
    raw_auxiliary: Option<&str>,
    raw_error_level_code: &str,
    raw_scale: &str,
    raw_margin: &str,
) -> Option<NormalizedInput> {
    let message = raw_text.trim();
    if message.is_empty() {
        return None;
    }

    let options = RenderOptions {
        error_level: ErrorLevel::from_code(raw_error_level_code),
        scale: clamp_or_default(raw_scale, DEFAULT_SCALE, MIN_SCALE, MAX_SCALE),
        margin: clamp_or_default(raw_margin, DEFAULT_MARGIN, MIN_MARGIN, MAX_MARGIN),
    };

    Some(NormalizedInput {
        message: message.to_owned(),
        auxiliary: raw_auxiliary.unwrap_or_default().to_owned(),
        options,
    })
}
