//! Display metadata derived from a rendered symbol.

use chrono::{DateTime, FixedOffset, Local};
use serde::Serialize;

use crate::qrcode::{error_level_label, SymbolMatrix};

/// Shown in every metadata slot while nothing is rendered.
pub const PLACEHOLDER: &str = "–";

/// Facts about the current render, copied off the symbol matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayMeta {
    pub version: u8,
    pub size: usize,
    pub error_level_label: &'static str,
    pub mask: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl DisplayMeta {
    pub fn from_matrix(matrix: &SymbolMatrix) -> Self {
        Self {
            version: matrix.version(),
            size: matrix.size(),
            error_level_label: error_level_label(matrix.error_correction_level()),
            mask: matrix.mask(),
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, instant: &DateTime<FixedOffset>) -> Self {
        self.timestamp = Some(format_timestamp(instant));
        self
    }

    /// The text of each display slot.
    pub fn fields(&self) -> MetaFields {
        MetaFields {
            version: self.version.to_string(),
            size: format!("{0} × {0}", self.size),
            error_level: self.error_level_label.to_owned(),
            mask: self.mask.to_string(),
            timestamp: self
                .timestamp
                .clone()
                .unwrap_or_else(|| PLACEHOLDER.to_owned()),
        }
    }
}

/// Text shown in the metadata panel, one string per slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaFields {
    pub version: String,
    pub size: String,
    pub error_level: String,
    pub mask: String,
    pub timestamp: String,
}

impl MetaFields {
    pub fn placeholder() -> Self {
        Self {
            version: PLACEHOLDER.to_owned(),
            size: PLACEHOLDER.to_owned(),
            error_level: PLACEHOLDER.to_owned(),
            mask: PLACEHOLDER.to_owned(),
            timestamp: PLACEHOLDER.to_owned(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        *self == Self::placeholder()
    }
}

impl Default for MetaFields {
    fn default() -> Self {
        Self::placeholder()
    }
}

/// Formats a UTC offset as `+H` or `+H:MM`; minutes appear only when non-zero.
///
/// ```rust
/// use qirust_live::meta::format_utc_offset;
///
/// assert_eq!(format_utc_offset(0), "+0");
/// assert_eq!(format_utc_offset(5 * 3600 + 30 * 60), "+5:30");
/// assert_eq!(format_utc_offset(-8 * 3600), "-8");
/// ```
pub fn format_utc_offset(offset_seconds: i32) -> String {
    let sign = if offset_seconds < 0 { '-' } else { '+' };
    let minutes = offset_seconds.unsigned_abs() / 60;
    let (hours, minutes) = (minutes / 60, minutes % 60);
    if minutes == 0 {
        format!("{sign}{hours}")
    } else {
        format!("{sign}{hours}:{minutes:02}")
    }
}

/// Formats `instant` as `YYYY-MM-DD HH:MM:SS UTC±H[:MM]` in its own offset.
pub fn format_timestamp(instant: &DateTime<FixedOffset>) -> String {
    format!(
        "{} UTC{}",
        instant.format("%Y-%m-%d %H:%M:%S"),
        format_utc_offset(instant.offset().local_minus_utc())
    )
}

/// The current instant in the system's local offset.
pub fn local_now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(offset_seconds: i32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(offset_seconds)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 9, 7, 5, 3)
            .unwrap()
    }

    #[test]
    fn test_timestamp_with_minutes() {
        assert_eq!(
            format_timestamp(&at(5 * 3600 + 30 * 60)),
            "2024-03-09 07:05:03 UTC+5:30"
        );
    }

    #[test]
    fn test_timestamp_utc() {
        assert_eq!(format_timestamp(&at(0)), "2024-03-09 07:05:03 UTC+0");
    }

    #[test]
    fn test_timestamp_negative_offset() {
        assert_eq!(
            format_timestamp(&at(-(3 * 3600 + 45 * 60))),
            "2024-03-09 07:05:03 UTC-3:45"
        );
    }

    #[test]
    fn test_fields() {
        let matrix = SymbolMatrix::new(21, 1, 3, 2, vec![false; 21 * 21]).unwrap();
        let fields = DisplayMeta::from_matrix(&matrix).fields();
        assert_eq!(fields.version, "1");
        assert_eq!(fields.size, "21 × 21");
        assert_eq!(fields.error_level, "Quartile");
        assert_eq!(fields.mask, "3");
        assert_eq!(fields.timestamp, PLACEHOLDER);
    }

    #[test]
    fn test_unknown_level_label() {
        let matrix = SymbolMatrix::new(1, 1, 0, 9, vec![true]).unwrap();
        assert_eq!(DisplayMeta::from_matrix(&matrix).error_level_label, "Unknown");
    }
}
