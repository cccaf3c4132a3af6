#![forbid(unsafe_code)]
//! Symbol matrices and the encoder seam.
//!
//! The error-correction coding, bit placement and mask selection live in an
//! external engine. This module owns the immutable [`SymbolMatrix`] the rest of
//! the crate renders from, and the [`Encoder`] trait that produces one.

use log::debug;
use qrcodegen::{QrCode, QrCodeEcc, QrSegment, Version};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{EncodeError, Error, Result};

/// Error correction level of a symbol, in ascending tolerance to damage.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub enum ErrorLevel {
    /// Tolerates ~7% erroneous codewords.
    #[default]
    Low,
    /// Tolerates ~15% erroneous codewords.
    Medium,
    /// Tolerates ~25% erroneous codewords.
    Quartile,
    /// Tolerates ~30% erroneous codewords.
    High,
}

impl ErrorLevel {
    pub const ALL: [ErrorLevel; 4] = [Self::Low, Self::Medium, Self::Quartile, Self::High];

    /// Maps a form selector code (`L`, `M`, `Q`, `H`) to a level.
    ///
    /// Unrecognized codes fall back to [`ErrorLevel::Low`].
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "L" | "l" => Self::Low,
            "M" | "m" => Self::Medium,
            "Q" | "q" => Self::Quartile,
            "H" | "h" => Self::High,
            _ => Self::Low,
        }
    }

    /// The single-letter selector code.
    pub fn code(self) -> &'static str {
        match self {
            Self::Low => "L",
            Self::Medium => "M",
            Self::Quartile => "Q",
            Self::High => "H",
        }
    }

    /// Returns an unsigned 2-bit integer (in the range 0 to 3).
    pub fn ordinal(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::Quartile => 2,
            Self::High => 3,
        }
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.get(usize::from(ordinal)).copied()
    }

    pub fn label(self) -> &'static str {
        error_level_label(self.ordinal())
    }
}

impl From<ErrorLevel> for QrCodeEcc {
    fn from(level: ErrorLevel) -> Self {
        match level {
            ErrorLevel::Low => QrCodeEcc::Low,
            ErrorLevel::Medium => QrCodeEcc::Medium,
            ErrorLevel::Quartile => QrCodeEcc::Quartile,
            ErrorLevel::High => QrCodeEcc::High,
        }
    }
}

impl From<QrCodeEcc> for ErrorLevel {
    fn from(ecc: QrCodeEcc) -> Self {
        match ecc {
            QrCodeEcc::Low => ErrorLevel::Low,
            QrCodeEcc::Medium => ErrorLevel::Medium,
            QrCodeEcc::Quartile => ErrorLevel::Quartile,
            QrCodeEcc::High => ErrorLevel::High,
        }
    }
}

impl Serialize for ErrorLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// Deserializes from a selector code, with the same fallback as [`ErrorLevel::from_code`].
impl<'de> Deserialize<'de> for ErrorLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(Self::from_code(&code))
    }
}

static ERROR_LEVEL_LABELS: [&str; 4] = ["Low", "Medium", "Quartile", "High"];

/// Label used for ordinals outside the known table.
pub const UNKNOWN_LEVEL_LABEL: &str = "Unknown";

/// Looks up the human label for an error correction ordinal as reported by an
/// encoding engine. Ordinals outside the table map to [`UNKNOWN_LEVEL_LABEL`].
pub fn error_level_label(ordinal: u8) -> &'static str {
    ERROR_LEVEL_LABELS
        .get(usize::from(ordinal))
        .copied()
        .unwrap_or(UNKNOWN_LEVEL_LABEL)
}

/// An encoded QR symbol: a square grid of dark and light modules.
///
/// Instances are immutable after creation. The grid is stored row-major, one
/// `bool` per module (`true` = dark).
///
/// # Example
///
/// ```rust
/// use qirust_live::qrcode::{Encoder, ErrorLevel, QrCodeGenEncoder};
///
/// let matrix = QrCodeGenEncoder::default()
///     .encode("Hello, World!", ErrorLevel::Low, None)
///     .unwrap();
///
/// println!("Version: {}", matrix.version());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolMatrix {
    size: usize,
    version: u8,
    mask: u8,
    error_correction_level: u8,
    modules: Vec<bool>,
}

impl SymbolMatrix {
    /// Builds a matrix from a row-major module grid.
    ///
    /// `error_correction_level` is the ordinal the engine reports; it is not
    /// validated so that labels can degrade to "Unknown" instead of failing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MatrixShape`] if `modules` does not hold `size * size`
    /// cells, or if that product overflows `usize`.
    pub fn new(
        size: usize,
        version: u8,
        mask: u8,
        error_correction_level: u8,
        modules: Vec<bool>,
    ) -> Result<Self> {
        let expected = size.checked_mul(size);
        if expected != Some(modules.len()) {
            return Err(Error::MatrixShape {
                size,
                expected: expected.unwrap_or(usize::MAX),
                actual: modules.len(),
            });
        }
        Ok(Self {
            size,
            version,
            mask,
            error_correction_level,
            modules,
        })
    }

    /// Copies the modules and attributes out of a `qrcodegen` symbol.
    pub fn from_qr(qr: &QrCode) -> Self {
        let side = qr.size();
        let modules = (0..side)
            .flat_map(|y| (0..side).map(move |x| (x, y)))
            .map(|(x, y)| qr.get_module(x, y))
            .collect();
        Self {
            size: side as usize,
            version: qr.version().value(),
            mask: qr.mask().value(),
            error_correction_level: ErrorLevel::from(qr.error_correction_level()).ordinal(),
            modules,
        }
    }

    /// The width and height of this symbol, measured in modules.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Version number (size class), 1 to 40 for Model 2 symbols.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Mask pattern identifier chosen by the encoder.
    pub fn mask(&self) -> u8 {
        self.mask
    }

    /// Ordinal of the error correction level actually used.
    pub fn error_correction_level(&self) -> u8 {
        self.error_correction_level
    }

    /// The effective level, if the ordinal is one this crate knows.
    pub fn error_level(&self) -> Option<ErrorLevel> {
        ErrorLevel::from_ordinal(self.error_correction_level)
    }

    /// Returns the color of the module at the given coordinates, `false` for
    /// light or `true` for dark. Coordinates outside the grid are light.
    pub fn get_module(&self, x: i32, y: i32) -> bool {
        let side = self.size as i32;
        (0..side).contains(&x) && (0..side).contains(&y) && self.modules[(y * side + x) as usize]
    }

    /// Iterates over the `(x, y)` coordinates of every dark module, row by row.
    pub fn dark_modules(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.modules
            .iter()
            .enumerate()
            .filter(|&(_, &dark)| dark)
            .map(move |(i, _)| (i % self.size, i / self.size))
    }

    pub fn count_dark_modules(&self) -> usize {
        self.modules.iter().filter(|&&dark| dark).count()
    }
}

/// Turns text into a [`SymbolMatrix`].
///
/// Implementations must be pure: the same input always yields the same matrix
/// or the same error.
pub trait Encoder {
    /// Encodes `text` at the requested level. `auxiliary`, when present, is
    /// carried in the same symbol after the main text.
    fn encode(
        &self,
        text: &str,
        level: ErrorLevel,
        auxiliary: Option<&str>,
    ) -> std::result::Result<SymbolMatrix, EncodeError>;
}

/// [`Encoder`] backed by the `qrcodegen` engine.
///
/// Picks the smallest version (1 to 40) that holds the data and lets the
/// engine choose the mask. If `boost_error_correction` is `true`, the level may
/// be raised when doing so does not increase the version. The default keeps
/// the requested level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QrCodeGenEncoder {
    pub boost_error_correction: bool,
}

impl QrCodeGenEncoder {
    pub fn new(boost_error_correction: bool) -> Self {
        Self {
            boost_error_correction,
        }
    }
}

impl Encoder for QrCodeGenEncoder {
    fn encode(
        &self,
        text: &str,
        level: ErrorLevel,
        auxiliary: Option<&str>,
    ) -> std::result::Result<SymbolMatrix, EncodeError> {
        let mut segments = QrSegment::make_segments(text);
        if let Some(aux) = auxiliary.filter(|aux| !aux.is_empty()) {
            segments.extend(QrSegment::make_segments(aux));
        }
        let qr = QrCode::encode_segments_advanced(
            &segments,
            level.into(),
            Version::MIN,
            Version::MAX,
            None,
            self.boost_error_correction,
        )?;
        debug!(
            "encoded {} segment(s) into version {} ({} requested)",
            segments.len(),
            qr.version().value(),
            level.label()
        );
        Ok(SymbolMatrix::from_qr(&qr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code() {
        assert_eq!(ErrorLevel::from_code("L"), ErrorLevel::Low);
        assert_eq!(ErrorLevel::from_code("M"), ErrorLevel::Medium);
        assert_eq!(ErrorLevel::from_code("q"), ErrorLevel::Quartile);
        assert_eq!(ErrorLevel::from_code(" H "), ErrorLevel::High);
        assert_eq!(ErrorLevel::from_code("X"), ErrorLevel::Low);
        assert_eq!(ErrorLevel::from_code(""), ErrorLevel::Low);
    }

    #[test]
    fn test_error_level_label() {
        assert_eq!(error_level_label(0), "Low");
        assert_eq!(error_level_label(3), "High");
        assert_eq!(error_level_label(4), UNKNOWN_LEVEL_LABEL);
        assert_eq!(error_level_label(u8::MAX), UNKNOWN_LEVEL_LABEL);
    }

    #[test]
    fn test_matrix_shape_is_checked() {
        let err = SymbolMatrix::new(3, 1, 0, 0, vec![false; 8]).unwrap_err();
        assert!(matches!(
            err,
            Error::MatrixShape {
                size: 3,
                expected: 9,
                actual: 8
            }
        ));
    }

    #[test]
    fn test_matrix_shape_overflow() {
        let err = SymbolMatrix::new(usize::MAX, 40, 0, 0, Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::MatrixShape {
                expected: usize::MAX,
                actual: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_get_module_out_of_range_is_light() {
        let matrix = SymbolMatrix::new(2, 1, 0, 0, vec![true; 4]).unwrap();
        assert!(matrix.get_module(1, 1));
        assert!(!matrix.get_module(-1, 0));
        assert!(!matrix.get_module(0, 2));
    }

    #[test]
    fn test_dark_modules_order() {
        let matrix = SymbolMatrix::new(2, 1, 0, 0, vec![false, true, true, false]).unwrap();
        let dark: Vec<_> = matrix.dark_modules().collect();
        assert_eq!(dark, vec![(1, 0), (0, 1)]);
        assert_eq!(matrix.count_dark_modules(), 2);
    }

    #[test]
    fn test_encode_hello_version_1() {
        let matrix = QrCodeGenEncoder::new(false)
            .encode("HELLO", ErrorLevel::Low, None)
            .unwrap();
        assert_eq!(matrix.version(), 1);
        assert_eq!(matrix.size(), 21);
        assert_eq!(matrix.error_level(), Some(ErrorLevel::Low));
        assert!(matrix.mask() <= 7);
    }

    #[test]
    fn test_default_keeps_requested_level() {
        let matrix = QrCodeGenEncoder::default()
            .encode("HELLO", ErrorLevel::Low, None)
            .unwrap();
        assert_eq!(matrix.error_level(), Some(ErrorLevel::Low));
    }

    #[test]
    fn test_encode_boosts_level() {
        let matrix = QrCodeGenEncoder::new(true)
            .encode("HELLO", ErrorLevel::Low, None)
            .unwrap();
        assert_eq!(matrix.version(), 1);
        assert!(matrix.error_level().unwrap() >= ErrorLevel::Low);
    }

    #[test]
    fn test_auxiliary_text_changes_symbol() {
        let encoder = QrCodeGenEncoder::default();
        let plain = encoder.encode("HELLO", ErrorLevel::Medium, None).unwrap();
        let with_aux = encoder
            .encode("HELLO", ErrorLevel::Medium, Some("hidden payload"))
            .unwrap();
        assert_ne!(plain, with_aux);
        let empty_aux = encoder.encode("HELLO", ErrorLevel::Medium, Some("")).unwrap();
        assert_eq!(plain, empty_aux);
    }

    #[test]
    fn test_encode_over_capacity() {
        let text = "a".repeat(1300);
        let err = QrCodeGenEncoder::default()
            .encode(&text, ErrorLevel::High, None)
            .unwrap_err();
        assert!(err.message().starts_with("Data length = "));
    }
}
