//! Serializable preview settings.
//!
//! ```
//! use qirust_live::PreviewConfig;
//!
//! let config = PreviewConfig::from_json(r#"{ "timestamp": true }"#).unwrap();
//! assert!(config.timestamp);
//! assert!(!config.auxiliary);
//!
//! let json = config.to_json().unwrap();
//! assert_eq!(PreviewConfig::from_json(&json).unwrap(), config);
//! ```

use std::fs;
use std::path::Path;

use image::Luma;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::helper::Palette;

/// Optional features and colours of the preview.
///
/// Missing JSON fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreviewConfig {
    /// Encode the auxiliary form field into the symbol after the message.
    pub auxiliary: bool,
    /// Stamp the metadata with the local generation time.
    pub timestamp: bool,
    /// Let the encoder raise the error correction level when it is free.
    /// Off by default, so the panel shows the level that was asked for.
    pub boost_error_correction: bool,
    /// Grey level of dark modules.
    pub foreground: u8,
    /// Grey level of the background and quiet zone.
    pub background: u8,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        let palette = Palette::default();
        Self {
            auxiliary: false,
            timestamp: false,
            boost_error_correction: false,
            foreground: palette.dark.0[0],
            background: palette.light.0[0],
        }
    }
}

impl PreviewConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn palette(&self) -> Palette {
        Palette {
            dark: Luma([self.foreground]),
            light: Luma([self.background]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(PreviewConfig::from_json("{}").unwrap(), PreviewConfig::default());
    }

    #[test]
    fn test_camel_case_keys() {
        let config =
            PreviewConfig::from_json(r#"{"boostErrorCorrection": true, "foreground": 0}"#)
                .unwrap();
        assert!(config.boost_error_correction);
        assert_eq!(config.palette().dark, Luma([0]));
        assert_eq!(config.palette().light, Luma([0xff]));
    }

    #[test]
    fn test_boost_is_opt_in() {
        let config = PreviewConfig::default();
        assert!(!config.boost_error_correction);
        assert!(!PreviewConfig::from_json("{}").unwrap().boost_error_correction);
    }

    #[test]
    fn test_invalid_json() {
        assert!(PreviewConfig::from_json("{ timestamp: yes }").is_err());
    }
}
