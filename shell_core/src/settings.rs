//! # Codec Settings
//!
//! Options that change how records are read and written without changing
//! the cards themselves. Settings serialize to JSON so a front end can keep
//! them next to its input files.
//!
//! ```rust
//! use shell_core::settings::Settings;
//! use shell_core::plies::SmearMethod;
//!
//! let settings = Settings::from_json(r#"{ "smear_method": "t" }"#).unwrap();
//! assert_eq!(settings.smear_method, SmearMethod::ByThicknessFraction);
//! assert!(!settings.legacy_binary_thickness);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::PropResult;
use crate::fields::FieldWidth;
use crate::plies::SmearMethod;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Smearing used for per-ply mass queries when the caller does not pick one
    pub smear_method: SmearMethod,

    /// Column width for `write_card`
    pub field_width: FieldWidth,

    /// Accept non-positive thicknesses from binary tuples (logged, not rejected).
    ///
    /// Off by default: binary ingestion is as strict as card parsing.
    pub legacy_binary_thickness: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            smear_method: SmearMethod::ByPlyCount,
            field_width: FieldWidth::Short,
            legacy_binary_thickness: false,
        }
    }
}

impl Settings {
    /// Parse settings from JSON; missing keys take their defaults
    pub fn from_json(json: &str) -> PropResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> PropResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.smear_method, SmearMethod::ByPlyCount);
        assert_eq!(settings.field_width, FieldWidth::Short);
        assert!(!settings.legacy_binary_thickness);
    }

    #[test]
    fn test_roundtrip() {
        let settings = Settings {
            smear_method: SmearMethod::ByMassFraction,
            field_width: FieldWidth::Long,
            legacy_binary_thickness: true,
        };
        let json = settings.to_json().unwrap();
        assert!(json.contains("\"rho*t\""));
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(Settings::from_json("{}").unwrap(), Settings::default());
    }

    #[test]
    fn test_bad_method_rejected() {
        let err = Settings::from_json(r#"{ "smear_method": "mass" }"#).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }
}
