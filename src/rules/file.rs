//! Loading a [`RuleConfig`] from a TOML file.
//!
//! ```toml
//! flag_name = "BlastDT2"
//! window = 3
//! masked_first_readings = ["TxMaxAbs"]
//!
//! [[rules]]
//! variable = "TxMaxAbs"
//! op = ">="
//! threshold = 20.7
//!
//! [[rules]]
//! variable = "RH"
//! op = ">="
//! threshold = 77.0
//! ```

use crate::rules::config::{ConditionRule, RuleConfig};
use crate::rules::error::ConfigError;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleFile {
    flag_name: String,
    #[serde(default)]
    window: Option<usize>,
    #[serde(default)]
    masked_first_readings: Vec<String>,
    rules: Vec<ConditionRule>,
}

impl RuleConfig {
    /// Parses a rule set from TOML text. `origin` is only used in errors.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let file: RuleFile = toml::from_str(text)
            .map_err(|e| ConfigError::RuleFileParse(origin.to_path_buf(), e))?;
        RuleConfig::builder()
            .flag_name(file.flag_name)
            .rules(file.rules)
            .maybe_window(file.window)
            .masked_first_readings(file.masked_first_readings)
            .build()
    }

    /// Reads and validates a TOML rule file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::RuleFileRead(path.to_path_buf(), e))?;
        Self::from_toml_str(&text, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::config::Comparison;
    use std::io::Write;

    const DT2_TOML: &str = r#"
flag_name = "BlastDT2"
window = 3
masked_first_readings = ["TxMaxAbs"]

[[rules]]
variable = "TxMaxAbs"
op = ">="
threshold = 20.7

[[rules]]
variable = "Tx"
op = "<="
threshold = 30.7

[[rules]]
variable = "RH"
op = ">="
threshold = 77.0
"#;

    #[test]
    fn test_parse_rule_file() {
        let config = RuleConfig::from_toml_str(DT2_TOML, Path::new("dt2.toml")).unwrap();
        assert_eq!(config.flag_name(), "BlastDT2");
        assert_eq!(config.window(), Some(3));
        assert_eq!(config.rules().len(), 3);
        assert_eq!(config.rules()[1].op, Comparison::LessOrEqual);
        assert!(config.masks_first_reading("TxMaxAbs"));
    }

    #[test]
    fn test_parse_rejects_unknown_fields_and_ops() {
        let unknown_field = "flag_name = \"F\"\nwindows = 3\n[[rules]]\nvariable = \"RH\"\nop = \">\"\nthreshold = 1.0\n";
        assert!(matches!(
            RuleConfig::from_toml_str(unknown_field, Path::new("x.toml")),
            Err(ConfigError::RuleFileParse(..))
        ));

        let bad_op = "flag_name = \"F\"\n[[rules]]\nvariable = \"RH\"\nop = \"=>\"\nthreshold = 1.0\n";
        assert!(matches!(
            RuleConfig::from_toml_str(bad_op, Path::new("x.toml")),
            Err(ConfigError::RuleFileParse(..))
        ));
    }

    #[test]
    fn test_validation_runs_on_file_contents() {
        let zero_window = "flag_name = \"F\"\nwindow = 0\n[[rules]]\nvariable = \"RH\"\nop = \">\"\nthreshold = 1.0\n";
        assert!(matches!(
            RuleConfig::from_toml_str(zero_window, Path::new("x.toml")),
            Err(ConfigError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn test_from_toml_file() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(DT2_TOML.as_bytes())?;
        let config = RuleConfig::from_toml_file(file.path())?;
        assert_eq!(config.flag_name(), "BlastDT2");

        let missing = RuleConfig::from_toml_file(Path::new("/definitely/not/here.toml"));
        assert!(matches!(missing, Err(ConfigError::RuleFileRead(..))));
        Ok(())
    }
}
