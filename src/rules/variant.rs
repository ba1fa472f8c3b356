//! The three historical NIAN rice blast formulas, expressed as presets of
//! [`RuleConfig`].

use crate::rules::config::{Comparison, ConditionRule, RuleConfig};
use crate::rules::error::ConfigError;
use crate::types::daily::{VAR_RH, VAR_TX, VAR_TX_MAX_ABS};
use std::fmt;

/// A named preset rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleVariant {
    /// The original NIAN formula: `TxMaxAbs > T` and `RH > RH` held for a
    /// number of consecutive days.
    BlastDt,
    /// Second revision: `TxMaxAbs >= lower`, `Tx <= upper`, `RH >= RH`, all
    /// held over the same persistence window.
    BlastDt2,
    /// Third revision: `TxMaxAbs >= lower`, `Tx < upper`, `RH >= RH`,
    /// evaluated per day without persistence.
    BlastDt3,
}

/// Threshold overrides. Unset fields fall back to the variant defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Thresholds {
    /// Lower bound on daily mean relative humidity.
    pub rh: Option<f64>,
    /// Upper bound on daily mean temperature. Unused by [`RuleVariant::BlastDt`].
    pub t_upper: Option<f64>,
    /// Lower bound on daily maximum temperature.
    pub t_lower: Option<f64>,
    /// Persistence window. Ignored by [`RuleVariant::BlastDt3`].
    pub window: Option<usize>,
}

impl RuleVariant {
    pub const ALL: [RuleVariant; 3] = [
        RuleVariant::BlastDt,
        RuleVariant::BlastDt2,
        RuleVariant::BlastDt3,
    ];

    /// Name of the flag column this variant writes.
    pub fn flag_name(&self) -> &'static str {
        match self {
            RuleVariant::BlastDt => "BlastDT",
            RuleVariant::BlastDt2 => "BlastDT2",
            RuleVariant::BlastDt3 => "BlastDT3",
        }
    }

    /// Default output folder for per-station files of this variant.
    pub fn output_dir_name(&self) -> &'static str {
        match self {
            RuleVariant::BlastDt => "prediction",
            RuleVariant::BlastDt2 => "prediction_BlastDT2",
            RuleVariant::BlastDt3 => "prediction_BlastDT3",
        }
    }

    /// The thresholds a run uses when nothing is overridden.
    pub fn default_thresholds(&self) -> Thresholds {
        match self {
            RuleVariant::BlastDt => Thresholds {
                rh: Some(80.0),
                t_upper: None,
                t_lower: Some(23.5),
                window: Some(3),
            },
            RuleVariant::BlastDt2 => Thresholds {
                rh: Some(77.0),
                t_upper: Some(30.7),
                t_lower: Some(20.7),
                window: Some(1),
            },
            RuleVariant::BlastDt3 => Thresholds {
                rh: Some(74.0),
                t_upper: Some(30.8),
                t_lower: Some(20.7),
                window: None,
            },
        }
    }

    /// The preset with default thresholds.
    pub fn config(&self) -> Result<RuleConfig, ConfigError> {
        self.config_with(Thresholds::default())
    }

    /// The preset with `overrides` applied on top of the defaults.
    pub fn config_with(&self, overrides: Thresholds) -> Result<RuleConfig, ConfigError> {
        let defaults = self.default_thresholds();
        let rh = overrides.rh.or(defaults.rh).unwrap_or_default();
        let t_lower = overrides.t_lower.or(defaults.t_lower).unwrap_or_default();
        let t_upper = overrides.t_upper.or(defaults.t_upper).unwrap_or_default();

        let (rules, window, masked) = match self {
            RuleVariant::BlastDt => (
                vec![
                    ConditionRule::new(VAR_TX_MAX_ABS, Comparison::Greater, t_lower),
                    ConditionRule::new(VAR_RH, Comparison::Greater, rh),
                ],
                overrides.window.or(defaults.window),
                vec![VAR_TX_MAX_ABS.to_string()],
            ),
            RuleVariant::BlastDt2 => (
                vec![
                    ConditionRule::new(VAR_TX, Comparison::LessOrEqual, t_upper),
                    ConditionRule::new(VAR_TX_MAX_ABS, Comparison::GreaterOrEqual, t_lower),
                    ConditionRule::new(VAR_RH, Comparison::GreaterOrEqual, rh),
                ],
                overrides.window.or(defaults.window),
                vec![VAR_TX_MAX_ABS.to_string()],
            ),
            RuleVariant::BlastDt3 => (
                vec![
                    ConditionRule::new(VAR_TX_MAX_ABS, Comparison::GreaterOrEqual, t_lower),
                    ConditionRule::new(VAR_TX, Comparison::Less, t_upper),
                    ConditionRule::new(VAR_RH, Comparison::GreaterOrEqual, rh),
                ],
                None,
                Vec::new(),
            ),
        };

        RuleConfig::builder()
            .flag_name(self.flag_name())
            .rules(rules)
            .maybe_window(window)
            .masked_first_readings(masked)
            .build()
    }
}

impl fmt::Display for RuleVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.flag_name())
    }
}
