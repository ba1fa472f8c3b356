//! Data-driven rule configuration: threshold comparisons, an optional
//! persistence window, and the name of the resulting flag column.

use crate::output::writer::{COL_DATE, COL_LAT, COL_LON, COL_STATION_ID, COL_STATION_NAME};
use crate::rules::error::ConfigError;
use crate::types::condition::Condition;
use bon::bon;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Longest accepted persistence window, in days.
pub const MAX_WINDOW: usize = 366;

/// Comparison applied between a reading and its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = "<=")]
    LessOrEqual,
}

impl Comparison {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Greater => ">",
            Comparison::GreaterOrEqual => ">=",
            Comparison::Less => "<",
            Comparison::LessOrEqual => "<=",
        }
    }

    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::Greater => value > threshold,
            Comparison::GreaterOrEqual => value >= threshold,
            Comparison::Less => value < threshold,
            Comparison::LessOrEqual => value <= threshold,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Comparison {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            ">" => Ok(Comparison::Greater),
            ">=" => Ok(Comparison::GreaterOrEqual),
            "<" => Ok(Comparison::Less),
            "<=" => Ok(Comparison::LessOrEqual),
            other => Err(ConfigError::UnknownOperator(other.to_string())),
        }
    }
}

/// One threshold condition, e.g. `RH >= 77`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionRule {
    /// The variable (source column) the rule reads.
    pub variable: String,
    pub op: Comparison,
    pub threshold: f64,
    /// Optional label used for output column names; defaults to the variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ConditionRule {
    pub fn new(variable: impl Into<String>, op: Comparison, threshold: f64) -> Self {
        Self {
            variable: variable.into(),
            op,
            threshold,
            name: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.variable)
    }

    /// Evaluates one reading. Missing (or NaN) readings are `Unknown`.
    pub fn evaluate(&self, value: Option<f64>) -> Condition {
        match value {
            Some(v) if !v.is_nan() => Condition::from(self.op.holds(v, self.threshold)),
            _ => Condition::Unknown,
        }
    }
}

impl fmt::Display for ConditionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.variable, self.op, self.threshold)
    }
}

/// A complete, validated rule set.
///
/// Every historical formula is an instance of this type; the classifier never
/// branches on which formula it is running.
///
/// # Examples
///
/// ```
/// use blastdt::{Comparison, ConditionRule, RuleConfig};
///
/// let config = RuleConfig::builder()
///     .flag_name("HumidSpell")
///     .rules(vec![ConditionRule::new("RH", Comparison::GreaterOrEqual, 77.0)])
///     .window(3)
///     .build()
///     .unwrap();
/// assert_eq!(config.window(), Some(3));
/// assert_eq!(config.lead_days(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RuleConfig {
    flag_name: String,
    rules: Vec<ConditionRule>,
    window: Option<usize>,
    masked_first_readings: Vec<String>,
}

#[bon]
impl RuleConfig {
    /// Validates and builds a rule set.
    ///
    /// * `.flag_name(..)`: **Required.** Name of the final flag column.
    /// * `.rules(..)`: **Required.** At least one condition; labels must be
    ///   unique, and no output column name may be produced twice.
    /// * `.window(usize)`: Optional persistence window of 1 to [`MAX_WINDOW`]
    ///   days. When absent no rolling columns are produced and each day
    ///   stands alone.
    /// * `.masked_first_readings(..)`: Variables whose reading on the first
    ///   day of the classified series is treated as unknown.
    #[builder]
    pub fn new(
        #[builder(into)] flag_name: String,
        rules: Vec<ConditionRule>,
        window: Option<usize>,
        #[builder(default)] masked_first_readings: Vec<String>,
    ) -> Result<Self, ConfigError> {
        if rules.is_empty() {
            return Err(ConfigError::NoRules { flag: flag_name });
        }
        if let Some(window) = window {
            if window == 0 || window > MAX_WINDOW {
                return Err(ConfigError::InvalidWindow {
                    flag: flag_name,
                    window,
                    max: MAX_WINDOW,
                });
            }
        }
        let mut labels = HashSet::new();
        for rule in &rules {
            if !rule.threshold.is_finite() {
                return Err(ConfigError::InvalidThreshold {
                    label: rule.label().to_string(),
                });
            }
            if !labels.insert(rule.label()) {
                return Err(ConfigError::DuplicateRule {
                    flag: flag_name,
                    label: rule.label().to_string(),
                });
            }
        }
        if let Some(column) = first_clashing_column(&flag_name, &rules, window.is_some()) {
            return Err(ConfigError::ColumnClash {
                flag: flag_name,
                column,
            });
        }
        Ok(Self {
            flag_name,
            rules,
            window,
            masked_first_readings,
        })
    }

    pub fn flag_name(&self) -> &str {
        &self.flag_name
    }

    pub fn rules(&self) -> &[ConditionRule] {
        &self.rules
    }

    pub fn window(&self) -> Option<usize> {
        self.window
    }

    pub fn masked_first_readings(&self) -> &[String] {
        &self.masked_first_readings
    }

    pub fn masks_first_reading(&self, variable: &str) -> bool {
        self.masked_first_readings.iter().any(|v| v == variable)
    }

    /// Days of history loaded ahead of each classified year.
    ///
    /// One day per window slot: the window itself needs `W - 1` preceding
    /// days and the masked first reading consumes one more.
    pub fn lead_days(&self) -> usize {
        self.window.unwrap_or(0)
    }

    /// Distinct variables referenced by the rules, in rule order.
    pub fn variables(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for rule in &self.rules {
            if !seen.contains(&rule.variable.as_str()) {
                seen.push(rule.variable.as_str());
            }
        }
        seen
    }
}

/// Finds the first column name the output table would contain twice.
fn first_clashing_column(flag_name: &str, rules: &[ConditionRule], windowed: bool) -> Option<String> {
    let mut columns: HashSet<String> = [COL_DATE, COL_STATION_ID, COL_STATION_NAME, COL_LAT, COL_LON]
        .into_iter()
        .map(str::to_string)
        .collect();
    if !columns.insert(flag_name.to_string()) {
        return Some(flag_name.to_string());
    }
    let mut variables = HashSet::new();
    for rule in rules {
        let mut names = Vec::with_capacity(3);
        if variables.insert(rule.variable.as_str()) {
            names.push(rule.variable.clone());
        }
        names.push(format!("{}_condition", rule.label()));
        if windowed {
            names.push(format!("{}_condition_rolling", rule.label()));
        }
        if let Some(clash) = names.into_iter().find(|name| !columns.insert(name.clone())) {
            return Some(clash);
        }
    }
    None
}

impl fmt::Display for RuleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rules: Vec<String> = self.rules.iter().map(|r| r.to_string()).collect();
        write!(f, "{}: {}", self.flag_name, rules.join(" AND "))?;
        if let Some(window) = self.window {
            write!(f, " over {window} day(s)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rh_rule() -> ConditionRule {
        ConditionRule::new("RH", Comparison::GreaterOrEqual, 77.0)
    }

    #[test]
    fn test_comparison_parse_and_holds() {
        assert_eq!(">=".parse::<Comparison>().unwrap(), Comparison::GreaterOrEqual);
        assert_eq!(" < ".parse::<Comparison>().unwrap(), Comparison::Less);
        assert!(matches!(
            "=>".parse::<Comparison>(),
            Err(ConfigError::UnknownOperator(op)) if op == "=>"
        ));
        assert!(Comparison::GreaterOrEqual.holds(77.0, 77.0));
        assert!(!Comparison::Greater.holds(77.0, 77.0));
        assert!(Comparison::LessOrEqual.holds(30.7, 30.7));
        assert!(!Comparison::Less.holds(30.8, 30.8));
    }

    #[test]
    fn test_rule_evaluate_missing_is_unknown() {
        let rule = rh_rule();
        assert_eq!(rule.evaluate(Some(80.0)), Condition::True);
        assert_eq!(rule.evaluate(Some(70.0)), Condition::False);
        assert_eq!(rule.evaluate(None), Condition::Unknown);
        assert_eq!(rule.evaluate(Some(f64::NAN)), Condition::Unknown);
    }

    #[test]
    fn test_builder_defaults() {
        let config = RuleConfig::builder()
            .flag_name("Flag")
            .rules(vec![rh_rule()])
            .build()
            .unwrap();
        assert_eq!(config.window(), None);
        assert_eq!(config.lead_days(), 0);
        assert!(config.masked_first_readings().is_empty());
        assert_eq!(config.to_string(), "Flag: RH >= 77");
    }

    #[test]
    fn test_builder_rejects_invalid_sets() {
        let empty = RuleConfig::builder().flag_name("F").rules(vec![]).build();
        assert!(matches!(empty, Err(ConfigError::NoRules { .. })));

        let zero = RuleConfig::builder()
            .flag_name("F")
            .rules(vec![rh_rule()])
            .window(0)
            .build();
        assert!(matches!(zero, Err(ConfigError::InvalidWindow { window: 0, .. })));

        let huge = RuleConfig::builder()
            .flag_name("F")
            .rules(vec![rh_rule()])
            .window(100_000_000)
            .build();
        assert!(matches!(
            huge,
            Err(ConfigError::InvalidWindow { window: 100_000_000, max: MAX_WINDOW, .. })
        ));

        let duplicate = RuleConfig::builder()
            .flag_name("F")
            .rules(vec![rh_rule(), rh_rule()])
            .build();
        assert!(matches!(duplicate, Err(ConfigError::DuplicateRule { .. })));

        let nan = RuleConfig::builder()
            .flag_name("F")
            .rules(vec![ConditionRule::new("RH", Comparison::Less, f64::NAN)])
            .build();
        assert!(matches!(nan, Err(ConfigError::InvalidThreshold { .. })));
    }

    #[test]
    fn test_same_variable_twice_with_labels() {
        let config = RuleConfig::builder()
            .flag_name("Band")
            .rules(vec![
                ConditionRule::new("Tx", Comparison::GreaterOrEqual, 20.0).named("Tx_low"),
                ConditionRule::new("Tx", Comparison::Less, 30.0).named("Tx_high"),
            ])
            .build()
            .unwrap();
        assert_eq!(config.variables(), vec!["Tx"]);
        assert_eq!(config.rules()[1].label(), "Tx_high");
    }

    fn clash(config: Result<RuleConfig, ConfigError>) -> Option<String> {
        match config {
            Err(ConfigError::ColumnClash { column, .. }) => Some(column),
            _ => None,
        }
    }

    #[test]
    fn test_builder_rejects_column_clashes() {
        let flag_is_variable = RuleConfig::builder()
            .flag_name("RH")
            .rules(vec![rh_rule()])
            .build();
        assert_eq!(clash(flag_is_variable).as_deref(), Some("RH"));

        // Labels only name the suffixed condition columns.
        let label_is_station_id = RuleConfig::builder()
            .flag_name("F")
            .rules(vec![rh_rule(), rh_rule().named("站號")])
            .build();
        assert_eq!(clash(label_is_station_id), None);

        let variable_is_station_id = RuleConfig::builder()
            .flag_name("F")
            .rules(vec![ConditionRule::new("站號", Comparison::Greater, 1.0)])
            .build();
        assert_eq!(clash(variable_is_station_id).as_deref(), Some("站號"));

        let flag_is_condition = RuleConfig::builder()
            .flag_name("RH_condition")
            .rules(vec![rh_rule()])
            .build();
        assert_eq!(clash(flag_is_condition).as_deref(), Some("RH_condition"));

        // Only windowed rule sets write rolling columns.
        let rolling = |window: Option<usize>| {
            RuleConfig::builder()
                .flag_name("F")
                .rules(vec![
                    rh_rule(),
                    ConditionRule::new("RH_condition_rolling", Comparison::Less, 30.0),
                ])
                .maybe_window(window)
                .build()
        };
        assert_eq!(clash(rolling(None)), None);
        assert!(rolling(None).is_ok());
        assert_eq!(clash(rolling(Some(3))).as_deref(), Some("RH_condition_rolling"));
    }

    #[test]
    fn test_presets_have_distinct_columns() {
        for variant in crate::rules::variant::RuleVariant::ALL {
            assert!(variant.config().is_ok(), "{variant:?}");
        }
    }
}
