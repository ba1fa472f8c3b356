//! Applies a [`RuleConfig`] to a normalized [`DailySeries`].

use crate::classify::error::ClassifyError;
use crate::classify::rolling::rolling_all;
use crate::rules::config::{ConditionRule, RuleConfig};
use crate::types::condition::Condition;
use crate::types::daily::DailySeries;
use chrono::NaiveDate;

/// Per-day results of one rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionColumn {
    pub rule: ConditionRule,
    /// The per-day comparison.
    pub daily: Vec<Condition>,
    /// The trailing-window conjunction, present when the rule set has a
    /// persistence window.
    pub rolling: Option<Vec<Condition>>,
}

impl ConditionColumn {
    /// The results that feed the final flag.
    pub fn effective(&self) -> &[Condition] {
        self.rolling.as_deref().unwrap_or(&self.daily)
    }

    pub fn condition_column_name(&self) -> String {
        format!("{}_condition", self.rule.label())
    }

    pub fn rolling_column_name(&self) -> String {
        format!("{}_condition_rolling", self.rule.label())
    }
}

/// A series annotated with condition columns and the final risk flag.
///
/// All vectors are aligned with `series.records()`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedSeries {
    pub series: DailySeries,
    pub flag_name: String,
    pub conditions: Vec<ConditionColumn>,
    pub flag: Vec<Condition>,
}

impl ClassifiedSeries {
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Drops every row dated before `date` (e.g. lead days that only served as
    /// window history). Returns the number of rows removed.
    pub fn drop_before(&mut self, date: NaiveDate) -> usize {
        let cut = self.series.drop_before(date);
        self.flag.drain(..cut);
        for column in self.conditions.iter_mut() {
            column.daily.drain(..cut);
            if let Some(rolling) = column.rolling.as_mut() {
                rolling.drain(..cut);
            }
        }
        cut
    }

    /// Number of days flagged as at risk.
    pub fn risk_days(&self) -> usize {
        self.flag.iter().filter(|c| **c == Condition::True).count()
    }
}

/// Classifies every day of `series` against `config`.
///
/// Each rule is compared per day (`Unknown` when the reading is missing),
/// optionally rolled over the persistence window, and all rules are combined
/// with [`Condition::all`]. Readings listed in
/// [`RuleConfig::masked_first_readings`] are treated as unknown on the first
/// day of the series.
///
/// # Errors
///
/// Returns [`ClassifyError::MissingRequiredVariable`] when a rule reads a
/// variable the series does not carry.
///
/// # Examples
///
/// ```
/// use blastdt::{classify, normalize, Comparison, Condition, ConditionRule, RawDailyRecord, RuleConfig};
/// use chrono::NaiveDate;
///
/// let raw = ["2023-07-01", "2023-07-02", "2023-07-03", "2023-07-04"]
///     .iter()
///     .zip([70.0, 80.0, 75.0, 78.0])
///     .map(|(d, rh)| RawDailyRecord::new(*d).with("RH", Some(rh)))
///     .collect();
/// let start = NaiveDate::from_ymd_opt(2023, 7, 1).unwrap();
/// let end = NaiveDate::from_ymd_opt(2023, 7, 4).unwrap();
/// let series = normalize(raw, start, end).unwrap();
///
/// let config = RuleConfig::builder()
///     .flag_name("Humid")
///     .rules(vec![ConditionRule::new("RH", Comparison::GreaterOrEqual, 77.0)])
///     .build()
///     .unwrap();
/// let classified = classify(series, &config).unwrap();
/// assert_eq!(
///     classified.flag,
///     vec![Condition::False, Condition::True, Condition::False, Condition::True]
/// );
/// ```
pub fn classify(series: DailySeries, config: &RuleConfig) -> Result<ClassifiedSeries, ClassifyError> {
    for rule in config.rules() {
        if !series.has_variable(&rule.variable) {
            return Err(ClassifyError::MissingRequiredVariable {
                flag: config.flag_name().to_string(),
                variable: rule.variable.clone(),
            });
        }
    }

    let conditions: Vec<ConditionColumn> = config
        .rules()
        .iter()
        .map(|rule| {
            let masked = config.masks_first_reading(&rule.variable);
            let daily: Vec<Condition> = series
                .records()
                .iter()
                .enumerate()
                .map(|(i, record)| {
                    if masked && i == 0 {
                        Condition::Unknown
                    } else {
                        rule.evaluate(record.value(&rule.variable))
                    }
                })
                .collect();
            let rolling = config.window().map(|w| rolling_all(&daily, w));
            ConditionColumn {
                rule: rule.clone(),
                daily,
                rolling,
            }
        })
        .collect();

    let flag = (0..series.len())
        .map(|i| Condition::all(conditions.iter().map(|c| c.effective()[i])))
        .collect();

    Ok(ClassifiedSeries {
        series,
        flag_name: config.flag_name().to_string(),
        conditions,
        flag,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::config::Comparison;
    use crate::rules::variant::RuleVariant;
    use crate::series::normalize::normalize;
    use crate::types::daily::{RawDailyRecord, VAR_RH, VAR_TX, VAR_TX_MAX_ABS};
    use Condition::*;

    fn day(offset: usize) -> String {
        let start = NaiveDate::from_ymd_opt(2023, 7, 1).unwrap();
        (start + chrono::Duration::days(offset as i64))
            .format("%Y-%m-%d")
            .to_string()
    }

    fn series_of(variable: &str, values: &[Option<f64>]) -> DailySeries {
        let raw = values
            .iter()
            .enumerate()
            .map(|(i, v)| RawDailyRecord::new(day(i)).with(variable, *v))
            .collect();
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        normalize(raw, start, end).unwrap()
    }

    fn single_rule(rule: ConditionRule, window: Option<usize>) -> RuleConfig {
        RuleConfig::builder()
            .flag_name("Flag")
            .rules(vec![rule])
            .maybe_window(window)
            .build()
            .unwrap()
    }

    fn rh_values() -> Vec<Option<f64>> {
        vec![Some(70.0), Some(80.0), Some(75.0), Some(78.0)]
    }

    #[test]
    fn test_per_day_threshold() {
        let config = single_rule(ConditionRule::new(VAR_RH, Comparison::GreaterOrEqual, 77.0), Some(1));
        let classified = classify(series_of(VAR_RH, &rh_values()), &config).unwrap();
        assert_eq!(classified.conditions[0].daily, vec![False, True, False, True]);
        assert_eq!(classified.flag, vec![False, True, False, True]);
    }

    #[test]
    fn test_three_day_window() {
        let config = single_rule(ConditionRule::new(VAR_RH, Comparison::GreaterOrEqual, 77.0), Some(3));
        let classified = classify(series_of(VAR_RH, &rh_values()), &config).unwrap();
        let column = &classified.conditions[0];
        assert_eq!(column.daily, vec![False, True, False, True]);
        assert_eq!(column.rolling, Some(vec![Unknown, Unknown, False, False]));
        assert_eq!(classified.flag, vec![Unknown, Unknown, False, False]);
    }

    #[test]
    fn test_missing_reading_is_unknown() {
        let config = single_rule(ConditionRule::new(VAR_TX, Comparison::LessOrEqual, 30.0), None);
        let classified =
            classify(series_of(VAR_TX, &[None, Some(25.0), Some(26.0)]), &config).unwrap();
        assert_eq!(classified.flag, vec![Unknown, True, True]);
        assert_eq!(classified.conditions[0].rolling, None);
    }

    #[test]
    fn test_unknown_never_becomes_false() {
        // A known `False` on one rule and a missing reading on the other is still unknown.
        let raw = vec![
            RawDailyRecord::new(day(0)).with(VAR_RH, Some(10.0)).with(VAR_TX, None),
            RawDailyRecord::new(day(1)).with(VAR_RH, Some(10.0)).with(VAR_TX, Some(25.0)),
        ];
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let series = normalize(raw, start, end).unwrap();
        let config = RuleConfig::builder()
            .flag_name("Flag")
            .rules(vec![
                ConditionRule::new(VAR_RH, Comparison::GreaterOrEqual, 77.0),
                ConditionRule::new(VAR_TX, Comparison::LessOrEqual, 30.0),
            ])
            .build()
            .unwrap();
        let classified = classify(series, &config).unwrap();
        assert_eq!(classified.flag, vec![Unknown, False]);
    }

    #[test]
    fn test_masked_first_reading() {
        let config = RuleConfig::builder()
            .flag_name("Flag")
            .rules(vec![ConditionRule::new(VAR_TX_MAX_ABS, Comparison::GreaterOrEqual, 20.0)])
            .window(2)
            .masked_first_readings(vec![VAR_TX_MAX_ABS.to_string()])
            .build()
            .unwrap();
        let series = series_of(VAR_TX_MAX_ABS, &[Some(25.0), Some(25.0), Some(25.0)]);
        let classified = classify(series, &config).unwrap();
        let column = &classified.conditions[0];
        assert_eq!(column.daily, vec![Unknown, True, True]);
        assert_eq!(column.rolling, Some(vec![Unknown, Unknown, True]));
        // The raw reading itself is left untouched.
        assert_eq!(classified.series.records()[0].value(VAR_TX_MAX_ABS), Some(25.0));
    }

    #[test]
    fn test_missing_variable_is_error() {
        let config = single_rule(ConditionRule::new(VAR_RH, Comparison::Greater, 80.0), None);
        let result = classify(series_of(VAR_TX, &[Some(1.0)]), &config);
        match result {
            Err(ClassifyError::MissingRequiredVariable { variable, flag }) => {
                assert_eq!(variable, VAR_RH);
                assert_eq!(flag, "Flag");
            }
            other => panic!("expected missing variable error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_series_classifies_to_nothing() {
        let config = single_rule(ConditionRule::new(VAR_RH, Comparison::Greater, 80.0), Some(3));
        let start = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2030, 12, 31).unwrap();
        let series = normalize(vec![RawDailyRecord::new(day(0)).with(VAR_RH, Some(90.0))], start, end).unwrap();
        let classified = classify(series, &config).unwrap();
        assert!(classified.is_empty());
        assert!(classified.flag.is_empty());
    }

    #[test]
    fn test_presets_run_through_same_classifier() {
        let raw: Vec<RawDailyRecord> = (0..5)
            .map(|i| {
                RawDailyRecord::new(day(i))
                    .with(VAR_TX_MAX_ABS, Some(28.0))
                    .with(VAR_TX, Some(25.0))
                    .with(VAR_RH, Some(90.0))
            })
            .collect();
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();

        let dt = classify(normalize(raw.clone(), start, end).unwrap(), &RuleVariant::BlastDt.config().unwrap()).unwrap();
        // Window 3 plus the masked first reading: the first full window ends on day 4.
        assert_eq!(dt.flag, vec![Unknown, Unknown, Unknown, True, True]);

        let dt2 = classify(normalize(raw.clone(), start, end).unwrap(), &RuleVariant::BlastDt2.config().unwrap()).unwrap();
        assert_eq!(dt2.flag, vec![Unknown, True, True, True, True]);

        let dt3 = classify(normalize(raw, start, end).unwrap(), &RuleVariant::BlastDt3.config().unwrap()).unwrap();
        assert_eq!(dt3.flag, vec![True; 5]);
        assert!(dt3.conditions.iter().all(|c| c.rolling.is_none()));
    }

    #[test]
    fn test_drop_before_trims_all_columns() {
        let config = single_rule(ConditionRule::new(VAR_RH, Comparison::GreaterOrEqual, 77.0), Some(3));
        let mut classified = classify(series_of(VAR_RH, &rh_values()), &config).unwrap();
        let removed = classified.drop_before(NaiveDate::from_ymd_opt(2023, 7, 3).unwrap());
        assert_eq!(removed, 2);
        assert_eq!(classified.len(), 2);
        assert_eq!(classified.flag, vec![False, False]);
        assert_eq!(classified.conditions[0].daily, vec![False, True]);
        assert_eq!(classified.conditions[0].rolling, Some(vec![False, False]));
        assert_eq!(classified.risk_days(), 0);
    }
}
