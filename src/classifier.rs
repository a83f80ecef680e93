use crate::models::*;
use chrono::{DateTime, Utc};

/// Maps a measured value to a clinical state and severity against a resolved
/// reference range.
pub struct ValueClassifier;

impl ValueClassifier {
    /// Classification order: critical override first, then the closed
    /// reference interval (a value equal to either endpoint is normal).
    pub fn classify(
        parameter: &Parameter,
        range: &ReferenceRange,
        value: f64,
        unit: Option<&str>,
        policy: &SeverityPolicy,
        flags: Vec<String>,
        timestamp: DateTime<Utc>,
    ) -> ParameterResult {
        let (state, is_critical) = Self::classify_state(range, value);
        let severity = Self::derive_severity(range, value, state, policy);
        let interpretation = Self::interpretation(&parameter.name, range, state, severity);

        ParameterResult {
            parameter_name: parameter.name.clone(),
            value,
            unit: unit.unwrap_or(&parameter.standard_unit).to_string(),
            state,
            severity,
            applied_range: range.clone(),
            is_critical,
            interpretation,
            flags,
            notes: Vec::new(),
            timestamp,
        }
    }

    fn classify_state(range: &ReferenceRange, value: f64) -> (ParameterState, bool) {
        if let Some(critical_min) = range.critical_minimum {
            if value < critical_min {
                return (ParameterState::CriticalLow, true);
            }
        }
        if let Some(critical_max) = range.critical_maximum {
            if value > critical_max {
                return (ParameterState::CriticalHigh, true);
            }
        }
        if value < range.minimum {
            (ParameterState::Low, false)
        } else if value > range.maximum {
            (ParameterState::High, false)
        } else {
            (ParameterState::Normal, false)
        }
    }

    /// Non-critical severity comes from how far outside the interval the value
    /// lies, relative to the interval width. The thresholds live in
    /// [`SeverityPolicy`] rather than being hardcoded.
    fn derive_severity(
        range: &ReferenceRange,
        value: f64,
        state: ParameterState,
        policy: &SeverityPolicy,
    ) -> Option<Severity> {
        match state {
            ParameterState::Normal => None,
            ParameterState::CriticalLow | ParameterState::CriticalHigh => {
                Some(Severity::Critical)
            }
            ParameterState::Low | ParameterState::High => {
                let width = range.maximum - range.minimum;
                let deviation = if value < range.minimum {
                    range.minimum - value
                } else {
                    value - range.maximum
                };
                // Zero-width intervals give no scale to judge against.
                let ratio = if width > 0.0 {
                    deviation / width
                } else {
                    f64::INFINITY
                };
                if ratio <= policy.mild_max {
                    Some(Severity::Mild)
                } else if ratio <= policy.moderate_max {
                    Some(Severity::Moderate)
                } else {
                    Some(Severity::Severe)
                }
            }
        }
    }

    fn interpretation(
        name: &str,
        range: &ReferenceRange,
        state: ParameterState,
        severity: Option<Severity>,
    ) -> String {
        let rendered = range.render();
        match state {
            ParameterState::Normal => {
                format!("{name} dentro del rango de referencia ({rendered})")
            }
            ParameterState::Low => format!(
                "{name} por debajo del rango de referencia ({rendered}), severidad {}",
                severity.map(|s| s.as_str()).unwrap_or("indeterminada")
            ),
            ParameterState::High => format!(
                "{name} por encima del rango de referencia ({rendered}), severidad {}",
                severity.map(|s| s.as_str()).unwrap_or("indeterminada")
            ),
            ParameterState::CriticalLow => format!(
                "{name} en valor criticamente bajo, fuera del umbral critico (rango {rendered})"
            ),
            ParameterState::CriticalHigh => format!(
                "{name} en valor criticamente alto, fuera del umbral critico (rango {rendered})"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    fn glucose() -> (Parameter, ReferenceRange) {
        let range = ReferenceRange::new(70.0, 100.0)
            .unwrap()
            .with_critical_bounds(Some(40.0), Some(400.0));
        let parameter = Parameter::new("Glucosa", "mg/dL").with_range(range.clone());
        (parameter, range)
    }

    fn classify(value: f64) -> ParameterResult {
        let (parameter, range) = glucose();
        ValueClassifier::classify(
            &parameter,
            &range,
            value,
            None,
            &SeverityPolicy::default(),
            Vec::new(),
            ts(),
        )
    }

    #[test]
    fn interval_endpoints_are_normal() {
        assert_eq!(classify(70.0).state, ParameterState::Normal);
        assert_eq!(classify(100.0).state, ParameterState::Normal);
        assert_eq!(classify(85.0).state, ParameterState::Normal);
        assert!(classify(85.0).severity.is_none());
    }

    #[test]
    fn critical_override_below_lower_bound() {
        let result = classify(30.0);
        assert_eq!(result.state, ParameterState::CriticalLow);
        assert!(result.is_critical);
        assert_eq!(result.severity, Some(Severity::Critical));
    }

    #[test]
    fn high_but_below_critical_threshold_is_not_critical() {
        let result = classify(250.0);
        assert_eq!(result.state, ParameterState::High);
        assert!(!result.is_critical);
        assert_eq!(result.severity, Some(Severity::Severe));
    }

    #[test]
    fn severity_scales_with_deviation_ratio() {
        // Interval width 30; deviations of 3, 15 and 30 give ratios 0.1, 0.5, 1.0.
        assert_eq!(classify(103.0).severity, Some(Severity::Mild));
        assert_eq!(classify(115.0).severity, Some(Severity::Moderate));
        assert_eq!(classify(130.0).severity, Some(Severity::Severe));
        assert_eq!(classify(67.0).severity, Some(Severity::Mild));
    }

    #[test]
    fn severity_thresholds_are_configurable() {
        let (parameter, range) = glucose();
        let strict = SeverityPolicy {
            mild_max: 0.05,
            moderate_max: 0.2,
        };
        let result = ValueClassifier::classify(
            &parameter,
            &range,
            103.0,
            None,
            &strict,
            Vec::new(),
            ts(),
        );
        assert_eq!(result.severity, Some(Severity::Moderate));
    }

    #[test]
    fn value_at_critical_bound_is_not_critical() {
        // The critical region is strictly beyond the bound.
        let result = classify(40.0);
        assert_eq!(result.state, ParameterState::Low);
        assert!(!result.is_critical);
    }

    #[test]
    fn no_critical_bounds_means_no_critical_state() {
        let range = ReferenceRange::new(135.0, 145.0).unwrap();
        let parameter = Parameter::new("Sodio", "mEq/L");
        let result = ValueClassifier::classify(
            &parameter,
            &range,
            90.0,
            None,
            &SeverityPolicy::default(),
            Vec::new(),
            ts(),
        );
        assert_eq!(result.state, ParameterState::Low);
        assert!(!result.is_critical);
    }

    #[test]
    fn unit_falls_back_to_standard_unit() {
        let result = classify(85.0);
        assert_eq!(result.unit, "mg/dL");
        let (parameter, range) = glucose();
        let result = ValueClassifier::classify(
            &parameter,
            &range,
            85.0,
            Some("mmol/L"),
            &SeverityPolicy::default(),
            Vec::new(),
            ts(),
        );
        assert_eq!(result.unit, "mmol/L");
    }

    #[test]
    fn projection_uses_canonical_field_names() {
        let result = classify(30.0);
        let value = result.to_json();
        assert_eq!(value["parametro"], "Glucosa");
        assert_eq!(value["estado"], "critico_bajo");
        assert_eq!(value["severidad"], "critico");
        assert_eq!(value["critico"], true);
        assert_eq!(value["rango"], "70 - 100");
    }
}
