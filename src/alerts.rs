use crate::models::*;

/// Explicit alert-derivation policy. Kept separate from the aggregate so that
/// appending a result to an [`AnalysisResult`] stays a pure append with no
/// hidden branching.
pub struct AlertPolicy {
    pub recommendation: String,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            recommendation: "Revision clinica inmediata requerida".to_string(),
        }
    }
}

impl AlertPolicy {
    /// At most one critical-level alert per critical result. Non-critical
    /// abnormal results (low/high without crossing a critical threshold)
    /// produce no alert here; lower-severity alerting, if a caller wants it,
    /// is a separate explicit call.
    pub fn evaluate(&self, result: &ParameterResult) -> Option<Alert> {
        if !result.is_critical {
            return None;
        }
        Some(Alert {
            level: AlertLevel::Critical,
            parameter_name: result.parameter_name.clone(),
            value: result.value,
            normal_range: result.applied_range.render(),
            message: format!(
                "Valor critico de {}: {} {}",
                result.parameter_name, result.value, result.unit
            ),
            recommendation: self.recommendation.clone(),
            timestamp: result.timestamp,
        })
    }

    /// Appends the result and whatever alerts it warrants.
    pub fn record(&self, analysis: &mut AnalysisResult, result: ParameterResult) {
        let alert = self.evaluate(&result);
        analysis.push_result(result);
        if let Some(alert) = alert {
            log::warn!(
                "Critical value alert: {} = {}",
                alert.parameter_name,
                alert.value
            );
            analysis.push_alert(alert);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn result_with(state: ParameterState, is_critical: bool) -> ParameterResult {
        ParameterResult {
            parameter_name: "Glucosa".to_string(),
            value: 30.0,
            unit: "mg/dL".to_string(),
            state,
            severity: is_critical.then_some(Severity::Critical),
            applied_range: ReferenceRange::new(70.0, 100.0).unwrap(),
            is_critical,
            interpretation: String::new(),
            flags: Vec::new(),
            notes: Vec::new(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn critical_result_yields_exactly_one_critical_alert() {
        let policy = AlertPolicy::default();
        let mut analysis = analysis();
        policy.record(&mut analysis, result_with(ParameterState::CriticalLow, true));

        assert_eq!(analysis.results().len(), 1);
        assert_eq!(analysis.alerts().len(), 1);
        let alert = &analysis.alerts()[0];
        assert_eq!(alert.level, AlertLevel::Critical);
        assert_eq!(alert.normal_range, "70 - 100");
        assert!(alert.recommendation.contains("inmediata"));
    }

    #[test]
    fn non_critical_abnormal_result_yields_no_alert() {
        let policy = AlertPolicy::default();
        let mut analysis = analysis();
        policy.record(&mut analysis, result_with(ParameterState::High, false));
        policy.record(&mut analysis, result_with(ParameterState::Low, false));

        assert_eq!(analysis.results().len(), 2);
        assert!(analysis.alerts().is_empty());
    }

    #[test]
    fn normal_result_yields_no_alert() {
        let policy = AlertPolicy::default();
        assert!(policy
            .evaluate(&result_with(ParameterState::Normal, false))
            .is_none());
    }

    fn analysis() -> AnalysisResult {
        AnalysisResult::new(
            "AN-TEST",
            Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
            PatientProfile::new("P1", 40, Sex::Female).unwrap(),
            "Quimica Sanguinea",
        )
    }
}
