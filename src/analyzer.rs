use crate::alerts::AlertPolicy;
use crate::calculators::ClinicalCalculator;
use crate::classifier::ValueClassifier;
use crate::clock::{Clock, IdGenerator};
use crate::resolver::RangeResolver;
use crate::{errors::AnalysisError, models::*, Result};
use itertools::Itertools;
use rayon::prelude::*;

/// One raw measured value as delivered by the report-extraction layer. The
/// parameter name is free text and resolved against the examination catalog.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub parameter: String,
    pub value: f64,
    pub unit: Option<String>,
}

/// Per-encounter orchestration: resolve each measurement's parameter and
/// reference range, classify, aggregate, derive auxiliary calculations.
pub struct LabAnalyzer;

impl LabAnalyzer {
    /// Analyzes one encounter. Unknown parameters and missing reference
    /// ranges are recoverable: the measurement is skipped and reported in the
    /// returned warnings rather than failing the encounter. Implausible
    /// values are still classified but carry a flag.
    pub fn analyze_encounter(
        profile: &PatientProfile,
        examination: &Examination,
        measurements: &[Measurement],
        config: &AnalysisConfig,
        clock: &dyn Clock,
        ids: &dyn IdGenerator,
    ) -> Result<(AnalysisResult, Vec<String>)> {
        if measurements.is_empty() {
            return Err(AnalysisError::InsufficientData(
                "No measurements available for analysis".to_string(),
            ));
        }

        let timestamp = clock.now();

        // Classification is pure per measurement, so fan out; the indexed
        // collect keeps measurement order.
        let outcomes: Vec<_> = measurements
            .par_iter()
            .map(|m| Self::classify_measurement(profile, examination, m, &config.severity_policy, timestamp))
            .collect();

        let mut analysis = AnalysisResult::new(
            ids.next_id(),
            timestamp,
            profile.clone(),
            examination.name.clone(),
        );
        let policy = AlertPolicy::default();
        let mut warnings = Vec::new();

        for (result, mut measurement_warnings) in outcomes {
            warnings.append(&mut measurement_warnings);
            if let Some(result) = result {
                policy.record(&mut analysis, result);
            }
        }

        let critical_names: Vec<String> = analysis
            .results()
            .iter()
            .filter(|r| r.is_critical)
            .map(|r| r.parameter_name.clone())
            .unique()
            .collect();
        if critical_names.len() >= 2 {
            let pattern = format!(
                "Multiples valores criticos: {}",
                critical_names.iter().join(", ")
            );
            analysis.add_pattern(pattern);
        }

        for (name, value) in Self::derive_calculations(profile, examination, measurements) {
            analysis.set_calculation(name, value);
        }

        log::info!(
            "Encounter {} analyzed: {} results, {} alerts, {} warnings",
            analysis.id,
            analysis.results().len(),
            analysis.alerts().len(),
            warnings.len()
        );

        Ok((analysis, warnings))
    }

    fn classify_measurement(
        profile: &PatientProfile,
        examination: &Examination,
        measurement: &Measurement,
        policy: &SeverityPolicy,
        timestamp: chrono::DateTime<chrono::Utc>,
    ) -> (Option<ParameterResult>, Vec<String>) {
        let mut warnings = Vec::new();

        let Some(parameter) = examination.resolve(&measurement.parameter) else {
            let warning = format!("Parametro no reconocido: {}", measurement.parameter);
            log::warn!("{warning}");
            warnings.push(warning);
            return (None, warnings);
        };

        let mut flags = Vec::new();
        let plausibility = parameter.check_plausibility(measurement.value);
        if !plausibility.plausible {
            let message = plausibility
                .message
                .unwrap_or_else(|| format!("Valor implausible de {}", parameter.name));
            log::warn!("{message}");
            warnings.push(message.clone());
            flags.push(message);
        }

        let range = match RangeResolver::resolve(parameter, profile) {
            Ok(range) => range,
            Err(e) => {
                let warning = format!("Sin rango de referencia aplicable: {e}");
                log::warn!("{warning}");
                warnings.push(warning);
                return (None, warnings);
            }
        };

        let result = ValueClassifier::classify(
            parameter,
            range,
            measurement.value,
            measurement.unit.as_deref(),
            policy,
            flags,
            timestamp,
        );
        (Some(result), warnings)
    }

    /// Derives the auxiliary figures the calculators cover whenever the
    /// required analytes are present in the measurement set.
    fn derive_calculations(
        profile: &PatientProfile,
        examination: &Examination,
        measurements: &[Measurement],
    ) -> Vec<(String, f64)> {
        let sodium = Self::analyte_value(examination, measurements, "sodio");
        let chloride = Self::analyte_value(examination, measurements, "cloro");
        let bicarbonate = Self::analyte_value(examination, measurements, "bicarbonato");
        let glucose = Self::analyte_value(examination, measurements, "glucosa");
        let bun = Self::analyte_value(examination, measurements, "nitrogeno ureico");
        let creatinine = Self::analyte_value(examination, measurements, "creatinina");

        let mut calculations = Vec::new();

        if let (Some(na), Some(cl), Some(hco3)) = (sodium, chloride, bicarbonate) {
            calculations.push((
                "anion_gap".to_string(),
                ClinicalCalculator::anion_gap(na, cl, hco3),
            ));
        }
        if let (Some(na), Some(glu), Some(bun)) = (sodium, glucose, bun) {
            calculations.push((
                "osmolaridad".to_string(),
                ClinicalCalculator::osmolarity(na, glu, bun),
            ));
        }
        if let (Some(na), Some(glu)) = (sodium, glucose) {
            calculations.push((
                "sodio_corregido".to_string(),
                ClinicalCalculator::corrected_sodium(na, glu),
            ));
        }
        if let Some(scr) = creatinine {
            match ClinicalCalculator::egfr(profile.age, profile.sex, scr) {
                Ok(egfr) => calculations.push(("tfg_estimada".to_string(), egfr)),
                Err(e) => log::warn!("eGFR not derived: {e}"),
            }
        }

        calculations
    }

    /// Finds the measured value for a canonical analyte, going through catalog
    /// resolution on both sides so aliases work.
    fn analyte_value(
        examination: &Examination,
        measurements: &[Measurement],
        canonical: &str,
    ) -> Option<f64> {
        let target = examination.resolve(canonical)?;
        measurements.iter().find_map(|m| {
            let parameter = examination.resolve(&m.parameter)?;
            (parameter.name == target.name).then_some(m.value)
        })
    }
}
