use crate::{models::*, Result};
use itertools::Itertools;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

pub struct OutputManager;

impl OutputManager {
    pub fn save_results<P: AsRef<Path>>(
        analysis: &AnalysisResult,
        warnings: &[String],
        output_path: P,
    ) -> Result<()> {
        let output_dir = output_path.as_ref();
        fs::create_dir_all(output_dir)?;

        Self::save_json(analysis, output_dir)?;
        Self::save_results_csv(analysis, output_dir)?;
        Self::save_alert_log(analysis, output_dir)?;
        Self::save_report(analysis, warnings, output_dir)?;

        log::info!("Results saved to: {}", output_dir.display());
        Ok(())
    }

    /// Canonical projection, the shape downstream reporting consumes.
    fn save_json(analysis: &AnalysisResult, output_dir: &Path) -> Result<()> {
        let file_path = output_dir.join("analysis.json");
        let json_string = serde_json::to_string_pretty(&analysis.to_json())?;
        fs::write(file_path, json_string)?;
        Ok(())
    }

    fn save_results_csv(analysis: &AnalysisResult, output_dir: &Path) -> Result<()> {
        let file_path = output_dir.join("results.csv");
        let mut file = File::create(file_path)?;

        writeln!(file, "PARAMETER,VALUE,UNIT,RANGE,STATE,SEVERITY,CRITICAL,FLAGS")?;
        for result in analysis.results() {
            writeln!(
                file,
                "{},{},{},{},{},{},{},{}",
                result.parameter_name,
                result.value,
                result.unit,
                result.applied_range.render(),
                result.state.as_str(),
                result.severity.map_or("NA", |s| s.as_str()),
                if result.is_critical { 1 } else { 0 },
                result.flags.iter().join("; "),
            )?;
        }

        Ok(())
    }

    fn save_alert_log(analysis: &AnalysisResult, output_dir: &Path) -> Result<()> {
        if analysis.alerts().is_empty() {
            return Ok(());
        }

        let file_path = output_dir.join("alerts.log");
        let mut file = File::create(file_path)?;

        writeln!(file, "CRITICAL VALUE ALERTS")?;
        writeln!(file, "=====================")?;
        writeln!(file)?;
        for alert in analysis.alerts() {
            writeln!(file, "[{}] {}", alert.level.as_str().to_uppercase(), alert.message)?;
            writeln!(file, "  Rango normal: {}", alert.normal_range)?;
            writeln!(file, "  Recomendacion: {}", alert.recommendation)?;
            writeln!(file, "  Timestamp: {}", alert.timestamp.to_rfc3339())?;
            writeln!(file, "---")?;
        }

        Ok(())
    }

    fn save_report(
        analysis: &AnalysisResult,
        warnings: &[String],
        output_dir: &Path,
    ) -> Result<()> {
        let file_path = output_dir.join("analysis_report.txt");
        let mut file = File::create(file_path)?;

        writeln!(file, "CLINICAL LABORATORY ANALYSIS REPORT")?;
        writeln!(file, "===================================")?;
        writeln!(file)?;
        writeln!(file, "Analysis ID: {}", analysis.id)?;
        writeln!(file, "Timestamp: {}", analysis.timestamp.to_rfc3339())?;
        writeln!(file, "Examination: {}", analysis.examination_name)?;
        writeln!(file)?;

        let profile = &analysis.patient_profile;
        writeln!(file, "Patient:")?;
        writeln!(file, "- Id: {}", profile.id)?;
        writeln!(
            file,
            "- Age: {} ({})",
            profile.age,
            profile.age_category().as_str()
        )?;
        writeln!(file, "- Sex: {}", profile.sex.as_str())?;
        if let Some(bmi) = profile.bmi() {
            writeln!(file, "- BMI: {bmi}")?;
        }
        if profile.ckd_present {
            writeln!(file, "- CKD stage: {}", profile.ckd_stage.as_str())?;
        }
        writeln!(file)?;

        let abnormal = analysis
            .results()
            .iter()
            .filter(|r| r.state != ParameterState::Normal)
            .count();
        writeln!(file, "Results: {} total, {} abnormal", analysis.results().len(), abnormal)?;
        for result in analysis.results() {
            writeln!(
                file,
                "- {}: {} {} [{}] {}",
                result.parameter_name,
                result.value,
                result.unit,
                result.state.as_str(),
                result.interpretation
            )?;
        }
        writeln!(file)?;

        if !analysis.alerts().is_empty() {
            writeln!(file, "Alerts: {} (see alerts.log)", analysis.alerts().len())?;
        }
        if !analysis.patterns().is_empty() {
            writeln!(file, "Patterns:")?;
            for pattern in analysis.patterns() {
                writeln!(file, "- {pattern}")?;
            }
        }
        if !analysis.calculations().is_empty() {
            writeln!(file, "Derived calculations:")?;
            for (name, value) in analysis.calculations().iter().sorted_by_key(|(k, _)| k.clone()) {
                writeln!(file, "- {name}: {value:.2}")?;
            }
        }
        if !warnings.is_empty() {
            writeln!(file)?;
            writeln!(file, "Warnings:")?;
            for warning in warnings {
                writeln!(file, "- {warning}")?;
            }
        }

        Ok(())
    }
}
