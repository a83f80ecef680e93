use crate::{errors::AnalysisError, models::Sex, Result};

/// Standalone clinical formula calculators. Pure functions over primitive
/// inputs; none reads or mutates the analysis model.
pub struct ClinicalCalculator;

impl ClinicalCalculator {
    /// Estimated glomerular filtration rate from serum creatinine (mg/dL),
    /// age in years and sex:
    /// `141 * min(Scr/k, 1)^-0.411 * max(Scr/k, 1)^-1.209 * 0.993^age`
    /// with `k = 0.9` for males and `0.7` otherwise. Returns the continuous
    /// value in mL/min/1.73m2; staging is up to the caller.
    pub fn egfr(age: u32, sex: Sex, serum_creatinine: f64) -> Result<f64> {
        if serum_creatinine <= 0.0 {
            return Err(AnalysisError::CalculationError(
                "Serum creatinine must be positive for eGFR".to_string(),
            ));
        }
        let k = match sex {
            Sex::Male => 0.9,
            Sex::Female | Sex::Other => 0.7,
        };
        let ratio = serum_creatinine / k;
        let egfr = 141.0
            * ratio.min(1.0).powf(-0.411)
            * ratio.max(1.0).powf(-1.209)
            * 0.993_f64.powi(age as i32);
        Ok(egfr)
    }

    /// Anion gap in mEq/L: `Na - (Cl + HCO3)`.
    pub fn anion_gap(sodium: f64, chloride: f64, bicarbonate: f64) -> f64 {
        sodium - (chloride + bicarbonate)
    }

    /// Estimated serum osmolarity in mOsm/L: `2*Na + glucose/18 + BUN/2.8`.
    pub fn osmolarity(sodium: f64, glucose: f64, bun: f64) -> f64 {
        2.0 * sodium + glucose / 18.0 + bun / 2.8
    }

    /// Sodium corrected for hyperglycemia:
    /// `Na + ((glucose - 100) / 100) * 1.6`.
    pub fn corrected_sodium(measured_sodium: f64, glucose: f64) -> f64 {
        measured_sodium + (glucose - 100.0) / 100.0 * 1.6
    }
}
