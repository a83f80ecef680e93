use crate::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a small but realistic reference catalog and a matching measurement
/// file, so the tool can be exercised without real patient data.
pub struct ExampleDataGenerator;

impl ExampleDataGenerator {
    pub fn generate_reference_catalog<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let mut file = File::create(output_path)?;

        writeln!(
            file,
            "PARAMETER,ALIASES,UNIT,MIN,MAX,CRITICAL_MIN,CRITICAL_MAX,AGE_CATEGORY,SEX,CKD_STAGE,BIO_MIN,BIO_MAX,SOURCE,REF_TYPE"
        )?;
        // Row order matters for equally specific candidates: the resolver
        // breaks ties on file position, so condition-specific rows go first.
        writeln!(
            file,
            "Glucosa,glucose;glu,mg/dL,70,100,40,400,,,,10,1500,ADA 2023,clinico"
        )?;
        writeln!(
            file,
            "Sodio,Na;sodium,mEq/L,135,145,120,160,,,,80,200,Harrison 21e,clinico"
        )?;
        writeln!(
            file,
            "Potasio,K;potassium,mEq/L,3.5,5.0,2.5,6.5,,,,1,12,Harrison 21e,clinico"
        )?;
        writeln!(file, "Cloro,Cl;chloride,mEq/L,98,107,,,,,,60,140,,")?;
        writeln!(file, "Bicarbonato,HCO3;bicarbonate,mEq/L,22,29,,,,,,5,60,,")?;
        writeln!(
            file,
            "Nitrogeno Ureico,BUN;urea nitrogen,mg/dL,7,20,,,,,,1,300,,"
        )?;
        writeln!(file, "Hemoglobina,Hb;hgb,g/dL,13,17,7,22,,masculino,,3,25,,")?;
        writeln!(file, "Hemoglobina,Hb;hgb,g/dL,12,16,7,22,,femenino,,3,25,,")?;
        writeln!(
            file,
            "Hemoglobina,Hb;hgb,g/dL,11,14,7,22,infante,,,3,25,,"
        )?;
        writeln!(
            file,
            "Creatinina,Cr;creatinine,mg/dL,0.8,2.5,,,,,etapa_3a,0.1,30,,"
        )?;
        writeln!(
            file,
            "Creatinina,Cr;creatinine,mg/dL,1.0,4.0,,,,,etapa_4,0.1,30,,"
        )?;
        writeln!(file, "Creatinina,Cr;creatinine,mg/dL,0.7,1.3,,,,masculino,,0.1,30,,")?;
        writeln!(file, "Creatinina,Cr;creatinine,mg/dL,0.6,1.1,,,,femenino,,0.1,30,,")?;

        log::info!("Generated example reference catalog");
        Ok(())
    }

    /// Seeded so repeated runs produce the same file. Most values land inside
    /// the adult reference intervals; glucose is drawn wide enough to
    /// occasionally cross the abnormal and critical thresholds.
    pub fn generate_measurements<P: AsRef<Path>>(output_path: P, seed: u64) -> Result<()> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut file = File::create(output_path)?;

        writeln!(file, "PARAMETER,VALUE,UNIT")?;
        writeln!(file, "Glucosa,{:.0},mg/dL", rng.gen_range(30.0..450.0))?;
        writeln!(file, "Na,{:.0},mEq/L", rng.gen_range(128.0..152.0))?;
        writeln!(file, "K,{:.1},mEq/L", rng.gen_range(3.0..5.8))?;
        writeln!(file, "Cl,{:.0},mEq/L", rng.gen_range(95.0..112.0))?;
        writeln!(file, "HCO3,{:.0},mEq/L", rng.gen_range(18.0..32.0))?;
        writeln!(file, "BUN,{:.0},mg/dL", rng.gen_range(5.0..40.0))?;
        writeln!(file, "Hb,{:.1},g/dL", rng.gen_range(9.0..18.0))?;
        writeln!(file, "Creatinina,{:.2},mg/dL", rng.gen_range(0.5..3.0))?;

        log::info!("Generated example measurements");
        Ok(())
    }
}
