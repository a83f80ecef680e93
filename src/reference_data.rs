use crate::analyzer::Measurement;
use crate::{errors::AnalysisError, models::*, Result};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Loads the reference-value catalog and raw measurement files. One catalog
/// row describes one candidate reference range; rows sharing a parameter name
/// accumulate on that parameter in file order, which is also the resolver's
/// tie-break order.
pub struct ReferenceDataLoader;

impl ReferenceDataLoader {
    pub fn load_examination<P: AsRef<Path>>(path: P, exam_name: &str) -> Result<Examination> {
        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

        let columns = Self::column_index(&mut reader)?;

        let mut order: Vec<String> = Vec::new();
        let mut parameters: HashMap<String, Parameter> = HashMap::new();

        for record in reader.records() {
            let record = record?;
            let name = Self::required_str(&columns, &record, "PARAMETER")?.to_string();

            let range = Self::parse_range(&columns, &record)?;

            if let Some(parameter) = parameters.get_mut(&name) {
                parameter.candidate_ranges.push(range);
                continue;
            }

            let mut parameter = Parameter::new(
                name.clone(),
                Self::required_str(&columns, &record, "UNIT")?,
            );
            if let Some(aliases) = Self::optional_str(&columns, &record, "ALIASES") {
                for alias in aliases.split(';') {
                    let alias = alias.trim();
                    if !alias.is_empty() {
                        parameter = parameter.with_alias(alias);
                    }
                }
            }
            let bio_min = Self::optional_float(&columns, &record, "BIO_MIN");
            let bio_max = Self::optional_float(&columns, &record, "BIO_MAX");
            if let (Some(min), Some(max)) = (bio_min, bio_max) {
                parameter = parameter.with_biological_bounds(min, max);
            }
            parameter.candidate_ranges.push(range);

            order.push(name.clone());
            parameters.insert(name, parameter);
        }

        let mut examination = Examination::new(exam_name);
        for name in order {
            if let Some(parameter) = parameters.remove(&name) {
                examination.add_parameter(parameter);
            }
        }

        log::info!(
            "Loaded reference catalog '{}' with {} parameters",
            examination.name,
            examination.parameters().len()
        );
        Ok(examination)
    }

    pub fn load_measurements<P: AsRef<Path>>(path: P) -> Result<Vec<Measurement>> {
        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

        let columns = Self::column_index(&mut reader)?;

        let mut measurements = Vec::new();
        for record in reader.records() {
            let record = record?;
            measurements.push(Measurement {
                parameter: Self::required_str(&columns, &record, "PARAMETER")?.to_string(),
                value: Self::required_float(&columns, &record, "VALUE")?,
                unit: Self::optional_str(&columns, &record, "UNIT").map(str::to_string),
            });
        }
        Ok(measurements)
    }

    fn parse_range(
        columns: &HashMap<String, usize>,
        record: &csv::StringRecord,
    ) -> Result<ReferenceRange> {
        let mut range = ReferenceRange::new(
            Self::required_float(columns, record, "MIN")?,
            Self::required_float(columns, record, "MAX")?,
        )?
        .with_critical_bounds(
            Self::optional_float(columns, record, "CRITICAL_MIN"),
            Self::optional_float(columns, record, "CRITICAL_MAX"),
        );

        if let Some(raw) = Self::optional_str(columns, record, "AGE_CATEGORY") {
            range = range.for_age_category(raw.parse()?);
        }
        if let Some(raw) = Self::optional_str(columns, record, "SEX") {
            range = range.for_sex(raw.parse()?);
        }
        if let Some(raw) = Self::optional_str(columns, record, "CKD_STAGE") {
            range = range.for_ckd_stage(raw.parse()?);
        }
        if let Some(source) = Self::optional_str(columns, record, "SOURCE") {
            let kind = Self::optional_str(columns, record, "REF_TYPE")
                .map(|s| s.parse::<ReferenceType>())
                .transpose()?
                .unwrap_or(ReferenceType::Laboratory);
            range = range.with_source(source, kind);
        }

        Ok(range)
    }

    fn column_index<R: std::io::Read>(
        reader: &mut csv::Reader<R>,
    ) -> Result<HashMap<String, usize>> {
        let headers = reader.headers()?;
        Ok(headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_uppercase(), i))
            .collect())
    }

    fn optional_str<'a>(
        columns: &HashMap<String, usize>,
        record: &'a csv::StringRecord,
        key: &str,
    ) -> Option<&'a str> {
        let value = record.get(*columns.get(key)?)?.trim();
        (!value.is_empty()).then_some(value)
    }

    fn required_str<'a>(
        columns: &HashMap<String, usize>,
        record: &'a csv::StringRecord,
        key: &str,
    ) -> Result<&'a str> {
        Self::optional_str(columns, record, key)
            .ok_or_else(|| AnalysisError::ParseError(format!("Missing column: {key}")))
    }

    fn required_float(
        columns: &HashMap<String, usize>,
        record: &csv::StringRecord,
        key: &str,
    ) -> Result<f64> {
        Self::required_str(columns, record, key)?
            .parse::<f64>()
            .map_err(|_| AnalysisError::ParseError(format!("Invalid float value for {key}")))
    }

    fn optional_float(
        columns: &HashMap<String, usize>,
        record: &csv::StringRecord,
        key: &str,
    ) -> Option<f64> {
        Self::optional_str(columns, record, key)?.parse::<f64>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_catalog(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("references.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(
            file,
            "PARAMETER,ALIASES,UNIT,MIN,MAX,CRITICAL_MIN,CRITICAL_MAX,AGE_CATEGORY,SEX,CKD_STAGE,BIO_MIN,BIO_MAX,SOURCE,REF_TYPE"
        )
        .unwrap();
        writeln!(
            file,
            "Glucosa,glucose;glu,mg/dL,70,100,40,400,,,,10,1500,ADA 2023,clinico"
        )
        .unwrap();
        writeln!(file, "Hemoglobina,Hb;hgb,g/dL,13,17,,,,masculino,,,,,").unwrap();
        writeln!(file, "Hemoglobina,Hb;hgb,g/dL,12,16,,,,femenino,,,,,").unwrap();
        writeln!(file, "Creatinina,Cr,mg/dL,0.8,2.0,,,,,etapa_3a,,,,").unwrap();
        writeln!(file, "Creatinina,Cr,mg/dL,0.6,1.2,,,,,,,,,").unwrap();
        path
    }

    #[test]
    fn catalog_rows_group_by_parameter_in_file_order() {
        let dir = TempDir::new().unwrap();
        let exam =
            ReferenceDataLoader::load_examination(write_catalog(&dir), "Quimica").unwrap();

        assert_eq!(exam.parameters().len(), 3);
        assert_eq!(exam.parameters()[0].name, "Glucosa");

        let hemoglobin = exam.resolve("Hb").unwrap();
        assert_eq!(hemoglobin.candidate_ranges.len(), 2);
        assert_eq!(hemoglobin.candidate_ranges[0].sex, Some(Sex::Male));

        let glucose = exam.resolve("glucosa").unwrap();
        assert_eq!(glucose.candidate_ranges[0].critical_maximum, Some(400.0));
        assert_eq!(glucose.biological_bounds, Some((10.0, 1500.0)));
        assert_eq!(
            glucose.candidate_ranges[0].reference_type,
            Some(ReferenceType::Clinical)
        );

        let creatinine = exam.resolve("Creatinina").unwrap();
        assert_eq!(
            creatinine.candidate_ranges[0].ckd_stage,
            Some(CkdStage::Stage3a)
        );
        assert_eq!(creatinine.candidate_ranges[1].ckd_stage, None);
    }

    #[test]
    fn measurements_file_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("measurements.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "PARAMETER,VALUE,UNIT").unwrap();
        writeln!(file, "Glucosa,85.5,mg/dL").unwrap();
        writeln!(file, "Hb,14.2,").unwrap();
        drop(file);

        let measurements = ReferenceDataLoader::load_measurements(&path).unwrap();
        assert_eq!(measurements.len(), 2);
        assert_eq!(measurements[0].parameter, "Glucosa");
        assert_eq!(measurements[0].value, 85.5);
        assert_eq!(measurements[0].unit.as_deref(), Some("mg/dL"));
        assert_eq!(measurements[1].unit, None);
    }

    #[test]
    fn invalid_bounds_fail_loading() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "PARAMETER,ALIASES,UNIT,MIN,MAX").unwrap();
        writeln!(file, "Glucosa,,mg/dL,100,70").unwrap();
        drop(file);

        assert!(ReferenceDataLoader::load_examination(&path, "Quimica").is_err());
    }
}
