use crate::{errors::AnalysisError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "masculino")]
    Male,
    #[serde(rename = "femenino")]
    Female,
    #[serde(rename = "otro")]
    Other,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "masculino",
            Sex::Female => "femenino",
            Sex::Other => "otro",
        }
    }
}

impl FromStr for Sex {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "masculino" | "male" | "m" => Ok(Sex::Male),
            "femenino" | "female" | "f" => Ok(Sex::Female),
            "otro" | "other" | "o" => Ok(Sex::Other),
            other => Err(AnalysisError::ParseError(format!("Invalid sex: {other}"))),
        }
    }
}

/// Age band used to filter reference ranges. Always derived from the age in
/// years, never set directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeCategory {
    #[serde(rename = "recien_nacido")]
    Newborn,
    #[serde(rename = "infante")]
    Toddler,
    #[serde(rename = "preescolar")]
    Preschool,
    #[serde(rename = "escolar")]
    SchoolAge,
    #[serde(rename = "adolescente")]
    Adolescent,
    #[serde(rename = "adulto_joven")]
    YoungAdult,
    #[serde(rename = "adulto")]
    Adult,
    #[serde(rename = "adulto_mayor")]
    OlderAdult,
    #[serde(rename = "anciano")]
    Elderly,
}

impl AgeCategory {
    /// Boundaries are half-open with the lower bound inclusive: age 1 is
    /// already a toddler, age 18 already a young adult.
    pub fn from_age(age: u32) -> Self {
        match age {
            0 => AgeCategory::Newborn,
            1..=2 => AgeCategory::Toddler,
            3..=5 => AgeCategory::Preschool,
            6..=11 => AgeCategory::SchoolAge,
            12..=17 => AgeCategory::Adolescent,
            18..=34 => AgeCategory::YoungAdult,
            35..=59 => AgeCategory::Adult,
            60..=74 => AgeCategory::OlderAdult,
            _ => AgeCategory::Elderly,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeCategory::Newborn => "recien_nacido",
            AgeCategory::Toddler => "infante",
            AgeCategory::Preschool => "preescolar",
            AgeCategory::SchoolAge => "escolar",
            AgeCategory::Adolescent => "adolescente",
            AgeCategory::YoungAdult => "adulto_joven",
            AgeCategory::Adult => "adulto",
            AgeCategory::OlderAdult => "adulto_mayor",
            AgeCategory::Elderly => "anciano",
        }
    }
}

impl FromStr for AgeCategory {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "recien_nacido" | "newborn" => Ok(AgeCategory::Newborn),
            "infante" | "toddler" => Ok(AgeCategory::Toddler),
            "preescolar" | "preschool" => Ok(AgeCategory::Preschool),
            "escolar" | "school_age" => Ok(AgeCategory::SchoolAge),
            "adolescente" | "adolescent" => Ok(AgeCategory::Adolescent),
            "adulto_joven" | "young_adult" => Ok(AgeCategory::YoungAdult),
            "adulto" | "adult" => Ok(AgeCategory::Adult),
            "adulto_mayor" | "older_adult" => Ok(AgeCategory::OlderAdult),
            "anciano" | "elderly" => Ok(AgeCategory::Elderly),
            other => Err(AnalysisError::ParseError(format!(
                "Invalid age category: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CkdStage {
    #[serde(rename = "ninguna")]
    None,
    #[serde(rename = "etapa_1")]
    Stage1,
    #[serde(rename = "etapa_2")]
    Stage2,
    #[serde(rename = "etapa_3a")]
    Stage3a,
    #[serde(rename = "etapa_3b")]
    Stage3b,
    #[serde(rename = "etapa_4")]
    Stage4,
    #[serde(rename = "etapa_5")]
    Stage5,
}

impl CkdStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            CkdStage::None => "ninguna",
            CkdStage::Stage1 => "etapa_1",
            CkdStage::Stage2 => "etapa_2",
            CkdStage::Stage3a => "etapa_3a",
            CkdStage::Stage3b => "etapa_3b",
            CkdStage::Stage4 => "etapa_4",
            CkdStage::Stage5 => "etapa_5",
        }
    }
}

impl FromStr for CkdStage {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ninguna" | "none" => Ok(CkdStage::None),
            "etapa_1" | "1" => Ok(CkdStage::Stage1),
            "etapa_2" | "2" => Ok(CkdStage::Stage2),
            "etapa_3a" | "3a" => Ok(CkdStage::Stage3a),
            "etapa_3b" | "3b" => Ok(CkdStage::Stage3b),
            "etapa_4" | "4" => Ok(CkdStage::Stage4),
            "etapa_5" | "5" => Ok(CkdStage::Stage5),
            other => Err(AnalysisError::ParseError(format!(
                "Invalid CKD stage: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterState {
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "bajo")]
    Low,
    #[serde(rename = "alto")]
    High,
    #[serde(rename = "critico_bajo")]
    CriticalLow,
    #[serde(rename = "critico_alto")]
    CriticalHigh,
}

impl ParameterState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterState::Normal => "normal",
            ParameterState::Low => "bajo",
            ParameterState::High => "alto",
            ParameterState::CriticalLow => "critico_bajo",
            ParameterState::CriticalHigh => "critico_alto",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "leve")]
    Mild,
    #[serde(rename = "moderado")]
    Moderate,
    #[serde(rename = "severo")]
    Severe,
    #[serde(rename = "critico")]
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Mild => "leve",
            Severity::Moderate => "moderado",
            Severity::Severe => "severo",
            Severity::Critical => "critico",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertLevel {
    #[serde(rename = "bajo")]
    Low,
    #[serde(rename = "medio")]
    Medium,
    #[serde(rename = "alto")]
    High,
    #[serde(rename = "critico")]
    Critical,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Low => "bajo",
            AlertLevel::Medium => "medio",
            AlertLevel::High => "alto",
            AlertLevel::Critical => "critico",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceType {
    #[serde(rename = "clinico")]
    Clinical,
    #[serde(rename = "laboratorial")]
    Laboratory,
}

impl FromStr for ReferenceType {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "clinico" | "clinical" => Ok(ReferenceType::Clinical),
            "laboratorial" | "laboratory" => Ok(ReferenceType::Laboratory),
            other => Err(AnalysisError::ParseError(format!(
                "Invalid reference type: {other}"
            ))),
        }
    }
}

/// Demographic facts for one patient. Constructed once per encounter and
/// read-only afterwards. The age category is recomputed from the age in the
/// constructor and cannot be set independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientProfile {
    pub id: String,
    pub age: u32,
    pub sex: Sex,
    age_category: AgeCategory,
    pub ckd_present: bool,
    pub ckd_stage: CkdStage,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub comorbidities: Vec<String>,
    pub medications: Vec<String>,
}

impl PatientProfile {
    pub fn new(id: impl Into<String>, age: i64, sex: Sex) -> Result<Self> {
        if !(0..=150).contains(&age) {
            return Err(AnalysisError::InvalidProfile(format!(
                "Age {age} outside valid range [0, 150]"
            )));
        }
        let age = age as u32;
        Ok(Self {
            id: id.into(),
            age,
            sex,
            age_category: AgeCategory::from_age(age),
            ckd_present: false,
            ckd_stage: CkdStage::None,
            weight_kg: None,
            height_cm: None,
            comorbidities: Vec::new(),
            medications: Vec::new(),
        })
    }

    pub fn with_ckd_stage(mut self, stage: CkdStage) -> Self {
        self.ckd_present = stage != CkdStage::None;
        self.ckd_stage = stage;
        self
    }

    pub fn with_body_measurements(mut self, weight_kg: Option<f64>, height_cm: Option<f64>) -> Self {
        self.weight_kg = weight_kg;
        self.height_cm = height_cm;
        self
    }

    pub fn with_comorbidities(mut self, comorbidities: Vec<String>) -> Self {
        self.comorbidities = comorbidities;
        self
    }

    pub fn with_medications(mut self, medications: Vec<String>) -> Self {
        self.medications = medications;
        self
    }

    pub fn age_category(&self) -> AgeCategory {
        self.age_category
    }

    /// Body mass index rounded to one decimal. `None` when weight or height is
    /// missing, or height is zero.
    pub fn bmi(&self) -> Option<f64> {
        let weight = self.weight_kg?;
        let height_m = self.height_cm? / 100.0;
        if height_m <= 0.0 {
            return None;
        }
        Some(((weight / (height_m * height_m)) * 10.0).round() / 10.0)
    }

    /// Canonical key/value projection for downstream reporting.
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "id": self.id,
            "edad": self.age,
            "sexo": self.sex.as_str(),
            "categoria": self.age_category.as_str(),
            "peso_kg": self.weight_kg,
            "talla_cm": self.height_cm,
            "imc": self.bmi(),
            "erc_presente": self.ckd_present,
            "etapa_erc": self.ckd_stage.as_str(),
            "comorbilidades": self.comorbidities,
            "medicamentos": self.medications,
        })
    }
}

/// One admissible reference interval for a parameter, tagged with the
/// demographic filters it applies to. The interval is closed: values equal to
/// either endpoint are normal. Critical bounds, when present, are expected to
/// lie outside `[minimum, maximum]`; this is the catalog author's
/// responsibility and is not enforced here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceRange {
    pub minimum: f64,
    pub maximum: f64,
    pub critical_minimum: Option<f64>,
    pub critical_maximum: Option<f64>,
    pub age_category: Option<AgeCategory>,
    pub sex: Option<Sex>,
    pub ckd_stage: Option<CkdStage>,
    pub source: Option<String>,
    pub reference_type: Option<ReferenceType>,
}

impl ReferenceRange {
    pub fn new(minimum: f64, maximum: f64) -> Result<Self> {
        if minimum > maximum {
            return Err(AnalysisError::InvalidRange(format!(
                "minimum {minimum} greater than maximum {maximum}"
            )));
        }
        Ok(Self {
            minimum,
            maximum,
            critical_minimum: None,
            critical_maximum: None,
            age_category: None,
            sex: None,
            ckd_stage: None,
            source: None,
            reference_type: None,
        })
    }

    pub fn with_critical_bounds(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.critical_minimum = minimum;
        self.critical_maximum = maximum;
        self
    }

    pub fn for_age_category(mut self, category: AgeCategory) -> Self {
        self.age_category = Some(category);
        self
    }

    pub fn for_sex(mut self, sex: Sex) -> Self {
        self.sex = Some(sex);
        self
    }

    pub fn for_ckd_stage(mut self, stage: CkdStage) -> Self {
        self.ckd_stage = Some(stage);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>, kind: ReferenceType) -> Self {
        self.source = Some(source.into());
        self.reference_type = Some(kind);
        self
    }

    /// Human-readable rendering used in alerts and reports.
    pub fn render(&self) -> String {
        format!("{} - {}", self.minimum, self.maximum)
    }
}

/// Outcome of a biological-plausibility check. Advisory: an implausible value
/// is still classified, but the result carries a flag the caller must check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlausibilityCheck {
    pub plausible: bool,
    pub message: Option<String>,
}

/// Catalog entry for one measurable analyte.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub aliases: Vec<String>,
    pub standard_unit: String,
    pub candidate_ranges: Vec<ReferenceRange>,
    pub biological_bounds: Option<(f64, f64)>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, standard_unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            standard_unit: standard_unit.into(),
            candidate_ranges: Vec::new(),
            biological_bounds: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_range(mut self, range: ReferenceRange) -> Self {
        self.candidate_ranges.push(range);
        self
    }

    pub fn with_biological_bounds(mut self, min: f64, max: f64) -> Self {
        self.biological_bounds = Some((min, max));
        self
    }

    /// Bidirectional substring containment against the alias list,
    /// case-insensitive: `"hb"` matches alias `"Hb"`, and so does
    /// `"Hemoglobin Hb test"`.
    pub fn matches_alias(&self, text: &str) -> bool {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return false;
        }
        self.aliases.iter().any(|alias| {
            let alias = alias.to_lowercase();
            alias.contains(&needle) || needle.contains(&alias)
        })
    }

    /// Plausibility is independent of clinical classification: it only says
    /// whether the number is biologically possible at all.
    pub fn check_plausibility(&self, value: f64) -> PlausibilityCheck {
        match self.biological_bounds {
            Some((min, max)) if value < min || value > max => PlausibilityCheck {
                plausible: false,
                message: Some(format!(
                    "Valor {} de {} fuera de los limites biologicos [{}, {}]",
                    value, self.name, min, max
                )),
            },
            _ => PlausibilityCheck {
                plausible: true,
                message: None,
            },
        }
    }
}

/// Named, versioned collection of parameters with unique names. Duplicate
/// insertion is a no-op; the first entry wins. Insertion order is the
/// tie-break order for alias resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Examination {
    pub name: String,
    parameters: Vec<Parameter>,
}

impl Examination {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
        }
    }

    pub fn add_parameter(&mut self, parameter: Parameter) {
        let exists = self
            .parameters
            .iter()
            .any(|p| p.name.eq_ignore_ascii_case(&parameter.name));
        if exists {
            log::debug!("Duplicate parameter {} ignored", parameter.name);
            return;
        }
        self.parameters.push(parameter);
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Resolves a raw parameter name to its catalog entry. Exact
    /// case-insensitive name match first; alias containment second, first
    /// catalog entry in insertion order wins.
    pub fn resolve(&self, text: &str) -> Option<&Parameter> {
        let needle = text.trim();
        if needle.is_empty() {
            return None;
        }
        self.parameters
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(needle))
            .or_else(|| self.parameters.iter().find(|p| p.matches_alias(needle)))
    }
}

/// Immutable classification outcome for one measured value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterResult {
    pub parameter_name: String,
    pub value: f64,
    pub unit: String,
    pub state: ParameterState,
    pub severity: Option<Severity>,
    pub applied_range: ReferenceRange,
    pub is_critical: bool,
    pub interpretation: String,
    pub flags: Vec<String>,
    pub notes: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl ParameterResult {
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "parametro": self.parameter_name,
            "valor": self.value,
            "unidad": self.unit,
            "rango": self.applied_range.render(),
            "estado": self.state.as_str(),
            "severidad": self.severity.map(|s| s.as_str()),
            "interpretacion": self.interpretation,
            "critico": self.is_critical,
            "flags": self.flags,
            "notas": self.notes,
        })
    }
}

/// Derived notification for a critical finding. Never hand-built in the normal
/// flow; see [`crate::alerts::AlertPolicy`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub parameter_name: String,
    pub value: f64,
    pub normal_range: String,
    pub message: String,
    pub recommendation: String,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "nivel": self.level.as_str(),
            "parametro": self.parameter_name,
            "valor": self.value,
            "rango": self.normal_range,
            "mensaje": self.message,
            "recomendacion": self.recommendation,
            "timestamp": self.timestamp.to_rfc3339(),
        })
    }
}

/// Severity thresholds as fractions of the reference-interval width. Tunable
/// policy rather than fixed constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityPolicy {
    /// Deviations up to this fraction of the interval width are mild.
    pub mild_max: f64,
    /// Deviations up to this fraction are moderate; beyond it, severe.
    pub moderate_max: f64,
}

impl Default for SeverityPolicy {
    fn default() -> Self {
        Self {
            mild_max: 0.25,
            moderate_max: 0.75,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub severity_policy: SeverityPolicy,
    pub output_path: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            severity_policy: SeverityPolicy::default(),
            output_path: "./analysis_results".to_string(),
        }
    }
}

/// Aggregate root for one encounter. Exclusively owned by its creator;
/// mutation is append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub patient_profile: PatientProfile,
    pub examination_name: String,
    results: Vec<ParameterResult>,
    alerts: Vec<Alert>,
    patterns: Vec<String>,
    hypotheses: Vec<String>,
    recommendations: Vec<String>,
    calculations: HashMap<String, f64>,
}

impl AnalysisResult {
    pub fn new(
        id: impl Into<String>,
        timestamp: DateTime<Utc>,
        patient_profile: PatientProfile,
        examination_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp,
            patient_profile,
            examination_name: examination_name.into(),
            results: Vec::new(),
            alerts: Vec::new(),
            patterns: Vec::new(),
            hypotheses: Vec::new(),
            recommendations: Vec::new(),
            calculations: HashMap::new(),
        }
    }

    /// Pure append. Alert derivation is a separate, explicit policy step;
    /// see [`crate::alerts::AlertPolicy::record`].
    pub fn push_result(&mut self, result: ParameterResult) {
        self.results.push(result);
    }

    pub fn push_alert(&mut self, alert: Alert) {
        self.alerts.push(alert);
    }

    pub fn add_pattern(&mut self, pattern: impl Into<String>) {
        self.patterns.push(pattern.into());
    }

    pub fn add_hypothesis(&mut self, hypothesis: impl Into<String>) {
        self.hypotheses.push(hypothesis.into());
    }

    pub fn add_recommendation(&mut self, recommendation: impl Into<String>) {
        self.recommendations.push(recommendation.into());
    }

    pub fn set_calculation(&mut self, name: impl Into<String>, value: f64) {
        self.calculations.insert(name.into(), value);
    }

    pub fn results(&self) -> &[ParameterResult] {
        &self.results
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn hypotheses(&self) -> &[String] {
        &self.hypotheses
    }

    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }

    pub fn calculations(&self) -> &HashMap<String, f64> {
        &self.calculations
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "id_analisis": self.id,
            "timestamp": self.timestamp.to_rfc3339(),
            "perfil": self.patient_profile.to_json(),
            "examen": self.examination_name,
            "resultados": self.results.iter().map(|r| r.to_json()).collect::<Vec<_>>(),
            "patrones_detectados": self.patterns,
            "hipotesis": self.hypotheses,
            "alertas": self.alerts.iter().map(|a| a.to_json()).collect::<Vec<_>>(),
            "recomendaciones": self.recommendations,
            "calculos": self.calculations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_category_boundaries_are_lower_inclusive() {
        let cases = vec![
            (0, AgeCategory::Newborn),
            (1, AgeCategory::Toddler),
            (2, AgeCategory::Toddler),
            (3, AgeCategory::Preschool),
            (5, AgeCategory::Preschool),
            (6, AgeCategory::SchoolAge),
            (11, AgeCategory::SchoolAge),
            (12, AgeCategory::Adolescent),
            (17, AgeCategory::Adolescent),
            (18, AgeCategory::YoungAdult),
            (34, AgeCategory::YoungAdult),
            (35, AgeCategory::Adult),
            (59, AgeCategory::Adult),
            (60, AgeCategory::OlderAdult),
            (74, AgeCategory::OlderAdult),
            (75, AgeCategory::Elderly),
            (150, AgeCategory::Elderly),
        ];
        for (age, expected) in cases {
            assert_eq!(AgeCategory::from_age(age), expected, "age {age}");
        }
    }

    #[test]
    fn profile_construction_validates_age() {
        for age in [0, 1, 75, 150] {
            assert!(PatientProfile::new("P1", age, Sex::Female).is_ok());
        }
        assert!(PatientProfile::new("P1", -1, Sex::Female).is_err());
        assert!(PatientProfile::new("P1", 151, Sex::Female).is_err());
    }

    #[test]
    fn profile_age_category_tracks_age() {
        let profile = PatientProfile::new("P1", 18, Sex::Male).unwrap();
        assert_eq!(profile.age_category(), AgeCategory::YoungAdult);
    }

    #[test]
    fn bmi_rounds_to_one_decimal() {
        let profile = PatientProfile::new("P1", 40, Sex::Male)
            .unwrap()
            .with_body_measurements(Some(70.0), Some(175.0));
        assert_eq!(profile.bmi(), Some(22.9));
    }

    #[test]
    fn bmi_is_none_when_inputs_missing_or_zero() {
        let base = PatientProfile::new("P1", 40, Sex::Male).unwrap();
        assert_eq!(base.clone().bmi(), None);
        assert_eq!(
            base.clone()
                .with_body_measurements(Some(70.0), None)
                .bmi(),
            None
        );
        assert_eq!(
            base.clone()
                .with_body_measurements(None, Some(175.0))
                .bmi(),
            None
        );
        assert_eq!(
            base.with_body_measurements(Some(70.0), Some(0.0)).bmi(),
            None
        );
    }

    #[test]
    fn ckd_stage_none_clears_presence() {
        let profile = PatientProfile::new("P1", 60, Sex::Male)
            .unwrap()
            .with_ckd_stage(CkdStage::Stage3a);
        assert!(profile.ckd_present);
        let profile = profile.with_ckd_stage(CkdStage::None);
        assert!(!profile.ckd_present);
    }

    #[test]
    fn reference_range_rejects_inverted_bounds() {
        assert!(ReferenceRange::new(100.0, 70.0).is_err());
        assert!(ReferenceRange::new(70.0, 70.0).is_ok());
    }

    #[test]
    fn plausibility_check_is_advisory() {
        let parameter = Parameter::new("Glucosa", "mg/dL").with_biological_bounds(10.0, 1000.0);
        assert!(parameter.check_plausibility(80.0).plausible);
        let check = parameter.check_plausibility(5000.0);
        assert!(!check.plausible);
        assert!(check.message.unwrap().contains("Glucosa"));
    }

    #[test]
    fn examination_ignores_duplicate_names() {
        let mut exam = Examination::new("Quimica Sanguinea");
        exam.add_parameter(Parameter::new("Glucosa", "mg/dL").with_alias("glu"));
        exam.add_parameter(Parameter::new("glucosa", "mmol/L"));
        assert_eq!(exam.parameters().len(), 1);
        assert_eq!(exam.parameters()[0].standard_unit, "mg/dL");
    }

    #[test]
    fn alias_resolution_is_bidirectional_and_case_insensitive() {
        let mut exam = Examination::new("Hematologia");
        exam.add_parameter(Parameter::new("Hemoglobina", "g/dL").with_alias("Hb"));
        for lookup in ["hb", "HB", "Hemoglobin Hb test"] {
            let resolved = exam.resolve(lookup);
            assert_eq!(
                resolved.map(|p| p.name.as_str()),
                Some("Hemoglobina"),
                "lookup {lookup}"
            );
        }
        assert!(exam.resolve("ferritina").is_none());
        assert!(exam.resolve("").is_none());
    }

    #[test]
    fn exact_name_match_beats_alias_containment() {
        let mut exam = Examination::new("Quimica");
        exam.add_parameter(Parameter::new("Sodio Urinario", "mEq/L").with_alias("sodio"));
        exam.add_parameter(Parameter::new("Sodio", "mEq/L").with_alias("Na"));
        assert_eq!(exam.resolve("sodio").unwrap().name, "Sodio");
    }

    #[test]
    fn profile_projection_uses_canonical_field_names() {
        let profile = PatientProfile::new("P-7", 62, Sex::Female)
            .unwrap()
            .with_ckd_stage(CkdStage::Stage3b)
            .with_body_measurements(Some(64.0), Some(160.0))
            .with_comorbidities(vec!["diabetes".to_string()]);
        let value = profile.to_json();
        assert_eq!(value["edad"], 62);
        assert_eq!(value["sexo"], "femenino");
        assert_eq!(value["categoria"], "adulto_mayor");
        assert_eq!(value["erc_presente"], true);
        assert_eq!(value["etapa_erc"], "etapa_3b");
        assert_eq!(value["imc"], 25.0);
        assert_eq!(value["comorbilidades"][0], "diabetes");
    }
}
