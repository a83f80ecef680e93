use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Invalid patient profile: {0}")]
    InvalidProfile(String),

    #[error("Invalid reference range: {0}")]
    InvalidRange(String),

    #[error("No applicable reference range for parameter: {0}")]
    NoReferenceRange(String),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Insufficient data for analysis: {0}")]
    InsufficientData(String),

    #[error("Data parsing error: {0}")]
    ParseError(String),

    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}
