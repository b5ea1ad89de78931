// Error types for the order analysis pipeline.
//
// Only missing columns are configuration errors. Values that fail to parse
// never surface here; they become `None` on the record instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// A required column is absent from the dataset header.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Neither the order-date column nor any known alternate spelling exists.
    #[error("No 'Order Date' column or variant found in the dataset (tried: {})", .tried.join(", "))]
    DateColumnNotFound { tried: Vec<String> },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Plotters errors are generic over the backend, so they are carried as text.
    #[error("Failed to render chart '{path}': {reason}")]
    Chart { path: String, reason: String },
}

impl AnalysisError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::DateColumnNotFound { .. } => "DATE_COLUMN_NOT_FOUND",
            Self::Csv(_) => "CSV_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Workbook(_) => "WORKBOOK_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Chart { .. } => "CHART_ERROR",
        }
    }

    /// True for errors caused by the shape of the input rather than by IO.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ColumnNotFound(_) | Self::DateColumnNotFound { .. }
        )
    }

    pub(crate) fn chart(path: &str, err: impl std::fmt::Display) -> Self {
        Self::Chart {
            path: path.to_string(),
            reason: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
