use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty status code, blank column name, etc.).
    ConfigValidation(String),
    /// Missing required column in input data.
    MissingColumn { table: String, column: String },
    /// A monetary cell holds text that is not a number.
    InvalidNumber { table: String, column: String, row: usize, value: String },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumn { table, column } => {
                write!(f, "table '{table}': missing column '{column}'")
            }
            Self::InvalidNumber { table, column, row, value } => {
                write!(f, "table '{table}', row {row}, column '{column}': cannot parse number '{value}'")
            }
        }
    }
}

impl std::error::Error for PipelineError {}
