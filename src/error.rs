//! Error types for the boleto engine.

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, BoletoError>;

/// Errors that can occur while encoding slips or assembling batch files.
#[derive(Error, Debug)]
pub enum BoletoError {
    /// Failed to open or read the input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON projection error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Required fields missing or malformed; lists every problem found
    #[error("missing or invalid fields: {}", fields.join(", "))]
    Validation { fields: Vec<String> },

    /// Wallet is not one the bank accepts
    #[error("wallet {wallet:?} not accepted by bank {bank_code} (allowed: {})", allowed.join(", "))]
    InvalidWallet {
        wallet: String,
        bank_code: &'static str,
        allowed: Vec<&'static str>,
    },

    /// Document kind outside the closed species table
    #[error("unknown document type: {0}")]
    UnknownDocumentType(String),

    /// Fixed-width write outside the declared record bounds
    #[error("record layout error at columns {start}-{end}: {message}")]
    RecordLayout {
        start: usize,
        end: usize,
        message: String,
    },

    /// Checksum input empty or non-numeric
    #[error("invalid checksum input {0:?}")]
    InvalidInput(String),

    /// A field the bank declares mandatory for batch assembly is absent
    #[error("missing required field: {0}")]
    MissingRequiredField(&'static str),

    /// Our-number check character disagrees with the one derived from the barcode
    #[error("our number {our_number} does not match barcode check character {barcode_check}")]
    InconsistentOurNumber {
        our_number: String,
        barcode_check: char,
    },

    /// Invalid CSV payment row
    #[error("Invalid payment at row {row}: {message}")]
    InvalidRecord { row: usize, message: String },

    /// Missing command line arguments
    #[error("Missing arguments. Usage: boleto-engine <remessa|slips> <payments.csv>")]
    MissingArgument,

    /// Unrecognized subcommand
    #[error("Unknown command {0:?}. Usage: boleto-engine <remessa|slips> <payments.csv>")]
    UnknownCommand(String),
}

impl BoletoError {
    /// Builds a [`BoletoError::Validation`] from a single field name.
    pub fn invalid(field: impl Into<String>) -> Self {
        BoletoError::Validation {
            fields: vec![field.into()],
        }
    }
}
