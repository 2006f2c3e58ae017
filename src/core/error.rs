use thiserror::Error;

/// Errors that can occur while reading, building or writing a Buchungsstapel.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DatevError {
    /// The declared format version has no schema in this crate.
    #[error("unsupported format version {0} (only version 9 is supported)")]
    UnsupportedVersion(u32),

    /// Header identity, category or column layout disagrees with the schema.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Tokenization failed, e.g. an unterminated quoted field.
    #[error("malformed row at line {line}: {message}")]
    MalformedRow {
        /// Physical line (1-based) where the offending row starts.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// Text cannot be represented in (or decoded from) Windows-1252.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Malformed or out-of-range number.
    #[error("invalid number in field '{field}': '{value}' ({message})")]
    InvalidNumber {
        /// Schema label of the field.
        field: &'static str,
        /// Offending text or value.
        value: String,
        /// What is wrong with it.
        message: String,
    },

    /// Malformed or impossible date.
    #[error("invalid date in field '{field}': '{value}'")]
    InvalidDate {
        /// Schema label of the field.
        field: &'static str,
        /// Offending text or value.
        value: String,
    },

    /// Value is not one of the allowed literals.
    #[error("invalid value in field '{field}': '{value}' (allowed: {})", .allowed.join(", "))]
    InvalidEnum {
        /// Schema label of the field.
        field: &'static str,
        /// Offending text.
        value: String,
        /// Accepted literals.
        allowed: &'static [&'static str],
    },

    /// Value exceeds the field's length bound.
    #[error("value in field '{field}' is too long: '{value}' (max {max})")]
    FieldTooLong {
        /// Schema label of the field.
        field: &'static str,
        /// Offending value.
        value: String,
        /// Maximum number of characters (digits for numbers).
        max: usize,
    },

    /// A required field is empty.
    #[error("required field '{field}' is missing")]
    MissingField {
        /// Schema label of the field.
        field: &'static str,
    },

    /// More records than a single batch may hold.
    #[error("a Buchungsstapel holds at most {max} records")]
    TooManyRecords {
        /// Record limit.
        max: usize,
    },

    /// Target file name does not follow the `EXTF_<name>.csv` convention.
    #[error("invalid file name '{0}': expected EXTF_<name>.csv")]
    InvalidFileName(String),

    /// File access failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record-level failure with its position in the batch.
    #[error("record {index}{}: {source}", .line.map(|l| format!(" (line {l})")).unwrap_or_default())]
    Record {
        /// Zero-based position of the record in the batch.
        index: usize,
        /// Physical line of the record when it came from a file.
        line: Option<usize>,
        /// Underlying failure.
        #[source]
        source: Box<DatevError>,
    },
}

impl DatevError {
    /// Wrap `self` with the position of the record it belongs to.
    pub fn at_record(self, index: usize, line: Option<usize>) -> Self {
        Self::Record {
            index,
            line,
            source: Box::new(self),
        }
    }

    /// The underlying error with all positional context removed.
    pub fn root(&self) -> &DatevError {
        match self {
            Self::Record { source, .. } => source.root(),
            other => other,
        }
    }

    /// Schema label of the field that failed, if the failure is field-level.
    pub fn field(&self) -> Option<&'static str> {
        match self.root() {
            Self::InvalidNumber { field, .. }
            | Self::InvalidDate { field, .. }
            | Self::InvalidEnum { field, .. }
            | Self::FieldTooLong { field, .. }
            | Self::MissingField { field } => Some(*field),
            _ => None,
        }
    }
}

/// A single non-fatal finding with field path and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Path to the finding (e.g. "records[3].Belegdatum").
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ValidationError {
    /// Create a finding.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}
