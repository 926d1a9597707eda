use lakeimport_core_types::{RunId, TraceId};
use thiserror::Error;

use crate::model::DiffSide;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that callers can match on without
/// parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Input/Manifest
    InvalidInput,
    /// Manifest bytes are not valid JSON or a field has the wrong shape
    InvalidManifest,
    /// A required manifest field is absent
    MissingField,
    /// The manifest names an inventory file format no reader is registered for
    UnsupportedFormat,
    NotFound,

    // Row decoding
    /// A partition row failed to decode (e.g. missing/empty key)
    Decode,
    /// A partition file's rows disagree with the row count its metadata announced
    TruncatedPartition,
    /// A key sorted strictly before its predecessor
    OrderingViolation,
    /// More than one effective record for the same key
    DuplicateKey,

    // Composition
    /// One side of a diff failed; the source error carries the cause
    InventorySourceFailed,

    // Integration/IO
    Io,
    Serialization,
    Persistence,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidManifest => "ERR_INVALID_MANIFEST",
            ExErrorKind::MissingField => "ERR_MISSING_FIELD",
            ExErrorKind::UnsupportedFormat => "ERR_UNSUPPORTED_FORMAT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::Decode => "ERR_DECODE",
            ExErrorKind::TruncatedPartition => "ERR_TRUNCATED_PARTITION",
            ExErrorKind::OrderingViolation => "ERR_ORDERING_VIOLATION",
            ExErrorKind::DuplicateKey => "ERR_DUPLICATE_KEY",
            ExErrorKind::InventorySourceFailed => "ERR_INVENTORY_SOURCE_FAILED",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification plus the context needed to locate the failure:
/// the partition file and row for decode errors, the object key for catalog
/// errors, the diff side for composition errors.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    key: Option<String>,
    file: Option<String>,
    row: Option<u64>,
    side: Option<DiffSide>,
    run_id: Option<RunId>,
    trace_id: Option<TraceId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            key: None,
            file: None,
            row: None,
            side: None,
            run_id: None,
            trace_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add object key context
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Add partition file context
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Add 0-based row index within the partition file
    pub fn with_row(mut self, row: u64) -> Self {
        self.row = Some(row);
        self
    }

    /// Add which side of a diff failed
    pub fn with_side(mut self, side: DiffSide) -> Self {
        self.side = Some(side);
        self
    }

    pub fn with_run_id(mut self, run_id: RunId) -> Self {
        self.run_id = Some(run_id);
        self
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Fill in the file context only if nothing more specific was recorded
    pub fn or_file(mut self, file: impl Into<String>) -> Self {
        if self.file.is_none() {
            self.file = Some(file.into());
        }
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn row(&self) -> Option<u64> {
        self.row
    }

    pub fn side(&self) -> Option<DiffSide> {
        self.side
    }

    pub fn run_id(&self) -> Option<&RunId> {
        self.run_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the wrapped cause, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }

    /// Walk the source chain down to the innermost error
    pub fn root_cause(&self) -> &ExError {
        let mut current = self;
        while let Some(next) = current.source.as_deref() {
            current = next;
        }
        current
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(side) = self.side {
            write!(f, " (side: {})", side)?;
        }
        if let Some(file) = &self.file {
            write!(f, " (file: {})", file)?;
        }
        if let Some(row) = self.row {
            write!(f, " (row: {})", row)?;
        }
        if let Some(key) = &self.key {
            write!(f, " (key: {})", key)?;
        }
        if let Some(source) = &self.source {
            write!(f, ": {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Row-level failures raised while reading inventory data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InventoryError {
    /// A row has no key, or an empty one
    #[error("Row {row} in {file} has an empty key")]
    EmptyKey { file: String, row: u64 },

    /// A row could not be decoded at all
    #[error("Row {row} in {file} is malformed: {reason}")]
    MalformedRow {
        file: String,
        row: u64,
        reason: String,
    },

    /// The file ended before the announced row count was reached
    #[error("Partition {file} ended after {read} of {expected} rows")]
    TruncatedPartition {
        file: String,
        expected: u64,
        read: u64,
    },

    /// The file holds rows past the announced row count
    #[error("Partition {file} holds more than the {expected} rows it announces")]
    ExcessRows { file: String, expected: u64 },

    /// Key order went backwards
    #[error("Key {key} sorts before previous key {previous}")]
    KeyOrderViolation { previous: String, key: String },

    /// Two effective records share a key
    #[error("Key {key} has more than one effective record")]
    DuplicateKey { key: String },

    /// No reader for the manifest's file format
    #[error("Unsupported inventory format: {format}")]
    UnsupportedFormat { format: String },

    /// An object-store URL could not be parsed
    #[error("Invalid object URL: {url}")]
    InvalidUrl { url: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl From<InventoryError> for ExError {
    fn from(err: InventoryError) -> Self {
        let message = err.to_string();
        match err {
            InventoryError::EmptyKey { file, row } => ExError::new(ExErrorKind::Decode)
                .with_file(file)
                .with_row(row)
                .with_message(message),

            InventoryError::MalformedRow { file, row, .. } => ExError::new(ExErrorKind::Decode)
                .with_file(file)
                .with_row(row)
                .with_message(message),

            InventoryError::TruncatedPartition { file, .. } => {
                ExError::new(ExErrorKind::TruncatedPartition)
                    .with_file(file)
                    .with_message(message)
            }

            InventoryError::ExcessRows { file, expected } => {
                ExError::new(ExErrorKind::TruncatedPartition)
                    .with_file(file)
                    .with_row(expected)
                    .with_message(message)
            }

            InventoryError::KeyOrderViolation { key, .. } => {
                ExError::new(ExErrorKind::OrderingViolation)
                    .with_key(key)
                    .with_message(message)
            }

            InventoryError::DuplicateKey { key } => ExError::new(ExErrorKind::DuplicateKey)
                .with_key(key)
                .with_message(message),

            InventoryError::UnsupportedFormat { .. } => {
                ExError::new(ExErrorKind::UnsupportedFormat).with_message(message)
            }

            InventoryError::InvalidUrl { .. } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(message)
            }

            InventoryError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

impl From<serde_json::Error> for InventoryError {
    fn from(err: serde_json::Error) -> Self {
        InventoryError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_carries_file_and_row() {
        let err: ExError = InventoryError::EmptyKey {
            file: "inv/data/part-0.jsonl".to_string(),
            row: 3,
        }
        .into();

        assert_eq!(err.kind(), ExErrorKind::Decode);
        assert_eq!(err.file(), Some("inv/data/part-0.jsonl"));
        assert_eq!(err.row(), Some(3));
        assert!(err.to_string().contains("part-0.jsonl"));
    }

    #[test]
    fn test_or_file_keeps_existing_file() {
        let err = ExError::new(ExErrorKind::Decode)
            .with_file("a.jsonl")
            .or_file("b.jsonl");
        assert_eq!(err.file(), Some("a.jsonl"));

        let err = ExError::new(ExErrorKind::Io).or_file("b.jsonl");
        assert_eq!(err.file(), Some("b.jsonl"));
    }

    #[test]
    fn test_root_cause_walks_chain() {
        let inner = ExError::new(ExErrorKind::Decode).with_row(7);
        let outer = ExError::new(ExErrorKind::InventorySourceFailed)
            .with_side(DiffSide::Left)
            .with_source(inner);

        assert_eq!(outer.root_cause().kind(), ExErrorKind::Decode);
        assert_eq!(outer.root_cause().row(), Some(7));
        assert!(std::error::Error::source(&outer).is_some());
    }

    #[test]
    fn test_display_names_side_and_cause() {
        let inner = ExError::new(ExErrorKind::Io)
            .with_file("part-1.jsonl")
            .with_message("connection reset");
        let outer = ExError::new(ExErrorKind::InventorySourceFailed)
            .with_op("diff_next")
            .with_side(DiffSide::Right)
            .with_message("failed to get value from right inventory")
            .with_source(inner);

        let text = outer.to_string();
        assert!(text.starts_with("[ERR_INVENTORY_SOURCE_FAILED]"));
        assert!(text.contains("side: right"));
        assert!(text.contains("part-1.jsonl"));
        assert!(text.contains("connection reset"));
    }
}
