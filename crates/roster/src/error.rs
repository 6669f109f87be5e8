//! Error types for roster.
//!
//! This module defines all error types used throughout the roster crate,
//! providing detailed context for debugging and user-friendly error messages.
//!
//! Malformed persisted records and dangling references are not errors: the
//! codec and the resolve phase recover from those on their own. Only store
//! boundary violations and persistence failures surface here.

use std::path::PathBuf;
use thiserror::Error;

use crate::record::{Kind, RecordKey};

/// The main error type for roster operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Store Errors ===
    /// A record with the same key already exists in its collection.
    #[error("{kind} '{key}' already exists")]
    DuplicateKey {
        /// Collection the record was added to.
        kind: Kind,
        /// The colliding key.
        key: RecordKey,
    },

    /// No record with the given key exists in its collection.
    #[error("{kind} '{key}' not found")]
    NotFound {
        /// Collection that was searched.
        kind: Kind,
        /// The missing key.
        key: RecordKey,
    },

    /// A deletion was requested without a reason.
    #[error("a non-empty reason is required to delete a record")]
    EmptyReason,

    /// The key collides with a codec sentinel.
    #[error("'{key}' is reserved and cannot name a {kind}")]
    ReservedKey {
        /// Collection the record was added to.
        kind: Kind,
        /// The reserved key.
        key: RecordKey,
    },

    /// A field value cannot be written without corrupting the text format.
    #[error("{kind} field '{field}' contains text that cannot be stored")]
    UnencodableField {
        /// Kind of record (or child record) owning the field.
        kind: &'static str,
        /// Name of the offending field.
        field: &'static str,
    },

    // === Persistence Errors ===
    /// A persisted line failed to decode while strict loading was enabled.
    #[error("malformed {kind} record at line {line}")]
    MalformedRecord {
        /// Collection being loaded.
        kind: Kind,
        /// One-based line number in the persisted text.
        line: usize,
    },

    /// Writing the universe to the persistence medium failed.
    #[error("failed to save {kind} records: {message}")]
    Save {
        /// Collection being written.
        kind: Kind,
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// A specialized Result type for roster operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a not-found error.
    #[must_use]
    pub fn not_found(kind: Kind, key: impl Into<RecordKey>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    /// Create a save error for the given collection.
    #[must_use]
    pub fn save(kind: Kind, message: impl Into<String>) -> Self {
        Self::Save {
            kind,
            message: message.into(),
        }
    }

    /// Check if this error means the target record does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error is a rejected add because the key is taken.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_key_display() {
        let err = Error::DuplicateKey {
            kind: Kind::Kerbal,
            key: RecordKey::from("Val"),
        };
        assert_eq!(err.to_string(), "kerbal 'Val' already exists");
        assert!(err.is_duplicate());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_display() {
        let err = Error::not_found(Kind::Vessel, 7u32);
        assert_eq!(err.to_string(), "vessel '7' not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_empty_reason_display() {
        assert!(Error::EmptyReason.to_string().contains("reason"));
    }

    #[test]
    fn test_unencodable_field_display() {
        let err = Error::UnencodableField {
            kind: "mission",
            field: "description",
        };
        let msg = err.to_string();
        assert!(msg.contains("mission"));
        assert!(msg.contains("description"));
    }

    #[test]
    fn test_malformed_record_display() {
        let err = Error::MalformedRecord {
            kind: Kind::Design,
            line: 3,
        };
        assert_eq!(err.to_string(), "malformed vessel design record at line 3");
    }

    #[test]
    fn test_save_error_display() {
        let err = Error::save(Kind::Mission, "disk full");
        let msg = err.to_string();
        assert!(msg.contains("mission"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }


    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "data_dir is empty".to_string(),
        };
        assert!(err.to_string().contains("data_dir is empty"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
