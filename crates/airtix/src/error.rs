//! Error types for airtix.
//!
//! This module defines all error types used throughout the airtix crate,
//! from booking rule violations to persistence and configuration failures.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::storage::codec::{DecodeError, EncodeError};

/// Which record collection an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// The flight registry.
    Flights,
    /// The ticket ledger.
    Tickets,
    /// The reservation code counter.
    Counter,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flights => write!(f, "flights"),
            Self::Tickets => write!(f, "tickets"),
            Self::Counter => write!(f, "reservation counter"),
        }
    }
}

/// The main error type for airtix operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Booking Errors ===
    /// A flight with this identifier already exists.
    #[error("flight '{id}' already exists")]
    DuplicateIdentifier {
        /// The conflicting flight identifier.
        id: String,
    },

    /// A record collection reached its configured limit.
    #[error("{collection} limit of {limit} reached")]
    CapacityExceeded {
        /// The collection that is full.
        collection: Collection,
        /// The configured limit.
        limit: usize,
    },

    /// A field value was rejected.
    #[error("invalid {field}: {message}")]
    InvalidInput {
        /// Name of the offending field.
        field: &'static str,
        /// Why it was rejected.
        message: String,
    },

    /// No flight has this identifier.
    #[error("flight '{id}' not found")]
    FlightNotFound {
        /// The unknown flight identifier.
        id: String,
    },

    /// The flight has no seats left.
    #[error("flight '{id}' is fully booked")]
    FullyBooked {
        /// The full flight's identifier.
        id: String,
    },

    /// No ticket has this reservation code.
    #[error("PNR {code} not found")]
    NotFound {
        /// The unknown reservation code.
        code: u64,
    },

    // === Persistence Errors ===
    /// A data file could not be read or decoded.
    #[error("failed to read {collection} from {path}: {message}")]
    PersistenceRead {
        /// The collection being loaded.
        collection: Collection,
        /// Path to the data file.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    /// At least one collection failed to save.
    #[error("data save partially failed ({succeeded}/2 saved; failed: {})", join_collections(.failed))]
    PersistencePartialWrite {
        /// Collections that were not written.
        failed: Vec<Collection>,
        /// Number of collections written successfully.
        succeeded: usize,
    },

    /// A data file could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A collection could not be encoded.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

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

    // === Console Errors ===
    /// Standard input was closed while a prompt was waiting.
    #[error("input closed")]
    InputClosed,

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

    // === Serialization Errors ===
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for airtix operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

fn join_collections(collections: &[Collection]) -> String {
    collections
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            message: message.into(),
        }
    }

    /// Create a persistence read error.
    #[must_use]
    pub fn persistence_read(
        collection: Collection,
        path: impl Into<PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        Self::PersistenceRead {
            collection,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if this error is a rejected field value.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }

    /// Check if this error means a lookup by reservation code failed.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error came from the persistence layer.
    #[must_use]
    pub fn is_persistence_error(&self) -> bool {
        matches!(
            self,
            Self::PersistenceRead { .. }
                | Self::PersistencePartialWrite { .. }
                | Self::Decode(_)
                | Self::Encode(_)
                | Self::Io(_)
                | Self::DirectoryCreate { .. }
        )
    }
}
