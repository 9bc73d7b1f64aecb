//! Error types for the EVNEX client

use thiserror::Error;

/// Core error type for EVNEX operations
///
/// The variants split into two groups. Transient conditions (`Http`,
/// `Transport`, `Timeout`) may succeed if the request is sent again.
/// Everything else is a programming, credential or schema problem that a
/// retry cannot fix.
#[derive(Error, Debug)]
pub enum EvnexError {
    /// The API answered 401; the access token is missing, expired or revoked
    #[error("Not authorized to access {endpoint}")]
    NotAuthorized { endpoint: String },

    /// The identity provider rejected the credential exchange
    #[error("Authentication failed ({code}): {message}")]
    Authentication { code: String, message: String },

    /// The payload was valid JSON but did not match the expected schema
    #[error("Schema validation failed for {context}: {message}")]
    SchemaValidation {
        context: String,
        message: String,
        /// The fragment of the payload that failed to decode
        payload: serde_json::Value,
    },

    /// A successful response carried a body that is not JSON
    #[error("Malformed JSON body from {endpoint}: {message}")]
    Decode {
        endpoint: String,
        message: String,
        body: String,
    },

    /// Non-2xx, non-401 response
    #[error("HTTP {status} from {endpoint}: {body}")]
    Http {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Read or connect timeout
    #[error("Request to {endpoint} timed out")]
    Timeout { endpoint: String },

    /// Network-level failure (DNS, refused connection, reset)
    #[error("Transport error for {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    /// No organisation id was given and none is cached
    #[error("No organisation id supplied and no default organisation is known; call get_user_detail first")]
    OrganisationUnresolved,

    /// Invalid input or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The retry loop was cancelled by the caller
    #[error("Operation cancelled")]
    Cancelled,
}

impl EvnexError {
    /// Whether sending the same request again could succeed.
    ///
    /// This is the default retry predicate of the request executor.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EvnexError::Http { .. } | EvnexError::Transport { .. } | EvnexError::Timeout { .. }
        )
    }

    /// Whether this is a read/connect timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, EvnexError::Timeout { .. })
    }

    /// Whether the request ran out of time, locally or upstream.
    ///
    /// Besides local timeouts this covers 504 and 408 replies, which the
    /// API sends when a charge point does not answer a command.
    pub fn is_gateway_timeout(&self) -> bool {
        self.is_timeout() || matches!(self.status(), Some(504) | Some(408))
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            EvnexError::NotAuthorized { .. } => Some(401),
            EvnexError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for EVNEX operations
pub type Result<T> = std::result::Result<T, EvnexError>;
