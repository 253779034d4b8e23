use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Error kinds for mapping and database operations.
///
/// Mapping errors (`ConfigurationError`) abort the initialization of the
/// offending entity type. Per-call errors (`UnresolvedExpression`,
/// `DelegatedOperation` and the client-reported kinds) propagate to the
/// immediate caller and are never retried internally.
///
/// # Examples
///
/// ```rust,ignore
/// use arango_odm::errors::{ErrorKind, OdmError, OdmResult};
///
/// fn example() -> OdmResult<()> {
///     Err(OdmError::new("multiple id properties", ErrorKind::ConfigurationError))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Mapping Errors
    /// Entity or view configuration is invalid or ambiguous
    ConfigurationError,
    /// A templated name was evaluated without the context it needs
    UnresolvedExpression,

    // Collaborator Errors
    /// A failure reported by the database client, tagged with the entity type
    DelegatedOperation,

    // Client Errors - reported by database client implementations
    /// Collection does not exist
    CollectionNotFound,
    /// Search view does not exist
    ViewNotFound,
    /// Document does not exist
    DocumentNotFound,
    /// A unique index constraint was violated
    UniqueConstraintViolation,

    // Operation Errors
    /// The operation is not valid in the current context
    InvalidOperation,
    /// Error mapping an entity to or from a document
    ObjectMappingError,

    // Generic/Internal Errors - used as fallback
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::ConfigurationError => write!(f, "Configuration error"),
            ErrorKind::UnresolvedExpression => write!(f, "Unresolved expression"),
            ErrorKind::DelegatedOperation => write!(f, "Delegated operation error"),
            ErrorKind::CollectionNotFound => write!(f, "Collection not found"),
            ErrorKind::ViewNotFound => write!(f, "View not found"),
            ErrorKind::DocumentNotFound => write!(f, "Document not found"),
            ErrorKind::UniqueConstraintViolation => write!(f, "Unique constraint violation"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::ObjectMappingError => write!(f, "Object mapping error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Error type of the mapping layer.
///
/// `OdmError` carries a message, an [`ErrorKind`], an optional cause and the
/// backtrace captured at construction. Failures surfaced by collaborators
/// (database client, type descriptions) keep their original error as the
/// cause so nothing is swallowed.
///
/// # Examples
///
/// ```rust,ignore
/// use arango_odm::errors::{ErrorKind, OdmError};
///
/// let cause = OdmError::new("collection 'users' not found", ErrorKind::CollectionNotFound);
/// let err = OdmError::delegated("User", cause);
/// assert_eq!(err.kind(), &ErrorKind::DelegatedOperation);
/// ```
#[derive(Clone)]
pub struct OdmError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<OdmError>>,
    backtrace: Atomic<Backtrace>,
}

impl OdmError {
    /// Creates a new `OdmError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        OdmError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `OdmError` that keeps `cause` in its error chain.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: OdmError) -> Self {
        OdmError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Wraps a collaborator failure and tags it with the entity type it concerns.
    ///
    /// The cause is kept unmodified; [`OdmError::root_kind`] still reports the
    /// kind the collaborator returned.
    pub fn delegated(type_name: &str, cause: OdmError) -> Self {
        let message = format!("Operation for entity '{}' failed: {}", type_name, cause.message);
        OdmError::new_with_cause(&message, ErrorKind::DelegatedOperation, cause)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&OdmError> {
        self.cause.as_deref()
    }

    /// Returns the kind of the innermost error of the chain.
    pub fn root_kind(&self) -> &ErrorKind {
        match &self.cause {
            Some(cause) => cause.root_kind(),
            None => &self.error_kind,
        }
    }
}

impl Display for OdmError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for OdmError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for OdmError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for mapping and database operations.
pub type OdmResult<T> = Result<T, OdmError>;

impl From<serde_json::Error> for OdmError {
    fn from(err: serde_json::Error) -> Self {
        OdmError::new(
            &format!("Document mapping error: {}", err),
            ErrorKind::ObjectMappingError,
        )
    }
}

impl From<regex::Error> for OdmError {
    fn from(err: regex::Error) -> Self {
        OdmError::new(&format!("Invalid pattern: {}", err), ErrorKind::InternalError)
    }
}

impl From<String> for OdmError {
    fn from(msg: String) -> Self {
        OdmError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for OdmError {
    fn from(msg: &str) -> Self {
        OdmError::new(msg, ErrorKind::InternalError)
    }
}
