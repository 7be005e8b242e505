//! Error types for repository operations.
//!
//! Every failure a store backend can produce is one of the [`RepositoryError`]
//! variants below, each carrying an [`ErrorContext`] describing where it
//! happened. The HTTP layer maps variants to status codes; nothing else
//! inspects error messages.

use std::fmt;

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Structured context for repository errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// The operation being performed (e.g., "create_cafe", "update_price")
    pub operation: Option<String>,
    /// The entity type involved
    pub entity: Option<String>,
    /// The entity ID if applicable
    pub entity_id: Option<String>,
    /// Additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with an operation name.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn with_entity_id(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref op) = self.operation {
            parts.push(format!("operation={}", op));
        }
        if let Some(ref entity) = self.entity {
            parts.push(format!("entity={}", entity));
        }
        if let Some(ref id) = self.entity_id {
            parts.push(format!("id={}", id));
        }
        if let Some(ref details) = self.details {
            parts.push(format!("details={}", details));
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Connection pool or database connection errors.
    #[error("Connection error: {message} {context}")]
    ConnectionError {
        message: String,
        context: ErrorContext,
    },

    /// Query execution errors.
    #[error("Query error: {message} {context}")]
    QueryError {
        message: String,
        context: ErrorContext,
    },

    /// Requested entity was not found.
    #[error("Not found: {message} {context}")]
    NotFound {
        message: String,
        context: ErrorContext,
    },

    /// A cafe with the same name is already stored.
    #[error("Duplicate name: a cafe named '{name}' already exists {context}")]
    DuplicateName { name: String, context: ErrorContext },

    /// Candidate record rejected before it was written.
    #[error("Data validation error: {message} {context}")]
    ValidationError {
        message: String,
        context: ErrorContext,
    },

    /// Configuration or initialization error.
    #[error("Configuration error: {message} {context}")]
    ConfigurationError {
        message: String,
        context: ErrorContext,
    },

    /// Internal/unexpected errors.
    #[error("Internal error: {message} {context}")]
    InternalError {
        message: String,
        context: ErrorContext,
    },

    /// Transaction error (commit/rollback failed).
    #[error("Transaction error: {message} {context}")]
    TransactionError {
        message: String,
        context: ErrorContext,
    },
}

impl RepositoryError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::ConnectionError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn connection_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::ConnectionError {
            message: message.into(),
            context,
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::QueryError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn not_found_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::NotFound {
            message: message.into(),
            context,
        }
    }

    /// Cafe `id` does not exist.
    pub fn cafe_not_found(operation: &str, id: crate::models::CafeId) -> Self {
        Self::not_found_with_context(
            format!("Cafe {} not found", id),
            ErrorContext::new(operation)
                .with_entity("cafe")
                .with_entity_id(id),
        )
    }

    pub fn duplicate_name(name: impl Into<String>) -> Self {
        Self::DuplicateName {
            name: name.into(),
            context: ErrorContext::new("create_cafe").with_entity("cafe"),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn validation_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::ValidationError {
            message: message.into(),
            context,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn internal_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::InternalError {
            message: message.into(),
            context,
        }
    }

    pub fn transaction(message: impl Into<String>) -> Self {
        Self::TransactionError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// True for failures of the storage itself rather than of the request.
    pub fn is_persistence_failure(&self) -> bool {
        matches!(
            self,
            Self::ConnectionError { .. }
                | Self::QueryError { .. }
                | Self::ConfigurationError { .. }
                | Self::InternalError { .. }
                | Self::TransactionError { .. }
        )
    }

    /// Get the error context.
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::ConnectionError { context, .. }
            | Self::QueryError { context, .. }
            | Self::NotFound { context, .. }
            | Self::DuplicateName { context, .. }
            | Self::ValidationError { context, .. }
            | Self::ConfigurationError { context, .. }
            | Self::InternalError { context, .. }
            | Self::TransactionError { context, .. } => context,
        }
    }

    /// Add or update the operation in the error context.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        match &mut self {
            Self::ConnectionError { context, .. }
            | Self::QueryError { context, .. }
            | Self::NotFound { context, .. }
            | Self::DuplicateName { context, .. }
            | Self::ValidationError { context, .. }
            | Self::ConfigurationError { context, .. }
            | Self::InternalError { context, .. }
            | Self::TransactionError { context, .. } => {
                context.operation = Some(operation.into());
            }
        }
        self
    }
}

#[cfg(feature = "postgres-repo")]
impl From<diesel::result::Error> for RepositoryError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        match err {
            Error::NotFound => RepositoryError::not_found("Record not found"),
            Error::DatabaseError(kind, info) => {
                let message = info.message().to_string();
                let context =
                    ErrorContext::default().with_details(format!("db_error_kind={:?}", kind));
                match kind {
                    DatabaseErrorKind::SerializationFailure
                    | DatabaseErrorKind::ReadOnlyTransaction => {
                        RepositoryError::TransactionError { message, context }
                    }
                    _ => RepositoryError::QueryError { message, context },
                }
            }
            Error::RollbackTransaction => RepositoryError::transaction("Transaction rolled back"),
            Error::AlreadyInTransaction => {
                RepositoryError::transaction("Transaction already in progress")
            }
            Error::QueryBuilderError(e) => {
                RepositoryError::query(format!("Query builder error: {}", e))
            }
            Error::DeserializationError(e) => {
                RepositoryError::internal(format!("Deserialization error: {}", e))
            }
            Error::SerializationError(e) => {
                RepositoryError::internal(format!("Serialization error: {}", e))
            }
            other => RepositoryError::query(other.to_string()),
        }
    }
}

#[cfg(feature = "postgres-repo")]
impl From<diesel::r2d2::PoolError> for RepositoryError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        RepositoryError::connection_with_context(
            err.to_string(),
            ErrorContext::default().with_details("pool_error"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CafeId;

    #[test]
    fn test_context_display_lists_known_parts() {
        let ctx = ErrorContext::new("update_price")
            .with_entity("cafe")
            .with_entity_id(12);
        assert_eq!(
            ctx.to_string(),
            "[operation=update_price, entity=cafe, id=12]"
        );
        assert_eq!(ErrorContext::default().to_string(), "[]");
    }

    #[test]
    fn test_cafe_not_found_carries_id() {
        let err = RepositoryError::cafe_not_found("get_cafe", CafeId::new(999));
        assert!(matches!(err, RepositoryError::NotFound { .. }));
        assert_eq!(err.context().entity_id.as_deref(), Some("999"));
        assert!(err.to_string().contains("Cafe 999 not found"));
    }

    #[test]
    fn test_duplicate_name_message_names_the_cafe() {
        let err = RepositoryError::duplicate_name("Central Perk");
        assert!(err
            .to_string()
            .contains("a cafe named 'Central Perk' already exists"));
        assert!(!err.is_persistence_failure());
    }

    #[test]
    fn test_persistence_failure_classification() {
        assert!(RepositoryError::connection("down").is_persistence_failure());
        assert!(RepositoryError::transaction("rolled back").is_persistence_failure());
        assert!(!RepositoryError::not_found("gone").is_persistence_failure());
        assert!(!RepositoryError::validation("empty name").is_persistence_failure());
    }

    #[test]
    fn test_with_operation_overrides_context() {
        let err = RepositoryError::internal("boom").with_operation("delete_cafe");
        assert_eq!(err.context().operation.as_deref(), Some("delete_cafe"));
    }
}
