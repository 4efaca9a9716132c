//! Per-request permission check and path rewrite for schema-driven mode.
//!
//! # Responsibilities
//! - Map `(method, logical path)` to a resource and an operation
//! - Enforce the resource's operation allow-list
//! - Rewrite the logical key and any link alias to backend identifiers

use std::sync::Arc;

use axum::http::Method;
use thiserror::Error;

use crate::routing::operation::Operation;
use crate::routing::path::{resolve_link_alias, split_logical_path, LinkPath};
use crate::routing::resolver::ResolvedConfig;
use crate::schema::SchemaLookup;

/// Per-request rejection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown resource '{0}'")]
    UnknownResource(String),

    #[error("operation '{operation}' not permitted on resource '{key}'")]
    OperationNotPermitted { key: String, operation: Operation },

    #[error("unknown link field '{alias}' for resource '{key}'")]
    UnknownRelationshipField { key: String, alias: String },

    #[error("method {0} is not supported")]
    UnsupportedMethod(String),
}

impl ValidationError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::UnknownResource(_) => "UNKNOWN_RESOURCE",
            ValidationError::OperationNotPermitted { .. } => "OPERATION_NOT_PERMITTED",
            ValidationError::UnknownRelationshipField { .. } => "UNKNOWN_RELATIONSHIP_FIELD",
            ValidationError::UnsupportedMethod(_) => "UNSUPPORTED_METHOD",
        }
    }
}

/// Successful validation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub resolved_upstream_path: String,
    pub operation: Operation,
}

/// Validates requests against a [`ResolvedConfig`].
pub struct RequestValidator {
    config: Arc<ResolvedConfig>,
}

impl RequestValidator {
    pub fn new(config: Arc<ResolvedConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Arc<ResolvedConfig> {
        &self.config
    }

    /// Check one request. Link aliases are resolved against `schema`, which
    /// the caller pins for the whole request; without one no alias resolves.
    pub fn validate(
        &self,
        method: &Method,
        logical_path: &str,
        schema: Option<&dyn SchemaLookup>,
    ) -> Result<ValidationOutcome, ValidationError> {
        let (key, remainder) = split_logical_path(logical_path);

        let entry = self
            .config
            .entry(key)
            .ok_or_else(|| ValidationError::UnknownResource(key.to_string()))?;

        let link = remainder.and_then(LinkPath::parse);
        let operation = Operation::from_method(method, link.is_some())
            .ok_or_else(|| ValidationError::UnsupportedMethod(method.to_string()))?;

        if !entry.allows(operation) {
            return Err(ValidationError::OperationNotPermitted {
                key: key.to_string(),
                operation,
            });
        }

        let remainder = match (link, remainder) {
            (Some(link), _) => {
                let field_id = schema
                    .and_then(|schema| resolve_link_alias(schema, &entry.table_id, link.alias))
                    .ok_or_else(|| ValidationError::UnknownRelationshipField {
                        key: key.to_string(),
                        alias: link.alias.to_string(),
                    })?;
                tracing::debug!(key = %key, alias = %link.alias, field_id = %field_id, "Resolved link field");
                Some(link.rewrite(&field_id))
            }
            (None, rest) => rest.map(str::to_string),
        };

        let resolved_upstream_path = match remainder {
            Some(rest) => format!("{}/{}", entry.table_id, rest),
            None => entry.table_id.clone(),
        };

        Ok(ValidationOutcome {
            resolved_upstream_path,
            operation,
        })
    }
}
