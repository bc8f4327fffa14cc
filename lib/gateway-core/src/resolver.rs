//! Resolution of human-readable names to remote IDs

use crate::client::{RemoteClient, RemoteError, ResourceKind};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No {kind} found with name {name}")]
    NotFound { kind: ResourceKind, name: String },

    #[error("Found {count} {kind} entries named {name}, please use the ID instead")]
    Ambiguous {
        kind: ResourceKind,
        name: String,
        count: usize,
    },

    #[error("Error retrieving ID of {kind} {name}: {source}")]
    Remote {
        kind: ResourceKind,
        name: String,
        #[source]
        source: RemoteError,
    },
}

/// Whether `value` already is a remote ID rather than a name
pub fn is_id(value: &str) -> bool {
    Uuid::parse_str(value).is_ok()
}

/// Pick the form to store for a resolved reference: keep the ID when the
/// user referenced it by ID, otherwise the name. Falls back to the ID when
/// the remote side reports no name.
pub fn value_or_id(prior: &str, name: &str, id: &str) -> String {
    if is_id(prior) || name.is_empty() {
        id.to_string()
    } else {
        name.to_string()
    }
}

/// Resolver maps names to IDs, scoped by resource kind
pub struct Resolver {
    client: Arc<dyn RemoteClient>,
}

impl Resolver {
    pub fn new(client: Arc<dyn RemoteClient>) -> Self {
        Self { client }
    }

    /// Resolve `value` to exactly one ID of `kind`
    pub async fn resolve(&self, kind: ResourceKind, value: &str) -> Result<String, ResolveError> {
        if is_id(value) {
            return Ok(value.to_string());
        }

        let ids = self
            .client
            .lookup_ids(kind, value)
            .await
            .map_err(|source| ResolveError::Remote {
                kind,
                name: value.to_string(),
                source,
            })?;

        match ids.as_slice() {
            [] => Err(ResolveError::NotFound {
                kind,
                name: value.to_string(),
            }),
            [id] => {
                debug!("Resolved {} {} to {}", kind, value, id);
                Ok(id.clone())
            }
            _ => Err(ResolveError::Ambiguous {
                kind,
                name: value.to_string(),
                count: ids.len(),
            }),
        }
    }
}
