use crate::client::RemoteError;
use crate::resolver::ResolveError;
use gateway_api::{PrivateGatewayStatus, ValidationError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GatewayError>;

/// Failure of a gateway operation. Every variant names the operation and
/// the gateway's IP address.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Invalid private gateway configuration for {ip}: {source}")]
    InvalidConfiguration {
        ip: String,
        #[source]
        source: ValidationError,
    },

    #[error("Error creating private gateway {ip}: {source}")]
    Resolution {
        ip: String,
        #[source]
        source: ResolveError,
    },

    #[error("Error creating private gateway {ip}: {source}")]
    Create {
        ip: String,
        #[source]
        source: RemoteError,
    },

    /// The gateway was created but could not be read back. `state` holds
    /// the new ID and must be persisted so the gateway is not created twice.
    #[error("Error reading private gateway {ip} after creating it: {source}")]
    CreatedUnread {
        ip: String,
        state: Box<PrivateGatewayStatus>,
        #[source]
        source: RemoteError,
    },

    #[error("Error reading private gateway {ip}: {source}")]
    Read {
        ip: String,
        #[source]
        source: RemoteError,
    },

    #[error("Error updating private gateway {ip}: Replacing the ACL requires a valid ACL ID")]
    MissingAclId { ip: String },

    #[error("Error updating private gateway {ip}: {fields:?} can only change by replacing the gateway")]
    RequiresReplacement {
        ip: String,
        fields: Vec<&'static str>,
    },

    #[error("Error replacing ACL of private gateway {ip}: {source}")]
    ReplaceAcl {
        ip: String,
        #[source]
        source: RemoteError,
    },

    #[error("Error deleting private gateway for {ip}: {source}")]
    Delete {
        ip: String,
        #[source]
        source: RemoteError,
    },
}

impl GatewayError {
    /// Whether the error was raised before contacting the remote system
    /// because of the user's configuration
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            GatewayError::InvalidConfiguration { .. }
                | GatewayError::MissingAclId { .. }
                | GatewayError::RequiresReplacement { .. }
        )
    }

    /// State of a gateway that exists remotely even though the operation
    /// failed
    pub fn created_state(&self) -> Option<&PrivateGatewayStatus> {
        match self {
            GatewayError::CreatedUnread { state, .. } => Some(state.as_ref()),
            _ => None,
        }
    }
}
