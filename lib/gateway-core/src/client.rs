//! Typed interface to the cloud orchestration API

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Error code the orchestration API uses for invalid parameter values
pub const PARAM_ERROR_CODE: u16 = 431;

/// Error returned by the orchestration API or its transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("CloudStack API error {code}: {message}")]
    Api { code: u16, message: String },
}

impl RemoteError {
    /// Whether this error reports that the gateway `id` does not exist.
    ///
    /// The API has no dedicated code for this case: it answers with the
    /// generic parameter error and a fixed message, so both are matched.
    pub fn is_missing_entity(&self, id: &str) -> bool {
        match self {
            RemoteError::Api { code, message } => {
                *code == PARAM_ERROR_CODE && message.contains(&missing_entity_message(id))
            }
            RemoteError::Transport(_) => false,
        }
    }
}

/// Message the orchestration API returns for an unknown or malformed `id`
pub fn missing_entity_message(id: &str) -> String {
    format!(
        "Invalid parameter id value={} due to incorrect long value format, \
         or entity does not exist",
        id
    )
}

/// Kind of remote entity a human-readable name refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    NetworkOffering,
    Vpc,
    NetworkAcl,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::NetworkOffering => "network_offering",
            ResourceKind::Vpc => "vpc",
            ResourceKind::NetworkAcl => "network_acl",
        };
        f.write_str(name)
    }
}

/// Authoritative private gateway record as reported by the remote system.
/// Empty strings stand for unset values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteGateway {
    pub id: String,
    pub gateway: String,
    pub ip_address: String,
    pub netmask: String,
    /// VLAN as reported, either `"100"` or `"vlan://100"`
    pub vlan: String,
    pub vpc_id: String,
    pub acl_id: String,
    pub network_offering_id: String,
    pub network_offering_name: String,
    pub physical_network_id: String,
    pub source_nat_supported: bool,
}

/// Parameters of a createPrivateGateway call
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreatePrivateGatewayRequest {
    pub gateway: String,
    pub ip_address: String,
    pub netmask: String,
    pub vlan: String,
    pub vpc_id: String,
    pub network_offering_id: String,
    pub acl_id: Option<String>,
    pub physical_network_id: Option<String>,
    pub source_nat_supported: Option<bool>,
}

impl CreatePrivateGatewayRequest {
    /// Render the request as API parameters. Unset optional fields are left
    /// out instead of being sent empty.
    pub fn to_params(&self) -> BTreeMap<&'static str, String> {
        let mut params = BTreeMap::new();
        params.insert("gateway", self.gateway.clone());
        params.insert("ipaddress", self.ip_address.clone());
        params.insert("netmask", self.netmask.clone());
        params.insert("vlan", self.vlan.clone());
        params.insert("vpcid", self.vpc_id.clone());
        params.insert("networkofferingid", self.network_offering_id.clone());

        if let Some(acl_id) = &self.acl_id {
            params.insert("aclid", acl_id.clone());
        }
        if let Some(physical_network_id) = &self.physical_network_id {
            params.insert("physicalnetworkid", physical_network_id.clone());
        }
        if let Some(source_nat_supported) = self.source_nat_supported {
            params.insert("sourcenatsupported", source_nat_supported.to_string());
        }

        params
    }
}

/// Client for the private gateway and ACL endpoints of the orchestration API
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Create a private gateway, returning the created record
    async fn create_private_gateway(
        &self,
        request: &CreatePrivateGatewayRequest,
    ) -> Result<RemoteGateway, RemoteError>;

    /// Fetch a private gateway; `Ok(None)` when no gateway has this ID
    async fn get_private_gateway_by_id(&self, id: &str) -> Result<Option<RemoteGateway>, RemoteError>;

    /// Delete a private gateway
    async fn delete_private_gateway(&self, id: &str) -> Result<(), RemoteError>;

    /// Replace the ACL list applied to a private gateway
    async fn replace_network_acl_list(&self, acl_id: &str, gateway_id: &str) -> Result<(), RemoteError>;

    /// IDs of all entities of `kind` named `name`
    async fn lookup_ids(&self, kind: ResourceKind, name: &str) -> Result<Vec<String>, RemoteError>;
}
