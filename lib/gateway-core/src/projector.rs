//! Mapping between desired configuration, remote records and local state

use crate::client::{CreatePrivateGatewayRequest, RemoteGateway};
use crate::resolver::value_or_id;
use gateway_api::{PrivateGatewaySpec, PrivateGatewayStatus};

const VLAN_SCHEME: &str = "vlan://";

/// Build the creation request for `spec` with its resolved network offering
pub fn create_request(spec: &PrivateGatewaySpec, network_offering_id: String) -> CreatePrivateGatewayRequest {
    CreatePrivateGatewayRequest {
        gateway: spec.gateway.clone(),
        ip_address: spec.ip_address.clone(),
        netmask: spec.netmask.clone(),
        vlan: spec.vlan.to_string(),
        vpc_id: spec.vpc_id.clone(),
        network_offering_id,
        acl_id: non_empty(spec.acl_id.as_deref().unwrap_or_default()),
        physical_network_id: non_empty(spec.physical_network_id.as_deref().unwrap_or_default()),
        source_nat_supported: spec.source_nat_supported,
    }
}

/// Replace every attribute of `prior` with the values of `remote`.
///
/// Unset remote values never invent optional attributes: an empty string
/// projects to `None`, and `source_nat_supported == false` is only kept
/// when the prior state already carried the attribute.
pub fn project(remote: &RemoteGateway, prior: &PrivateGatewayStatus) -> PrivateGatewayStatus {
    let source_nat_supported = if remote.source_nat_supported || prior.source_nat_supported.is_some() {
        Some(remote.source_nat_supported)
    } else {
        None
    };

    PrivateGatewayStatus {
        id: remote.id.clone(),
        gateway: remote.gateway.clone(),
        ip_address: remote.ip_address.clone(),
        netmask: remote.netmask.clone(),
        vlan: parse_vlan(&remote.vlan).unwrap_or(prior.vlan),
        vpc_id: remote.vpc_id.clone(),
        acl_id: non_empty(&remote.acl_id),
        network_offering: value_or_id(
            &prior.network_offering,
            &remote.network_offering_name,
            &remote.network_offering_id,
        ),
        physical_network_id: non_empty(&remote.physical_network_id),
        source_nat_supported,
        ready: false,
        message: None,
    }
}

/// Parse a VLAN reported either as a bare tag or as a `vlan://` URI
pub fn parse_vlan(raw: &str) -> Option<u32> {
    raw.strip_prefix(VLAN_SCHEME).unwrap_or(raw).trim().parse().ok()
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
