//! Change planning between desired configuration and current state

use gateway_api::schema::forces_replacement;
use gateway_api::{PrivateGatewaySpec, PrivateGatewayStatus};

/// Action needed to bring a gateway to its desired configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Plan {
    /// No gateway exists yet
    Create,
    /// Immutable fields changed; the gateway is deleted and created again
    Replace(Vec<&'static str>),
    /// Only the ACL changed
    UpdateAcl,
    Noop,
}

/// Decide what to do with `current` to reach `desired`
pub fn plan(desired: &PrivateGatewaySpec, current: &PrivateGatewayStatus) -> Plan {
    if current.is_absent() {
        return Plan::Create;
    }

    let fields = replacement_fields(desired, current);
    if !fields.is_empty() {
        return Plan::Replace(fields);
    }

    if desired.acl_id != current.acl_id {
        Plan::UpdateAcl
    } else {
        Plan::Noop
    }
}

/// Changed fields that can only be applied by replacing the gateway.
///
/// Optional immutable fields the user left unset take whatever the remote
/// side reports and never trigger a replacement. An unrecorded
/// `source_nat_supported` is the remote default, `false`.
pub fn replacement_fields(desired: &PrivateGatewaySpec, current: &PrivateGatewayStatus) -> Vec<&'static str> {
    current
        .to_spec()
        .changed_fields(desired)
        .into_iter()
        .filter(|name| forces_replacement(name))
        .filter(|name| match *name {
            "physical_network_id" => desired.physical_network_id.is_some(),
            "source_nat_supported" => desired
                .source_nat_supported
                .is_some_and(|wanted| wanted != current.source_nat_supported.unwrap_or(false)),
            _ => true,
        })
        .collect()
}
