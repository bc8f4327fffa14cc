use crate::schema::{FieldKind, ValidationError, FIELDS};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// PrivateGateway attaches a VPC to a physical network segment through a
/// dedicated, non-NAT gateway
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "network.gateway.io",
    version = "v1alpha1",
    kind = "PrivateGateway",
    plural = "privategateways",
    namespaced,
    derive = "Default",
    status = "PrivateGatewayStatus",
)]
pub struct PrivateGatewaySpec {
    /// Gateway address of the private network
    pub gateway: String,

    /// IP address of the gateway inside the private network
    pub ip_address: String,

    /// Netmask of the private network
    pub netmask: String,

    /// VLAN tag of the private network (1-4094)
    pub vlan: u32,

    /// ID of the VPC the gateway belongs to
    pub vpc_id: String,

    /// ACL list applied to the gateway; the only field that can change in place
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acl_id: Option<String>,

    /// Network offering name or ID
    pub network_offering: String,

    /// Physical network the private network is created on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_network_id: Option<String>,

    /// Whether source NAT is supported on the private network
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_nat_supported: Option<bool>,
}

/// Status of a PrivateGateway: the last projection of the remote gateway.
///
/// An empty `id` means the gateway is absent. Optional fields are not
/// skipped on serialization so a merge patch clears them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PrivateGatewayStatus {
    /// Remote identifier, empty when the gateway does not exist
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub gateway: String,

    #[serde(default)]
    pub ip_address: String,

    #[serde(default)]
    pub netmask: String,

    #[serde(default)]
    pub vlan: u32,

    #[serde(default)]
    pub vpc_id: String,

    #[serde(default)]
    pub acl_id: Option<String>,

    /// Network offering, kept in the form (name or ID) the user supplied
    #[serde(default)]
    pub network_offering: String,

    #[serde(default)]
    pub physical_network_id: Option<String>,

    #[serde(default)]
    pub source_nat_supported: Option<bool>,

    /// Whether the gateway matches the desired configuration
    #[serde(default)]
    pub ready: bool,

    /// Last reconciliation error
    #[serde(default)]
    pub message: Option<String>,
}

impl PrivateGatewaySpec {
    /// Treat empty optional strings as unset
    pub fn normalized(mut self) -> Self {
        self.acl_id = self.acl_id.filter(|v| !v.is_empty());
        self.physical_network_id = self.physical_network_id.filter(|v| !v.is_empty());
        self
    }

    /// Check required fields and address formats before any remote call
    pub fn validate(&self) -> Result<(), ValidationError> {
        for field in FIELDS
            .iter()
            .filter(|f| f.required && f.kind == FieldKind::String)
        {
            let value = self.string_field(field.name).unwrap_or_default();
            if value.trim().is_empty() {
                return Err(ValidationError::Missing(field.name));
            }
        }

        parse_ipv4("gateway", &self.gateway)?;
        parse_ipv4("ip_address", &self.ip_address)?;

        let mask = self
            .netmask
            .parse::<Ipv4Addr>()
            .map_err(|_| ValidationError::InvalidNetmask(self.netmask.clone()))?;
        ipnetwork::ipv4_mask_to_prefix(mask)
            .map_err(|_| ValidationError::InvalidNetmask(self.netmask.clone()))?;

        if !(1..=4094).contains(&self.vlan) {
            return Err(ValidationError::InvalidVlan(self.vlan));
        }

        Ok(())
    }

    /// Value of a string attribute by schema name
    fn string_field(&self, name: &str) -> Option<&str> {
        match name {
            "gateway" => Some(self.gateway.as_str()),
            "ip_address" => Some(self.ip_address.as_str()),
            "netmask" => Some(self.netmask.as_str()),
            "vpc_id" => Some(self.vpc_id.as_str()),
            "network_offering" => Some(self.network_offering.as_str()),
            "acl_id" => self.acl_id.as_deref(),
            "physical_network_id" => self.physical_network_id.as_deref(),
            _ => None,
        }
    }

    /// Names of the fields whose values differ from `other`
    pub fn changed_fields(&self, other: &Self) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.gateway != other.gateway {
            changed.push("gateway");
        }
        if self.ip_address != other.ip_address {
            changed.push("ip_address");
        }
        if self.netmask != other.netmask {
            changed.push("netmask");
        }
        if self.vlan != other.vlan {
            changed.push("vlan");
        }
        if self.vpc_id != other.vpc_id {
            changed.push("vpc_id");
        }
        if self.acl_id != other.acl_id {
            changed.push("acl_id");
        }
        if self.network_offering != other.network_offering {
            changed.push("network_offering");
        }
        if self.physical_network_id != other.physical_network_id {
            changed.push("physical_network_id");
        }
        if self.source_nat_supported != other.source_nat_supported {
            changed.push("source_nat_supported");
        }
        changed
    }
}

impl PrivateGatewayStatus {
    /// Seed local state from the desired configuration under a new identifier
    pub fn from_spec(id: impl Into<String>, spec: &PrivateGatewaySpec) -> Self {
        Self {
            id: id.into(),
            gateway: spec.gateway.clone(),
            ip_address: spec.ip_address.clone(),
            netmask: spec.netmask.clone(),
            vlan: spec.vlan,
            vpc_id: spec.vpc_id.clone(),
            acl_id: spec.acl_id.clone(),
            network_offering: spec.network_offering.clone(),
            physical_network_id: spec.physical_network_id.clone(),
            source_nat_supported: spec.source_nat_supported,
            ready: false,
            message: None,
        }
    }

    /// Whether the gateway is considered absent or destroyed
    pub fn is_absent(&self) -> bool {
        self.id.is_empty()
    }

    /// The stored attributes in desired-configuration shape
    pub fn to_spec(&self) -> PrivateGatewaySpec {
        PrivateGatewaySpec {
            gateway: self.gateway.clone(),
            ip_address: self.ip_address.clone(),
            netmask: self.netmask.clone(),
            vlan: self.vlan,
            vpc_id: self.vpc_id.clone(),
            acl_id: self.acl_id.clone(),
            network_offering: self.network_offering.clone(),
            physical_network_id: self.physical_network_id.clone(),
            source_nat_supported: self.source_nat_supported,
        }
    }
}

fn parse_ipv4(field: &'static str, value: &str) -> Result<Ipv4Addr, ValidationError> {
    value.parse().map_err(|_| ValidationError::InvalidAddress {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> PrivateGatewaySpec {
        PrivateGatewaySpec {
            gateway: "10.0.0.1".to_string(),
            ip_address: "10.0.0.1".to_string(),
            netmask: "255.255.255.0".to_string(),
            vlan: 100,
            vpc_id: "vpc-1".to_string(),
            network_offering: "DefaultOffering".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_spec() {
        assert_eq!(spec().validate(), Ok(()));
    }

    #[test]
    fn test_missing_required() {
        let mut s = spec();
        s.vpc_id = String::new();
        assert_eq!(s.validate(), Err(ValidationError::Missing("vpc_id")));

        let mut s = spec();
        s.network_offering = "  ".to_string();
        assert_eq!(s.validate(), Err(ValidationError::Missing("network_offering")));
    }

    #[test]
    fn test_every_required_string_field_is_checked() {
        for field in FIELDS.iter().filter(|f| f.required && f.kind == FieldKind::String) {
            assert!(spec().string_field(field.name).is_some(), "{}", field.name);
        }
        let mut s = spec();
        s.gateway = String::new();
        assert_eq!(s.validate(), Err(ValidationError::Missing("gateway")));
    }

    #[test]
    fn test_invalid_addresses() {
        let mut s = spec();
        s.ip_address = "10.0.0".to_string();
        assert!(matches!(
            s.validate(),
            Err(ValidationError::InvalidAddress { field: "ip_address", .. })
        ));

        let mut s = spec();
        s.netmask = "255.0.255.0".to_string();
        assert_eq!(
            s.validate(),
            Err(ValidationError::InvalidNetmask("255.0.255.0".to_string()))
        );
    }

    #[test]
    fn test_vlan_range() {
        let mut s = spec();
        s.vlan = 0;
        assert_eq!(s.validate(), Err(ValidationError::InvalidVlan(0)));
        s.vlan = 4095;
        assert_eq!(s.validate(), Err(ValidationError::InvalidVlan(4095)));
        s.vlan = 4094;
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_normalized_drops_empty_optionals() {
        let mut s = spec();
        s.acl_id = Some(String::new());
        s.physical_network_id = Some("pn-1".to_string());
        let s = s.normalized();
        assert_eq!(s.acl_id, None);
        assert_eq!(s.physical_network_id.as_deref(), Some("pn-1"));
    }

    #[test]
    fn test_changed_fields() {
        let old = spec();
        let mut new = spec();
        new.vlan = 200;
        new.acl_id = Some("acl-1".to_string());
        assert_eq!(old.changed_fields(&new), vec!["vlan", "acl_id"]);
        assert!(old.changed_fields(&old).is_empty());
    }

    #[test]
    fn test_status_round_trips_spec() {
        let status = PrivateGatewayStatus::from_spec("gw-9", &spec());
        assert!(!status.is_absent());
        assert_eq!(status.to_spec(), spec());
        assert!(PrivateGatewayStatus::default().is_absent());
    }

    #[test]
    fn test_status_serializes_cleared_optionals() {
        let value = serde_json::to_value(PrivateGatewayStatus::default()).unwrap();
        assert!(value.get("acl_id").unwrap().is_null());
        assert_eq!(value["id"], "");
    }
}
