//! Field schema for the private gateway resource
//!
//! Every attribute except `acl_id` is immutable: a change to it can only be
//! applied by destroying the gateway and creating a new one.

use thiserror::Error;

/// Value type of a declared attribute
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Int,
    Bool,
}

/// Declaration of a single attribute of the resource
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// A change to this field forces delete + recreate
    pub force_new: bool,
}

impl FieldSchema {
    const fn new(name: &'static str, kind: FieldKind, required: bool, force_new: bool) -> Self {
        Self {
            name,
            kind,
            required,
            force_new,
        }
    }
}

/// Attribute set of the private gateway resource
pub const FIELDS: &[FieldSchema] = &[
    FieldSchema::new("gateway", FieldKind::String, true, true),
    FieldSchema::new("ip_address", FieldKind::String, true, true),
    FieldSchema::new("netmask", FieldKind::String, true, true),
    FieldSchema::new("vlan", FieldKind::Int, true, true),
    FieldSchema::new("vpc_id", FieldKind::String, true, true),
    FieldSchema::new("acl_id", FieldKind::String, false, false),
    FieldSchema::new("network_offering", FieldKind::String, true, true),
    FieldSchema::new("physical_network_id", FieldKind::String, false, true),
    FieldSchema::new("source_nat_supported", FieldKind::Bool, false, true),
];

/// Look up the declaration of a field by name
pub fn field(name: &str) -> Option<&'static FieldSchema> {
    FIELDS.iter().find(|f| f.name == name)
}

/// Whether changing `name` requires replacing the gateway
pub fn forces_replacement(name: &str) -> bool {
    field(name).map(|f| f.force_new).unwrap_or(false)
}

/// Rejected desired configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} must be an IPv4 address, got {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("netmask {0:?} is not a valid IPv4 netmask")]
    InvalidNetmask(String),

    #[error("vlan {0} is outside the range 1-4094")]
    InvalidVlan(u32),
}
