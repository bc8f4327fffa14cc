//! Private gateway API types and CRDs for Kubernetes integration
//!
//! This library defines the declarative surface of a VPC private gateway:
//! - PrivateGateway: custom resource whose spec is the desired gateway
//!   configuration and whose status is the locally persisted projection of
//!   the remote gateway
//! - schema: per-field type, requiredness and replace-on-change rules

pub mod schema;
pub mod v1alpha1;

pub use schema::{FieldKind, FieldSchema, ValidationError, FIELDS};
pub use v1alpha1::{PrivateGateway, PrivateGatewaySpec, PrivateGatewayStatus};
