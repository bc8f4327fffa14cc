//! Private gateway reconciliation
//!
//! This library provides:
//! - RemoteClient: typed interface to the cloud orchestration API
//! - Resolver: name to ID lookup per resource kind
//! - projector: mapping between remote gateways and local state
//! - plan: deciding between create, replace, in-place update and no-op
//! - PrivateGatewayReconciler: create/read/update/delete state machine
//! - InMemoryCloud: in-process orchestration backend

pub mod client;
pub mod error;
pub mod memory;
pub mod plan;
pub mod projector;
pub mod reconciler;
pub mod resolver;

pub use client::{CreatePrivateGatewayRequest, RemoteClient, RemoteError, RemoteGateway, ResourceKind};
pub use error::{GatewayError, Result};
pub use memory::{InMemoryCloud, Operation};
pub use plan::{plan, Plan};
pub use reconciler::PrivateGatewayReconciler;
pub use resolver::{ResolveError, Resolver};
