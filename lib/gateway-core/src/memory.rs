//! In-process orchestration backend

use crate::client::{
    missing_entity_message, CreatePrivateGatewayRequest, RemoteClient, RemoteError, RemoteGateway,
    ResourceKind, PARAM_ERROR_CODE,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Remote call that can be made to fail once
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Get,
    Delete,
    ReplaceAcl,
    Lookup,
}

/// Catalog entry: a named entity of some kind
#[derive(Clone, Debug)]
struct CatalogEntry {
    kind: ResourceKind,
    name: String,
    id: String,
}

/// InMemoryCloud keeps private gateways and a catalog of named entities
/// (network offerings, VPCs, ACL lists) in memory and answers like the
/// orchestration API does, including its error codes and messages.
pub struct InMemoryCloud {
    catalog: RwLock<Vec<CatalogEntry>>,
    gateways: RwLock<HashMap<String, RemoteGateway>>,
    // One-shot failures keyed by the call they apply to
    failures: RwLock<HashMap<Operation, RemoteError>>,
    mutations: AtomicUsize,
}

impl InMemoryCloud {
    pub fn new() -> Self {
        Self {
            catalog: RwLock::new(Vec::new()),
            gateways: RwLock::new(HashMap::new()),
            failures: RwLock::new(HashMap::new()),
            mutations: AtomicUsize::new(0),
        }
    }

    /// Add a named entity to the catalog
    pub async fn register(&self, kind: ResourceKind, name: &str, id: &str) {
        let mut catalog = self.catalog.write().await;
        catalog.push(CatalogEntry {
            kind,
            name: name.to_string(),
            id: id.to_string(),
        });
        debug!("Registered {} {} as {}", kind, name, id);
    }

    /// Make the next call of `operation` fail with `error`
    pub async fn fail_next(&self, operation: Operation, error: RemoteError) {
        let mut failures = self.failures.write().await;
        failures.insert(operation, error);
    }

    /// Remove a gateway behind the reconciler's back
    pub async fn remove(&self, id: &str) -> Option<RemoteGateway> {
        let mut gateways = self.gateways.write().await;
        gateways.remove(id)
    }

    /// Current record of a gateway
    pub async fn gateway(&self, id: &str) -> Option<RemoteGateway> {
        let gateways = self.gateways.read().await;
        gateways.get(id).cloned()
    }

    /// Number of stored gateways
    pub async fn gateway_count(&self) -> usize {
        let gateways = self.gateways.read().await;
        gateways.len()
    }

    /// Number of create, delete and replace-ACL calls received so far
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    async fn injected(&self, operation: Operation) -> Result<(), RemoteError> {
        let mut failures = self.failures.write().await;
        match failures.remove(&operation) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn catalog_name(&self, kind: ResourceKind, id: &str) -> Option<String> {
        let catalog = self.catalog.read().await;
        catalog
            .iter()
            .find(|entry| entry.kind == kind && entry.id == id)
            .map(|entry| entry.name.clone())
    }

    async fn require_acl(&self, acl_id: &str) -> Result<(), RemoteError> {
        match self.catalog_name(ResourceKind::NetworkAcl, acl_id).await {
            Some(_) => Ok(()),
            None => Err(param_error(format!("Unable to find specified ACL {}", acl_id))),
        }
    }
}

impl Default for InMemoryCloud {
    fn default() -> Self {
        Self::new()
    }
}

fn param_error(message: String) -> RemoteError {
    RemoteError::Api {
        code: PARAM_ERROR_CODE,
        message,
    }
}

#[async_trait]
impl RemoteClient for InMemoryCloud {
    async fn create_private_gateway(
        &self,
        request: &CreatePrivateGatewayRequest,
    ) -> Result<RemoteGateway, RemoteError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.injected(Operation::Create).await?;

        let offering_name = self
            .catalog_name(ResourceKind::NetworkOffering, &request.network_offering_id)
            .await
            .ok_or_else(|| {
                param_error(format!(
                    "Unable to find network offering by id {}",
                    request.network_offering_id
                ))
            })?;

        if let Some(acl_id) = &request.acl_id {
            self.require_acl(acl_id).await?;
        }

        let gateway = RemoteGateway {
            id: Uuid::new_v4().to_string(),
            gateway: request.gateway.clone(),
            ip_address: request.ip_address.clone(),
            netmask: request.netmask.clone(),
            vlan: format!("vlan://{}", request.vlan),
            vpc_id: request.vpc_id.clone(),
            acl_id: request.acl_id.clone().unwrap_or_default(),
            network_offering_id: request.network_offering_id.clone(),
            network_offering_name: offering_name,
            physical_network_id: request.physical_network_id.clone().unwrap_or_default(),
            source_nat_supported: request.source_nat_supported.unwrap_or(false),
        };

        let mut gateways = self.gateways.write().await;
        gateways.insert(gateway.id.clone(), gateway.clone());
        debug!("Created private gateway {} ({})", gateway.id, gateway.ip_address);

        Ok(gateway)
    }

    async fn get_private_gateway_by_id(&self, id: &str) -> Result<Option<RemoteGateway>, RemoteError> {
        self.injected(Operation::Get).await?;
        Ok(self.gateway(id).await)
    }

    async fn delete_private_gateway(&self, id: &str) -> Result<(), RemoteError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.injected(Operation::Delete).await?;

        let mut gateways = self.gateways.write().await;
        match gateways.remove(id) {
            Some(_) => {
                debug!("Deleted private gateway {}", id);
                Ok(())
            }
            None => Err(param_error(missing_entity_message(id))),
        }
    }

    async fn replace_network_acl_list(&self, acl_id: &str, gateway_id: &str) -> Result<(), RemoteError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.injected(Operation::ReplaceAcl).await?;
        self.require_acl(acl_id).await?;

        let mut gateways = self.gateways.write().await;
        let gateway = gateways
            .get_mut(gateway_id)
            .ok_or_else(|| param_error(missing_entity_message(gateway_id)))?;
        gateway.acl_id = acl_id.to_string();
        Ok(())
    }

    async fn lookup_ids(&self, kind: ResourceKind, name: &str) -> Result<Vec<String>, RemoteError> {
        self.injected(Operation::Lookup).await?;

        let catalog = self.catalog.read().await;
        Ok(catalog
            .iter()
            .filter(|entry| entry.kind == kind && entry.name == name)
            .map(|entry| entry.id.clone())
            .collect())
    }
}
