//! Create/read/update/delete of private gateways against the remote system

use crate::client::{RemoteClient, ResourceKind};
use crate::error::{GatewayError, Result};
use crate::plan::{plan, replacement_fields, Plan};
use crate::projector::{create_request, project};
use crate::resolver::Resolver;
use gateway_api::{PrivateGatewaySpec, PrivateGatewayStatus};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Message of a created gateway the remote system does not report yet
pub const NOT_YET_VISIBLE: &str = "Private gateway was not found right after creation";

/// PrivateGatewayReconciler drives a single private gateway through its
/// lifecycle. Remote errors are never retried here; the caller decides.
pub struct PrivateGatewayReconciler {
    client: Arc<dyn RemoteClient>,
    resolver: Resolver,
}

impl PrivateGatewayReconciler {
    pub fn new(client: Arc<dyn RemoteClient>) -> Self {
        let resolver = Resolver::new(client.clone());
        Self { client, resolver }
    }

    /// Create the gateway described by `spec` and return its refreshed state.
    ///
    /// Nothing is sent to the remote system when validation or the network
    /// offering lookup fails. Once the gateway exists its ID is never lost:
    /// a failed read-back returns it in `GatewayError::CreatedUnread`, and a
    /// gateway not yet visible is returned as seeded from `spec`.
    pub async fn create(&self, spec: &PrivateGatewaySpec) -> Result<PrivateGatewayStatus> {
        let spec = spec.clone().normalized();
        let ip = spec.ip_address.clone();

        spec.validate()
            .map_err(|source| GatewayError::InvalidConfiguration { ip: ip.clone(), source })?;

        let network_offering_id = self
            .resolver
            .resolve(ResourceKind::NetworkOffering, &spec.network_offering)
            .await
            .map_err(|source| GatewayError::Resolution { ip: ip.clone(), source })?;

        let request = create_request(&spec, network_offering_id);
        let created = self
            .client
            .create_private_gateway(&request)
            .await
            .map_err(|source| GatewayError::Create { ip: ip.clone(), source })?;
        info!("Created private gateway {} with ID {}", ip, created.id);

        // Only the ID of the response is used; the rest comes from a fresh read
        let seeded = PrivateGatewayStatus::from_spec(created.id, &spec);
        match self.read(&seeded).await {
            Ok(state) if state.is_absent() => {
                warn!("Private gateway {} was not found right after creation", ip);
                let mut seeded = seeded;
                seeded.message = Some(NOT_YET_VISIBLE.to_string());
                Ok(seeded)
            }
            Ok(state) => Ok(state),
            Err(GatewayError::Read { source, .. }) => Err(GatewayError::CreatedUnread {
                ip,
                state: Box::new(seeded),
                source,
            }),
            Err(err) => Err(err),
        }
    }

    /// Refresh `prior` from the remote system.
    ///
    /// A gateway that no longer exists is not an error: the returned state
    /// is absent (empty ID).
    pub async fn read(&self, prior: &PrivateGatewayStatus) -> Result<PrivateGatewayStatus> {
        if prior.is_absent() {
            return Ok(PrivateGatewayStatus::default());
        }

        match self.client.get_private_gateway_by_id(&prior.id).await {
            Ok(Some(remote)) => Ok(project(&remote, prior)),
            Ok(None) => {
                debug!("Private gateway {} does no longer exist", prior.ip_address);
                Ok(PrivateGatewayStatus::default())
            }
            Err(source) => Err(GatewayError::Read {
                ip: prior.ip_address.clone(),
                source,
            }),
        }
    }

    /// Apply an in-place change to the gateway. Only the ACL can change;
    /// any other difference is rejected before contacting the remote system.
    pub async fn update(
        &self,
        prior: &PrivateGatewayStatus,
        desired: &PrivateGatewaySpec,
    ) -> Result<PrivateGatewayStatus> {
        let desired = desired.clone().normalized();

        let fields = replacement_fields(&desired, prior);
        if !fields.is_empty() {
            return Err(GatewayError::RequiresReplacement {
                ip: prior.ip_address.clone(),
                fields,
            });
        }

        if desired.acl_id != prior.acl_id {
            let acl_id = desired
                .acl_id
                .as_deref()
                .ok_or_else(|| GatewayError::MissingAclId {
                    ip: prior.ip_address.clone(),
                })?;

            self.client
                .replace_network_acl_list(acl_id, &prior.id)
                .await
                .map_err(|source| GatewayError::ReplaceAcl {
                    ip: prior.ip_address.clone(),
                    source,
                })?;
            info!("Replaced ACL of private gateway {} with {}", prior.ip_address, acl_id);
        }

        self.read(prior).await
    }

    /// Delete the gateway. Deleting a gateway that is already gone succeeds.
    pub async fn delete(&self, state: &PrivateGatewayStatus) -> Result<()> {
        if state.is_absent() {
            return Ok(());
        }

        match self.client.delete_private_gateway(&state.id).await {
            Ok(()) => {
                info!("Deleted private gateway {} ({})", state.ip_address, state.id);
                Ok(())
            }
            Err(err) if err.is_missing_entity(&state.id) => {
                debug!("Private gateway {} was already deleted", state.ip_address);
                Ok(())
            }
            Err(source) => Err(GatewayError::Delete {
                ip: state.ip_address.clone(),
                source,
            }),
        }
    }

    /// Refresh `prior` and carry out whatever `desired` requires:
    /// create, replace, update the ACL or nothing.
    pub async fn converge(
        &self,
        desired: &PrivateGatewaySpec,
        prior: &PrivateGatewayStatus,
    ) -> Result<PrivateGatewayStatus> {
        let desired = desired.clone().normalized();
        desired
            .validate()
            .map_err(|source| GatewayError::InvalidConfiguration {
                ip: desired.ip_address.clone(),
                source,
            })?;

        let current = self.read(prior).await?;

        match plan(&desired, &current) {
            Plan::Create => {
                if !prior.is_absent() {
                    info!("Private gateway {} disappeared, recreating it", prior.ip_address);
                }
                self.create(&desired).await
            }
            Plan::Replace(fields) => {
                info!(
                    "Replacing private gateway {} because {:?} changed",
                    current.ip_address, fields
                );
                self.delete(&current).await?;
                self.create(&desired).await
            }
            Plan::UpdateAcl => self.update(&current, &desired).await,
            Plan::Noop => Ok(current),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RemoteError;
    use crate::memory::{InMemoryCloud, Operation};

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

    async fn setup() -> (Arc<InMemoryCloud>, PrivateGatewayReconciler) {
        let cloud = Arc::new(InMemoryCloud::new());
        cloud.register(ResourceKind::NetworkOffering, "DefaultOffering", "off-123").await;
        let reconciler = PrivateGatewayReconciler::new(cloud.clone());
        (cloud, reconciler)
    }

    #[tokio::test]
    async fn test_create_error_names_ip() {
        let (cloud, reconciler) = setup().await;
        cloud
            .fail_next(Operation::Create, RemoteError::Transport("connection refused".to_string()))
            .await;

        let err = reconciler.create(&spec()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error creating private gateway 10.0.0.1: transport error: connection refused"
        );
        assert_eq!(cloud.gateway_count().await, 0);
    }

    #[tokio::test]
    async fn test_invalid_spec_is_rejected_before_remote_calls() {
        let (cloud, reconciler) = setup().await;
        let mut s = spec();
        s.vlan = 5000;

        let err = reconciler.create(&s).await.unwrap_err();
        assert!(err.is_user_error());
        assert_eq!(cloud.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_read_propagates_transport_errors() {
        let (cloud, reconciler) = setup().await;
        let state = reconciler.create(&spec()).await.unwrap();
        cloud
            .fail_next(Operation::Get, RemoteError::Transport("unauthorized".to_string()))
            .await;

        let err = reconciler.read(&state).await.unwrap_err();
        assert!(matches!(err, GatewayError::Read { .. }));
        assert!(err.to_string().contains("10.0.0.1"));
    }

    #[tokio::test]
    async fn test_read_of_absent_state_skips_remote() {
        let (cloud, reconciler) = setup().await;
        cloud
            .fail_next(Operation::Get, RemoteError::Transport("unreachable".to_string()))
            .await;

        let state = reconciler.read(&PrivateGatewayStatus::default()).await.unwrap();
        assert!(state.is_absent());
    }

    #[tokio::test]
    async fn test_update_rejects_immutable_changes() {
        let (cloud, reconciler) = setup().await;
        let state = reconciler.create(&spec()).await.unwrap();
        let calls = cloud.mutation_count();

        let mut desired = spec();
        desired.vlan = 200;
        let err = reconciler.update(&state, &desired).await.unwrap_err();
        assert!(matches!(err, GatewayError::RequiresReplacement { ref fields, .. } if fields == &vec!["vlan"]));
        assert_eq!(cloud.mutation_count(), calls);
    }

    #[tokio::test]
    async fn test_delete_propagates_other_errors() {
        let (cloud, reconciler) = setup().await;
        let state = reconciler.create(&spec()).await.unwrap();
        cloud
            .fail_next(
                Operation::Delete,
                RemoteError::Api {
                    code: 530,
                    message: "Unable to delete private gateway".to_string(),
                },
            )
            .await;

        let err = reconciler.delete(&state).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error deleting private gateway for 10.0.0.1: CloudStack API error 530: Unable to delete private gateway"
        );
        assert!(cloud.gateway(&state.id).await.is_some());
    }

    /// Backend whose reads lag behind its writes
    struct LaggingCloud(InMemoryCloud);

    #[async_trait::async_trait]
    impl RemoteClient for LaggingCloud {
        async fn create_private_gateway(
            &self,
            request: &crate::client::CreatePrivateGatewayRequest,
        ) -> std::result::Result<crate::client::RemoteGateway, RemoteError> {
            self.0.create_private_gateway(request).await
        }

        async fn get_private_gateway_by_id(
            &self,
            _id: &str,
        ) -> std::result::Result<Option<crate::client::RemoteGateway>, RemoteError> {
            Ok(None)
        }

        async fn delete_private_gateway(&self, id: &str) -> std::result::Result<(), RemoteError> {
            self.0.delete_private_gateway(id).await
        }

        async fn replace_network_acl_list(
            &self,
            acl_id: &str,
            gateway_id: &str,
        ) -> std::result::Result<(), RemoteError> {
            self.0.replace_network_acl_list(acl_id, gateway_id).await
        }

        async fn lookup_ids(
            &self,
            kind: ResourceKind,
            name: &str,
        ) -> std::result::Result<Vec<String>, RemoteError> {
            self.0.lookup_ids(kind, name).await
        }
    }

    #[tokio::test]
    async fn test_create_keeps_id_when_gateway_not_yet_visible() {
        let cloud = Arc::new(LaggingCloud(InMemoryCloud::new()));
        cloud
            .0
            .register(ResourceKind::NetworkOffering, "DefaultOffering", "off-123")
            .await;
        let reconciler = PrivateGatewayReconciler::new(cloud.clone());

        let state = reconciler.create(&spec()).await.unwrap();
        assert!(!state.is_absent());
        assert_eq!(state.message.as_deref(), Some(NOT_YET_VISIBLE));
        assert!(cloud.0.gateway(&state.id).await.is_some());
        assert_eq!(cloud.0.gateway_count().await, 1);
    }

    #[tokio::test]
    async fn test_delete_of_absent_state_is_noop() {
        let (cloud, reconciler) = setup().await;
        reconciler.delete(&PrivateGatewayStatus::default()).await.unwrap();
        assert_eq!(cloud.mutation_count(), 0);
    }
}
