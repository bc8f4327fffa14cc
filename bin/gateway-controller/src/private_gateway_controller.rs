//! PrivateGateway controller for reconciling PrivateGateway resources

use crate::config::ControllerConfig;
use futures::StreamExt;
use gateway_api::{PrivateGateway, PrivateGatewayStatus};
use gateway_core::{GatewayError, PrivateGatewayReconciler};
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use kube_runtime::finalizer::{finalizer, Event};
use kube_runtime::{controller::Action, Controller};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Finalizer that keeps a PrivateGateway around until its remote gateway is deleted
pub const FINALIZER_NAME: &str = "network.gateway.io/private-gateway-cleanup";

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("{0}")]
    Gateway(#[from] GatewayError),

    #[error("Kubernetes error: {0}")]
    Kubernetes(#[from] kube::Error),

    #[error("Finalizer error: {0}")]
    Finalizer(#[source] Box<kube_runtime::finalizer::Error<ReconcileError>>),
}

struct Context {
    client: Client,
    reconciler: PrivateGatewayReconciler,
    config: ControllerConfig,
}

pub struct PrivateGatewayController {
    client: Client,
    context: Arc<Context>,
}

impl PrivateGatewayController {
    pub fn new(client: Client, reconciler: PrivateGatewayReconciler, config: ControllerConfig) -> Self {
        let context = Arc::new(Context {
            client: client.clone(),
            reconciler,
            config,
        });
        Self { client, context }
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        info!("Starting PrivateGateway reconciliation");

        let gateways: Api<PrivateGateway> = Api::all(self.client.clone());

        // Watch for PrivateGateway changes
        let controller = Controller::new(gateways, Default::default());

        let mut stream = controller
            .run(reconcile, error_policy, self.context.clone())
            .boxed();

        // Process the reconciliation stream
        while let Some(item) = stream.next().await {
            match item {
                Ok((gateway, _)) => debug!("Reconciled PrivateGateway {}", gateway.name),
                Err(e) => error!("Error in reconciliation stream: {}", e),
            }
        }

        Ok(())
    }
}

async fn reconcile(gateway: Arc<PrivateGateway>, ctx: Arc<Context>) -> Result<Action, ReconcileError> {
    let namespace = gateway.namespace().unwrap_or_else(|| "default".to_string());
    let api: Api<PrivateGateway> = Api::namespaced(ctx.client.clone(), &namespace);
    let (api_ref, ctx_ref) = (&api, ctx.as_ref());

    finalizer(&api, FINALIZER_NAME, gateway, |event| async move {
        match event {
            Event::Apply(gateway) => apply(&gateway, api_ref, ctx_ref).await,
            Event::Cleanup(gateway) => cleanup(&gateway, ctx_ref).await,
        }
    })
    .await
    .map_err(|e| ReconcileError::Finalizer(Box::new(e)))
}

async fn apply(
    gateway: &PrivateGateway,
    api: &Api<PrivateGateway>,
    ctx: &Context,
) -> Result<Action, ReconcileError> {
    let name = gateway.name_any();
    info!(
        "Reconciling PrivateGateway {}/{}",
        gateway.namespace().unwrap_or_else(|| "default".to_string()),
        name
    );

    let prior = gateway.status.clone().unwrap_or_default();
    match ctx.reconciler.converge(&gateway.spec, &prior).await {
        Ok(mut state) => {
            state.ready = !state.is_absent() && state.message.is_none();
            patch_status(api, &name, &state).await?;

            if state.ready {
                Ok(Action::requeue(ctx.config.requeue_interval))
            } else {
                Ok(Action::requeue(ctx.config.error_requeue_interval))
            }
        }
        Err(err) => {
            // Keep the ID of a gateway created before the failure
            let mut state = err.created_state().cloned().unwrap_or(prior);
            state.ready = false;
            state.message = Some(err.to_string());
            patch_status(api, &name, &state).await?;
            Err(err.into())
        }
    }
}

async fn cleanup(gateway: &PrivateGateway, ctx: &Context) -> Result<Action, ReconcileError> {
    let state = gateway.status.clone().unwrap_or_default();
    info!("Cleaning up PrivateGateway {} ({})", gateway.name_any(), state.ip_address);

    ctx.reconciler.delete(&state).await?;
    Ok(Action::await_change())
}

async fn patch_status(
    api: &Api<PrivateGateway>,
    name: &str,
    status: &PrivateGatewayStatus,
) -> Result<(), kube::Error> {
    let patch = json!({ "status": status });
    api.patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?;
    Ok(())
}

fn error_policy(gateway: Arc<PrivateGateway>, err: &ReconcileError, ctx: Arc<Context>) -> Action {
    warn!("Error reconciling PrivateGateway {}: {}", gateway.name_any(), err);
    Action::requeue(ctx.config.error_requeue_interval)
}
