use anyhow::Result;
use gateway_api::PrivateGateway;
use gateway_core::{InMemoryCloud, PrivateGatewayReconciler, ResourceKind};
use kube::{Client, CustomResourceExt};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod private_gateway_controller;

use config::ControllerConfig;
use private_gateway_controller::PrivateGatewayController;

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::args().any(|arg| arg == "--print-crd") {
        print!("{}", serde_yaml::to_string(&PrivateGateway::crd())?);
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting gateway-controller...");

    let config = ControllerConfig::from_env()?;

    // Standalone mode: gateways live in the in-process backend
    let cloud = Arc::new(InMemoryCloud::new());
    for (name, id) in &config.network_offerings {
        cloud.register(ResourceKind::NetworkOffering, name, id).await;
    }
    for (name, id) in &config.network_acls {
        cloud.register(ResourceKind::NetworkAcl, name, id).await;
    }
    info!(
        "Loaded {} network offerings and {} ACL lists",
        config.network_offerings.len(),
        config.network_acls.len()
    );

    let reconciler = PrivateGatewayReconciler::new(cloud);
    let client = Client::try_default().await?;
    let controller = PrivateGatewayController::new(client, reconciler, config);

    // Start PrivateGateway reconciliation
    tokio::spawn(async move {
        if let Err(e) = controller.run().await {
            error!("PrivateGateway controller error: {}", e);
        }
    });

    // Keep the process alive
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting...");

    Ok(())
}
