/// API version v1alpha1 for private gateway CRDs

pub mod private_gateway;

pub use private_gateway::{PrivateGateway, PrivateGatewaySpec, PrivateGatewayStatus};

/// API group for private gateway resources
pub const API_GROUP: &str = "network.gateway.io";
/// API version for private gateway resources
pub const API_VERSION: &str = "v1alpha1";
