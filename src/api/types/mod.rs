//! Request and response types of the provisioning API

pub mod body;
pub mod error;
pub mod provision;

pub use body::RawBody;
pub use error::ApiError;
pub use provision::ProvisionResponse;
