//! Infrastructure layer - key stores, signing and logging setup

pub mod api_key;
pub mod logging;
pub mod signature;
