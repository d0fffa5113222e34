pub mod activation;
pub mod registry;
