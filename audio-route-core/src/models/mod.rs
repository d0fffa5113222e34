pub mod config;
pub mod devices;
pub mod error;
pub mod snapshot;
pub mod usecase;
