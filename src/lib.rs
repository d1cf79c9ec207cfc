//! # UFS
//!
//! Facade over the upload gateway workspace. Re-exports the store contract
//! and the HTTP gateway so end-to-end tests and embedders need one import.

pub use ufs_gateway as gateway;
pub use ufs_store as store;
