//! Shared domain types for the uacl authentication gateway.
//!
//! This crate has no internal dependencies so both the storage layer and the
//! HTTP layer can build on it.

pub mod autologin;
pub mod error;
pub mod identity;
pub mod requests;
pub mod types;
