//! Row structs and DTOs for the credential tables.
//!
//! Each submodule contains a `FromRow` entity matching the database row and,
//! where rows are created by callers, a create DTO.

pub mod autologin;
pub mod token;
pub mod user;
