//! # idmig-core
//!
//! Core types and error taxonomy for idmig.
//!
//! This crate provides the vocabulary shared by every other idmig crate:
//! - Source entities (users, roles, permissions, organizations, members)
//! - The platform-neutral target identity
//! - Target status and reconciliation outcome enums
//! - Password export records and bcrypt hash parsing
//! - `RemoteError`, the failure taxonomy for every remote call

pub mod entities;
pub mod enums;
pub mod errors;

pub use errors::{ErrorKind, RemoteError};
