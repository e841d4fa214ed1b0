//! Core business logic for ClientDesk.
//!
//! This crate contains logic with ZERO web framework or database dependencies.
//!
//! # Modules
//!
//! - `storage` - Storage resolution layer: provider drivers, configuration
//!   resolver contract, and the per-tenant storage facade
//! - `auth` - Password hashing and user roles

pub mod auth;
pub mod storage;
