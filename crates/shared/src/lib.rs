//! Shared types, errors, and configuration for ClientDesk.
//!
//! This crate provides common types used across all other crates:
//! - JWT claims and token handling
//! - Request payloads for the HTTP API
//! - Application-wide error types
//! - Configuration management

pub mod auth;
pub mod clients;
pub mod config;
pub mod error;
pub mod jwt;
pub mod storage;

pub use auth::Claims;
pub use config::{AppConfig, FallbackPolicy, StorageSettings};
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
