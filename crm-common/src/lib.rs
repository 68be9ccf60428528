//! # CRM Common Library
//!
//! Shared code for the CRM lead services including:
//! - Database initialization and schema
//! - Configuration loading and root folder resolution
//! - Acting-user (tenancy) context
//! - Common error type

pub mod config;
pub mod db;
pub mod error;
pub mod tenancy;

pub use error::{Error, Result};
pub use tenancy::ActingUser;
