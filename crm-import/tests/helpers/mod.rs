//! Test helper utilities
//!
//! Shared setup for crm-import integration tests

#![allow(dead_code)]

pub mod db_utils;
pub mod fixtures;

pub use db_utils::{create_test_db, TestEnv};
pub use fixtures::{write_csv, write_xlsx};
