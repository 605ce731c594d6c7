//! Common test utilities and helpers
//!
//! This module provides shared test infrastructure including:
//! - Test data factories
//! - Mock stores and brokers
//! - API test client

pub mod factories;
pub mod test_app;

pub use factories::*;
pub use mocks::*;
pub use test_app::*;
