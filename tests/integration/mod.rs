//! Integration tests for the alert data API
//!
//! These tests verify the behavior of the endpoints over in-memory stores,
//! with the full router, query parsing and envelope rendering in the path.

mod alerts_api_tests;
