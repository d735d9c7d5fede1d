//! Test utilities for FedSPARQL integration tests
//!
//! - `fake_endpoint`: scripted in-process endpoint implementing `FederatedService`
//! - `rows`: builders for terms, rows and row sources

#![allow(dead_code)]

pub mod fake_endpoint;
pub mod rows;
