//! Bridge Integration Tests
//!
//! End-to-end tests through the public `cbridge` API:
//! - Request admission and rejection
//! - Worker strategy ordering and drain-on-destroy
//! - Dirty offload strategy
//! - Configuration files
//! - Reply encoding

mod common;

mod config;
mod dirty;
mod replies;
mod scenarios;
