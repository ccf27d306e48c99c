//! Integration test suite for tether.
//!
//! These tests exercise the full path from submission to a terminal
//! result, including mode selection, gating, the approval workflow, and
//! the audit trail. Everything runs against the in-crate simulated
//! executor, so the suite is deterministic and makes no external calls.
//!
//! # Test Categories
//!
//! - `pipeline`: end-to-end task lifecycle behavior
//! - `gating`: oversight behavior observed through full task runs

mod fixtures;

mod gating;
mod pipeline;
