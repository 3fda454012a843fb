//! Testing infrastructure
//!
//! An in-memory [`SystemState`](crate::kernel::SystemState) for running the
//! registry against hand-built live state.

pub mod fake;

pub use fake::{FakeSystem, Query};
