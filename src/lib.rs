//! runtimetest: conformance checks for a running container
//!
//! Run inside a container, the binary compares what the process can observe
//! about itself (mounts, capabilities, identity, devices, kernel parameters)
//! with the bundle's `config.json` and reports one TAP line per check.
//!
//! # Architecture
//!
//! ## Configuration ([`config`])
//! - [`config::spec`]: The configuration document and its loader
//! - [`config::schema`]: Mandatory-field schema walk
//! - [`config::defaults`]: Default filesystems, devices and symlinks
//! - [`config::types`]: Requirement levels, platforms and load errors
//!
//! ## Kernel State ([`kernel`])
//! - [`kernel::SystemState`]: Every live read the checks perform
//! - [`kernel::mount`]: Mount table from `/proc/self/mountinfo`
//! - [`kernel::capabilities`]: Capability sets and `no_new_privs`
//! - [`kernel::filesystem`]: stat, device numbers, read and write probes
//!
//! ## Checks ([`checks`])
//! - [`checks::registry`]: Ordered list of checks with level and platform
//!
//! ## Execution and Verdict ([`exec`], [`verdict`])
//! - [`exec::runner`]: Runs the registry against one system
//! - [`verdict::grade`]: Compliance grading and the combined error
//! - [`verdict::report`]: TAP output and the stderr summary
//!
//! ## Testing Infrastructure ([`testing`])
//! - [`testing::FakeSystem`]: In-memory live state

// Configuration
pub mod config;

// Kernel State
pub mod kernel;

// Checks
pub mod checks;

// Execution and Verdict
pub mod exec;
pub mod verdict;

// Utilities
pub mod utils;

// Testing Infrastructure
pub mod testing;

// CLI entrypoint wiring for the runtimetest binary.
pub mod cli;

pub use config::types::{ComplianceLevel, Platform, Result, RuntimeTestError};
