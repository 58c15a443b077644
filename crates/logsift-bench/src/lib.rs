//! Logsift Benchmark Suite
//!
//! Criterion benchmarks for filter evaluation over generated log blocks.
//!
//! # Benchmark Categories
//!
//! - **Filter**: Leaf filters, boolean trees and time filters on both
//!   evaluation surfaces
//! - **Bloom**: Block pruning with and without bloom filters

pub mod fixtures;
pub mod harness;

pub use fixtures::{generate_block, generate_messages, Scale};
pub use harness::{init_tracing, TestContext};
