//! Benchmark utilities for colony_ecs.
//!
//! - **Colony benchmarks**: slab-backed insert, erase and iteration in isolation
//! - **Registry benchmarks**: create, destroy, emplace/remove, and view iteration
//! - **Churn**: a seeded, repeatable mix of creates and destroys
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench -p colony_bench
//!
//! # Run one group
//! cargo bench -p colony_bench -- range
//! ```
//!
//! Results are written to `target/criterion/` with HTML reports.

pub mod churn;
pub mod components;
