//! Property-based tests for path, key and url invariants

mod determinism;
mod paths;
