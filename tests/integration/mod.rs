//! Integration tests for the ro node engine

mod asset_resolution;
mod cache_integration;
mod cycle_detection;
mod fingerprint_determinism;
mod related_nodes;
