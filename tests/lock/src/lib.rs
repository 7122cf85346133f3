//! Shared helpers for the cross-crate lock tests.

pub mod fixture_helpers;
