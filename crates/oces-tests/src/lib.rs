//! Integration test crate for the OCES engine.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on the engine crates to verify they work together.

#[cfg(test)]
mod output;

#[cfg(test)]
mod input;

#[cfg(test)]
mod registry;
