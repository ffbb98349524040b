//! Test utilities and helpers for the bytereader crates.
//!
//! This crate provides:
//! - [`ToyValue`], a small reference-counted host value space implementing
//!   the capability surface, together with a slot stack ([`ToyStack`])
//! - Data generation for byte payloads and foreign-owned buffers
//!
//! # Usage
//!
//! This crate is intended for use within the bytereader test suites only.

pub mod data_gen;
pub mod toy;

pub use toy::{StackSlot, ToyDelegate, ToyStack, ToyValue};
