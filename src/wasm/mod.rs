//! WebAssembly bindings for the lib316 simulator.
//!
//! This module provides JavaScript-callable interfaces to the 316/516 CPU,
//! with I/O devices implemented as JavaScript callbacks.

#[cfg(feature = "wasm")]
pub mod api;

#[cfg(feature = "wasm")]
pub use api::Emulator316;
