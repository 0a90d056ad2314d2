//! Backend implementations for cbridge
//!
//! The bridge treats a backend as an opaque [`Backend`](cbridge_core::Backend)
//! instance. This crate ships [`MemoryBackend`], a deterministic in-process
//! implementation used for local development and as the reference for the
//! semantics each command is expected to have.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod memory;

pub use memory::MemoryBackend;
