//! Domain types and pure logic for the Meranti studio simulator.
//!
//! Nothing here performs I/O or waits: parameter clamping, seed
//! resolution, the job lifecycle, preset/template catalogues and the canned
//! chat and ticket content all live in this crate so that the simulator and
//! any future real backend share one definition.

pub mod chat;
pub mod content;
pub mod error;
pub mod generation;
pub mod inference;
pub mod job;
pub mod naming;
pub mod preset;
pub mod seed;
pub mod ticket;
pub mod types;
