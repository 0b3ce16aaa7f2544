//! Demo portal over the mock generation simulator.

pub mod config;
pub mod demo;
