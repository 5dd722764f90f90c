//! Core types and definitions for the sea-surveillance radar simulation.
//!
//! This crate defines the vocabulary shared across all other crates:
//! configuration, commands, the broadcast wire message, events, errors
//! and constants. It has no dependency on threads or any transport.

pub mod commands;
pub mod config;
pub mod constants;
pub mod enums;
pub mod error;
pub mod events;
pub mod message;
pub mod types;

#[cfg(test)]
mod tests;
