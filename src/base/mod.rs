//! Core components, types, and utilities for the message-triage service.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - The domain error taxonomy.
//! - Ticket and triage types plus result aliases.

pub mod config;
pub mod error;
pub mod types;
