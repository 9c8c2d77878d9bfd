//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and colour packing
//! - Frame timing
//! - Logging initialisation

pub mod math;
pub mod time;
pub mod logging;
