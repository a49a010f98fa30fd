//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - 2D math types and the shared [`math::Transform2D`]
//! - Frame time measurement for hosts
//! - Logging setup

pub mod math;
pub mod time;
pub mod logging;
