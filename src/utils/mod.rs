//! Utility functions and helpers
//!
//! This module contains utility functions used throughout the application.

pub mod clock;
pub mod version;

pub use clock::{Clock, ManualClock, SystemClock};
pub use version::{VERSION, get_version};
