//! Configuration management
//!
//! This module handles loading and validating the service configuration.

pub mod loader;
pub mod settings;

pub use loader::ConfigLoader;
pub use settings::Settings;

// Environment variables are process-global; tests that touch them take this lock.
#[cfg(test)]
pub(crate) static ENV_TEST_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
