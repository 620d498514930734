//! Command line entry points

pub mod server;

pub use server::{ServerArgs, run_server_mode};
