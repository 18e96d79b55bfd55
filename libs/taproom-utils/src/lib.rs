#![forbid(unsafe_code)]
//! Small utilities shared across the taproom workspace.

mod secret_string;

pub mod humantime_duration;

pub use secret_string::SecretString;
