#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
pub mod config;
pub mod error;
pub mod logging;
pub mod node;
pub mod simulate;
pub mod util;
