#![forbid(unsafe_code)]

pub mod age;
pub mod cli;
pub mod client;
pub mod config;
pub mod discussion;
pub mod extract;
pub mod formats;
pub mod logging;
pub mod merge;
pub mod section;
pub mod slurp;
pub mod store;
pub mod thread;
