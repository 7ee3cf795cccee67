//! Library crate for hostprobe-rs: concurrent common-port probing and device guessing.
pub mod classify;
pub mod http_check;
pub mod logging;
pub mod ports;
pub mod prober;
pub mod results_log;
pub mod scanner;
pub mod types;
