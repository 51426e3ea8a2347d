pub mod cli;
pub mod client;
pub mod config;
pub mod generator;
pub mod logging;
pub mod storage;
