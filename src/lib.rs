pub mod address;
pub mod chain;
pub mod config;
pub mod error;
pub mod output;
pub mod scoring;
pub mod server;
