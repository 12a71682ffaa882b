pub mod cache;
pub mod compare;
pub mod config;
pub mod discovery;
pub mod error;
pub mod input;
pub mod model;
pub mod output;
pub mod scoring;
pub mod telemetry;

pub use error::EngineError;
