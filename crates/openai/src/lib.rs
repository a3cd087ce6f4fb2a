//! Chat-completions gateway for OpenAI-compatible providers.

pub mod client;
pub mod wire;

pub use client::{OpenAiConfig, OpenAiGateway};
