// src/config/mod.rs
pub mod client;

pub use client::{ClientConfig, DEFAULT_ENDPOINT, ENV_CONFIG_PATH, ENV_ENDPOINT, ENV_TOKEN};
