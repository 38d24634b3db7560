pub mod anthropic;
pub mod azure;
pub mod base;
pub mod databricks;
pub mod factory;
pub mod openai;
pub mod resolver;
pub mod utils;

#[cfg(test)]
pub mod mock;
