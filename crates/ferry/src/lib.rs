pub mod agent;
pub mod errors;
pub mod message;
pub mod providers;
pub mod workspace;
