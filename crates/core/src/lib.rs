pub mod character;
pub mod config;
pub mod direction;
pub mod error;
pub mod form;
pub mod identity;
pub mod loop_encoder;
pub mod naming;
pub mod ports;
pub mod poses;
pub mod prompts;
pub mod retry;
pub mod types;
