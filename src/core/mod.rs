pub mod cascade;
pub mod config;
pub mod conversation;
pub mod error;
pub mod message;
