pub mod app;
pub mod attachments;
pub mod catalog;
pub mod chat_client;
pub mod config;
pub mod error;
pub mod keyring;
pub mod message;
pub mod providers;
