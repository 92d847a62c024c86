pub mod domain;
pub mod error;
pub mod moderation;
pub mod reply;
pub mod store;
pub mod types;
