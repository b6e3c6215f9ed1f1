pub mod config;
pub mod constants;
pub mod credentials;
pub mod dispatch;
pub mod health;
pub mod message;
pub mod navigation;
pub mod session;
pub mod transcript;
