pub mod completion;
pub mod config;
pub mod constants;
pub mod message;
pub mod secrets;
pub mod session;
