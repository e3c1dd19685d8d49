pub mod data;
pub mod io;
pub mod printing;
pub mod store;

pub use data::{ColorScheme, Config};
pub use io::ConfigError;
pub use store::ConfigStore;
