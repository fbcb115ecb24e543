pub mod config;
pub mod detection;
pub mod display;
pub mod font;
pub mod frame;
pub mod session;
pub mod source;

pub use config::Config;
