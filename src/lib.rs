pub mod ai;
pub mod config;
pub mod db;
pub mod error;
pub mod server;
pub mod utils;

pub use error::LearnifyError;
