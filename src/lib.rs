pub mod cli;
pub mod compose;
pub mod config;
mod error;
pub mod face;
pub mod features;
pub mod matcher;
pub mod utils;

pub use config::Opts;
pub use error::{EncodingError, Error, ImageSlot, Result};
