pub mod errors;
pub mod constants;
mod config;
mod points;
mod math_helpers;

pub use errors::SpTreeError;
pub use constants::*;
pub use config::*;
pub use points::*;
pub use math_helpers::*;

#[cfg(test)]
mod config_tests;
