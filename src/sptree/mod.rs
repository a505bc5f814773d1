mod cell;
mod sp_tree;
pub mod forces;

pub use cell::*;
pub use sp_tree::*;
pub use forces::*;

#[cfg(test)]
mod cell_tests;
