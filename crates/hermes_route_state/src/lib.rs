pub mod error;
pub mod problem;
pub mod solution;
pub mod state;
pub mod updaters;
mod utils;

#[cfg(test)]
pub(crate) mod test_utils;
