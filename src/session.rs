//! Queue and session control: which track is selected, what the transport is
//! doing, and how the two stay in step.

mod controller;
mod state;

pub use controller::Session;
pub use state::*;

#[cfg(test)]
mod tests;
