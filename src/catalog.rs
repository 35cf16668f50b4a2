//! Track catalogs: the two ordered track lists the player switches between.
//!
//! Catalogs are fetched once at startup (both concurrently) and stay
//! immutable for the rest of the session.

mod load;
mod model;

pub use load::*;
pub use model::*;

#[cfg(test)]
mod tests;
