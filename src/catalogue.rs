//! The static catalogue: tracks, artists and clips bundled with the app.
//!
//! Everything here is read-only after load. Lookups return `None` when a
//! record does not exist; callers decide how to present "not found".

mod lookup;
mod model;

pub use lookup::*;
pub use model::*;

#[cfg(test)]
mod tests;
