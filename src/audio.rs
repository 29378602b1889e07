//! Audio output: the rodio-backed media element and where its bytes come from.

mod element;
mod loader;

pub use element::RodioElement;
pub use loader::{CachedLoader, SourceLoader};

#[cfg(test)]
mod tests;
