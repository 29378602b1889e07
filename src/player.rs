//! The player service: one thread owning the engine and its media element,
//! driven through cloneable [`PlayerHandle`]s.

mod handle;
mod service;

use thiserror::Error;

pub use handle::{PlayerControls, PlayerHandle};
pub use service::PlayerService;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("failed to spawn player thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("player thread exited during startup")]
    Startup,
}

#[cfg(test)]
mod tests;
