//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the browsable catalogue,
//! the selection, the latest playback snapshot and the surface-only state
//! (views, notices, likes, the clip feed).

mod model;

pub use model::*;
