//! Playlist model and persistence.
//!
//! `Track` and `Playlist` live in `playlist::model`; the on-disk store is
//! `playlist::store`. Only `{name, path}` pairs are ever written to disk:
//! resource URLs are session-scoped and minted fresh on every load.

mod model;
mod store;

pub use model::*;
pub use store::*;
