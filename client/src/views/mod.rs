//! Derived, memoized projections of [`crate::app::AppState`]
//!
//! Selectors here are pure. Their memoized forms key on the pointer identity
//! of the collections they read, so a projection is recomputed only when one
//! of its inputs was replaced.

pub mod map_view;
pub mod memo;

pub use map_view::{MapView, MapViewSelector};
pub use memo::{ByAddress, Memo};
