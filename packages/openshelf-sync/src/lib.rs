//! Per-entity state stores for the Open Shelf catalog.
//!
//! Each store owns one entity's local snapshot for the lifetime of the
//! view that holds it, and synchronizes that snapshot with the hosted
//! backend through the [`CatalogBackend`] seam. The contract per store:
//!
//! - `refetch()` transitions to loading, runs the adapter call, then
//!   lands in ready (data set, error cleared) or errored (message set,
//!   previous data kept).
//! - Snapshots fan out through `tokio::sync::watch`; `subscribe()` gives
//!   a receiver, `snapshot()` the current value.
//! - Stores whose dependency is an identifier treat `None` as "do not
//!   fetch" and hold `loading = true` with empty data until one arrives.
//! - Every fetch carries a generation stamp; a response that was
//!   superseded by a newer fetch or a dependency change is discarded
//!   rather than overwriting fresher state.

mod backend;
mod categories;
mod favorites;
mod resources;
mod session;
mod state;

pub use backend::CatalogBackend;
pub use categories::CategoryStore;
pub use favorites::FavoriteStore;
pub use resources::{ResourceListStore, ResourceStore};
pub use session::SessionStore;
pub use state::Snapshot;
