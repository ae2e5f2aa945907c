//! Project store for the warehouse.
//!
//! Projects are kept as JSON documents in SQLite, indexed by group. The
//! server only reads them (lookup by id and by group); writes come from the
//! `warehouse projects import` command.

mod error;
mod projects;

pub use error::{Result, StoreError};
pub use projects::{ProjectRepository, ProjectStore};
