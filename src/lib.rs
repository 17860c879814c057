//! sqldeck - client-side orchestration engine for an interactive SQL
//! workbench.
//!
//! Manages query editor tabs, drives query execution lifecycles, and keeps
//! an optimistic local copy of editor/table/query state synchronized with a
//! persistent backend store.

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod lifecycle;
pub mod logging;
pub mod migrate;
pub mod model;
pub mod store;
pub mod sync;
pub mod tabs;
pub mod workbench;
