//! The concrete `v0.0.39` REST surface (spec §4.I/§6): per-resource
//! handlers, the path-to-[`operation::Operation`] table, the shared
//! [`state::AppState`], and the Axum transport that ties them together.
//!
//! This crate is the only one that knows HTTP exists — everything below
//! it (`slurmrest`, `slurmrest-parsers`, `slurmrest-backend`) works in
//! terms of the data tree and the backend RPC traits alone.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod app;
pub mod handlers;
pub mod operation;
pub mod state;
mod support;

pub use app::Service;
pub use operation::{Operation, Routes};
pub use state::AppState;
