//! Patients API — a minimal JSON CRUD service over a single `patients`
//! table, backed by SQLite.
//!
//! Layering: HTTP router (`api`) → validation → repository (`db`) →
//! envelope response. One connection is opened per request; there is no
//! pooling and no shared mutable state.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
