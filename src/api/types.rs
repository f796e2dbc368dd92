//! Shared state for the API layer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::Connection;

use crate::api::error::ApiError;
use crate::db;

/// Shared context for all API routes.
///
/// Holds only the immutable database path; each request opens its own
/// connection and drops it when the request ends. No pooling.
#[derive(Clone)]
pub struct ApiContext {
    db_path: Arc<PathBuf>,
}

impl ApiContext {
    pub fn new(db_path: PathBuf) -> Self {
        Self {
            db_path: Arc::new(db_path),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Open the per-request connection. Failure renders as the 500
    /// "Database connection failed" envelope and no handler logic runs
    /// after it.
    pub fn open_db(&self) -> Result<Connection, ApiError> {
        db::open_database(&self.db_path).map_err(|e| {
            tracing::error!(error = %e, "failed to open database");
            ApiError::DatabaseUnavailable
        })
    }
}
