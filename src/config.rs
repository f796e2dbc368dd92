use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "patients-api";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bind address for the HTTP server
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Bind address, overridable via `PATIENTS_API_ADDR`
pub fn bind_addr() -> String {
    std::env::var("PATIENTS_API_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.into())
}

/// Get the application data directory
pub fn app_data_dir() -> PathBuf {
    let data = dirs::data_dir().expect("Cannot determine data directory");
    data.join("patients-api")
}

/// Path to the SQLite database, overridable via `PATIENTS_API_DB`
pub fn database_path() -> PathBuf {
    std::env::var("PATIENTS_API_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| app_data_dir().join("patients.db"))
}

/// Log filter used when `RUST_LOG` is not set
pub fn default_log_filter() -> &'static str {
    "info,patients_api=debug"
}
