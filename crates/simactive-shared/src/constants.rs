/// Application name
pub const APP_NAME: &str = "simactive";

/// Shortest accepted SIM number (digits only)
pub const SIM_NUMBER_MIN_LEN: usize = 8;

/// Longest accepted SIM number (digits only)
pub const SIM_NUMBER_MAX_LEN: usize = 15;

/// Longest accepted service name, in characters
pub const SERVICE_NAME_MAX_LEN: usize = 64;

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Default per-request deadline in milliseconds
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;

/// Database file name inside the data directory
pub const DATABASE_FILE_NAME: &str = "simactive.db";
