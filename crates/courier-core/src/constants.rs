/// Route component constants shared across crates
pub const DOWNLOAD_ROUTE_COMPONENT: &str = "download";
pub const DOWNLOAD_ROUTE_PREFIX: &str = const_str::concat!("/", DOWNLOAD_ROUTE_COMPONENT);

pub const HEALTHCHECK_ROUTE_COMPONENT: &str = "healthcheck";
pub const HEALTHCHECK_ROUTE_PREFIX: &str = const_str::concat!("/", HEALTHCHECK_ROUTE_COMPONENT);

/// Query parameter names accepted on the download route
pub mod query {
    pub const ENVELOPE: &str = "enc";
    pub const URL: &str = "url";
    pub const FILENAME: &str = "filename";
    pub const EXPIRE: &str = "expire";
    pub const SIGN: &str = "sign";
}

/// Prefix for environment variable overrides, e.g. `COURIER_DOWNLOAD__SIGN_KEY`.
pub const ENV_PREFIX: &str = "COURIER";

pub const DEFAULT_PORT: u16 = 18080;
pub const DEFAULT_DOWNLOAD_DIR: &str = "./files";
