pub mod encoding;
pub mod expiry;
pub mod params;
pub mod path;
pub mod source;
