pub mod envelope;
pub mod kdf;
pub mod signature;

pub use envelope::{EnvelopeError, decrypt, encrypt};
pub use kdf::Argon2Parameters;
pub use signature::{SignatureError, compute_fingerprint, verify_signature};
