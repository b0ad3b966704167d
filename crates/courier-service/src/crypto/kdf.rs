//! Argon2id key derivation for envelope encryption.

use argon2::{Algorithm, Argon2, Params, Version};
use zeroize::Zeroizing;

/// Tunable Argon2id cost parameters.
///
/// These are not carried in the envelope, so changing [`ENVELOPE_KDF_PARAMS`]
/// invalidates every previously issued envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Parameters {
    pub time_cost: u32,
    pub memory_cost_kib: u32,
    pub parallelism: u32,
    pub key_length: usize,
}

/// Parameters used for every envelope encrypt/decrypt call.
pub const ENVELOPE_KDF_PARAMS: Argon2Parameters = Argon2Parameters {
    time_cost: 2,
    memory_cost_kib: 8 * 1024,
    parallelism: 2,
    key_length: 32,
};

impl Argon2Parameters {
    /// ## Summary
    /// Derives a key of `key_length` bytes from `secret` and `salt`.
    ///
    /// The returned buffer is zeroed when dropped.
    ///
    /// ## Errors
    /// Returns the underlying Argon2 error when the parameters or salt are out of range.
    pub fn derive_key(
        &self,
        secret: &[u8],
        salt: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, argon2::Error> {
        let params = Params::new(
            self.memory_cost_kib,
            self.time_cost,
            self.parallelism,
            Some(self.key_length),
        )?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut key = Zeroizing::new(vec![0u8; self.key_length]);
        argon2.hash_password_into(secret, salt, &mut key)?;
        Ok(key)
    }
}
