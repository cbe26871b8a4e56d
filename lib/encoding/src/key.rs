//! Secret key material for the keyed hasher.
//!
//! The key is loaded once at process start and handed to the
//! [`Encoder`](crate::Encoder), which keeps only the initialized HMAC state.
//! Any failure to obtain a usable key is [`Error::KeyUnavailable`].

use blindmatch_core::{Error, Result};
use std::fmt;
use std::path::Path;

/// Env var naming the key file read by [`SecretKey::from_env`]
pub const KEY_FILE_ENV: &str = "BLINDMATCH_KEY_FILE";

pub struct SecretKey(Vec<u8>);

impl SecretKey {
    /// Shortest accepted key, in bytes
    pub const MIN_LEN: usize = 16;

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.len() < Self::MIN_LEN {
            return Err(Error::KeyUnavailable(format!(
                "key must be at least {} bytes, got {}",
                Self::MIN_LEN,
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    /// Raw key bytes from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            Error::KeyUnavailable(format!("cannot read key file {}: {}", path.display(), e))
        })?;
        Self::from_bytes(bytes)
    }

    /// Key file named by the environment variable `var`
    pub fn from_env(var: &str) -> Result<Self> {
        let path = std::env::var_os(var)
            .ok_or_else(|| Error::KeyUnavailable(format!("{} is not set", var)))?;
        Self::from_file(path)
    }

    pub(crate) fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey(<{} bytes>)", self.0.len())
    }
}

impl SecretKey {
    // Volatile writes so the wipe is not elided as a dead store before free
    fn wipe(&mut self) {
        for byte in self.0.iter_mut() {
            // SAFETY: `byte` is a valid, aligned, exclusive reference
            unsafe { std::ptr::write_volatile(byte, 0) };
        }
        std::sync::atomic::compiler_fence(std::sync::atomic::Ordering::SeqCst);
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.wipe();
    }
}
