//! Keyed digests (HMAC-SHA256) with domain separation.
//!
//! Every input is framed as `len(domain) || domain || (len(part) || part)*`
//! with 64-bit little-endian lengths, so the same token under two index ids
//! or split across parts differently never produces the same digest.

use crate::key::SecretKey;
use blindmatch_core::{Error, Result, DIGEST_LEN};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub(crate) struct KeyedHasher {
    prototype: HmacSha256,
}

impl KeyedHasher {
    pub(crate) fn new(key: &SecretKey) -> Result<Self> {
        let prototype = HmacSha256::new_from_slice(key.expose())
            .map_err(|_| Error::KeyUnavailable("key rejected by HMAC".to_string()))?;
        Ok(Self { prototype })
    }

    pub(crate) fn digest(&self, domain: &str, parts: &[&[u8]]) -> [u8; DIGEST_LEN] {
        let mut mac = self.prototype.clone();
        mac.update(&(domain.len() as u64).to_le_bytes());
        mac.update(domain.as_bytes());
        for part in parts {
            mac.update(&(part.len() as u64).to_le_bytes());
            mac.update(part);
        }
        mac.finalize().into_bytes().into()
    }
}
