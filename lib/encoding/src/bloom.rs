// Bloom insertion by double hashing over a keyed digest
use blindmatch_core::{BitVector, DIGEST_LEN};

fn le_u64(bytes: &[u8]) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(word)
}

/// Set `hashes` positions derived from `digest`:
/// `pos_i = (h1 + i * h2) mod bits`.
pub(crate) fn insert(vector: &mut BitVector, digest: &[u8; DIGEST_LEN], hashes: u32) {
    let bits = vector.len() as u64;
    if bits == 0 {
        return;
    }

    let h1 = le_u64(&digest[0..8]);
    // Odd step so positions do not repeat early for power-of-two sizes
    let h2 = le_u64(&digest[8..16]) | 1;

    for i in 0..u64::from(hashes) {
        let pos = h1.wrapping_add(i.wrapping_mul(h2)) % bits;
        vector.set(pos as usize);
    }
}
