/// Number of bits used to index the hash tables
pub const TABLE_BITS: u32 = 15;
pub const TABLE_SIZE: usize = 1 << TABLE_BITS;

const PRIME_4_BYTES: u32 = 2654435761;
const PRIME_7_BYTES: u64 = 58295818150454627;

/// Hashes a prefix of the little endian word loaded at a position into a table index.
pub trait PrefixHash {
    /// hash of a fixed number of low bytes of `cv`, always < TABLE_SIZE
    fn hash(cv: u64) -> usize;
}

/// Hash of the first 4 bytes, used for the single entry table.
pub struct Hash4;

impl Hash4 {
    #[inline(always)]
    pub fn hash_u32(u: u32) -> usize {
        (u.wrapping_mul(PRIME_4_BYTES) >> (32 - TABLE_BITS)) as usize
    }
}

impl PrefixHash for Hash4 {
    #[inline(always)]
    fn hash(cv: u64) -> usize {
        Self::hash_u32(cv as u32)
    }
}

/// Hash of the first 7 bytes, used for the chained table.
pub struct Hash7;

impl PrefixHash for Hash7 {
    #[inline(always)]
    fn hash(cv: u64) -> usize {
        ((cv << (64 - 56)).wrapping_mul(PRIME_7_BYTES) >> (64 - TABLE_BITS)) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_stay_in_table() {
        for cv in [0u64, 1, u64::MAX, 0x0123_4567_89ab_cdef, 0xdead_beef] {
            assert!(Hash4::hash(cv) < TABLE_SIZE);
            assert!(Hash7::hash(cv) < TABLE_SIZE);
        }
    }

    #[test]
    fn hashes_ignore_bytes_past_prefix() {
        let cv = 0x1122_3344_5566_7788u64;

        for hidden in 0..=255u64 {
            // only the low 4 bytes count
            assert_eq!(Hash4::hash(cv), Hash4::hash((cv & 0xffff_ffff) | (hidden << 40)));

            // only the low 7 bytes count
            assert_eq!(Hash7::hash(cv), Hash7::hash((cv & 0x00ff_ffff_ffff_ffff) | (hidden << 56)));
        }
    }
}
