use std::collections::{HashMap, HashSet};
use std::hash::{BuildHasherDefault, Hash, Hasher};

/// A `HashMap` variant backed by a fast, non-cryptographic hasher. Our maps
/// are keyed almost exclusively by tiny values (handles, interned names),
/// where FNV beats the default SipHash handily.
pub type FastHashMap<K, V> = HashMap<K, V, BuildHasherDefault<FnvHasher>>;

/// A `HashSet` variant backed by a fast, non-cryptographic hasher.
pub type FastHashSet<V> = HashSet<V, BuildHasherDefault<FnvHasher>>;

/// Hashes `v` with the same hasher backing `FastHashMap`.
pub fn hash64<T: Hash + ?Sized>(v: &T) -> u64 {
    let mut state = FnvHasher::default();
    v.hash(&mut state);
    state.finish()
}

/// 64-bits FNV-1a.
pub struct FnvHasher(u64);

impl Default for FnvHasher {
    #[inline]
    fn default() -> Self {
        FnvHasher(0xcbf2_9ce4_8422_2325)
    }
}

impl Hasher for FnvHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }

    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        let FnvHasher(mut state) = *self;

        for byte in bytes {
            state ^= u64::from(*byte);
            state = state.wrapping_mul(0x100_0000_01b3);
        }

        *self = FnvHasher(state);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn deterministic() {
        assert_eq!(hash64("timer"), hash64("timer"));
        assert_ne!(hash64("timer"), hash64("timers"));
    }
}
