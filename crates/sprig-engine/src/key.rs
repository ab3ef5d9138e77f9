use std::fmt;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Hashed logical name (pipelines, shader files, textures, sprites).
///
/// Hashing is FNV-1a over the UTF-8 bytes and can run at compile time:
///
/// ```
/// use sprig_engine::NameKey;
/// const SPRITE: NameKey = NameKey::new("sprite");
/// assert_eq!(SPRITE, NameKey::from("sprite"));
/// ```
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NameKey(u64);

impl NameKey {
    #[inline]
    pub const fn new(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = FNV_OFFSET;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<&str> for NameKey {
    #[inline]
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Debug for NameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NameKey({:#018x})", self.0)
    }
}
