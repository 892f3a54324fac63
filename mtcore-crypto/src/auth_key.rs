//! The 256-byte MTProto authorization key.

use crate::sha1;

/// Length of a raw authorization key.
pub const AUTH_KEY_LEN: usize = 256;

/// An authorization key plus its pre-computed 8-byte identifier.
///
/// Immutable once built; clone freely to share between the connection and
/// the protocol state.
#[derive(Clone)]
pub struct AuthKey {
    pub(crate) data: [u8; AUTH_KEY_LEN],
    pub(crate) key_id: [u8; 8],
}

impl AuthKey {
    /// Construct from the raw key produced by the key exchange.
    pub fn from_bytes(data: [u8; AUTH_KEY_LEN]) -> Self {
        let sha = sha1!(&data);
        let mut key_id = [0u8; 8];
        key_id.copy_from_slice(&sha[12..20]);
        Self { data, key_id }
    }

    /// Construct from a slice, returning `None` unless it is exactly 256 bytes.
    pub fn from_slice(data: &[u8]) -> Option<Self> {
        let data: [u8; AUTH_KEY_LEN] = data.try_into().ok()?;
        Some(Self::from_bytes(data))
    }

    /// The raw key bytes.
    pub fn to_bytes(&self) -> [u8; AUTH_KEY_LEN] { self.data }

    /// Borrow the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; AUTH_KEY_LEN] { &self.data }

    /// The 8-byte key identifier (`SHA-1(key)[12..20]`).
    pub fn key_id(&self) -> [u8; 8] { self.key_id }
}

impl std::fmt::Debug for AuthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthKey(id={})", u64::from_le_bytes(self.key_id))
    }
}

impl PartialEq for AuthKey {
    fn eq(&self, other: &Self) -> bool { self.key_id == other.key_id }
}

impl Eq for AuthKey {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_id_is_sha1_tail() {
        let data = [3u8; AUTH_KEY_LEN];
        let key = AuthKey::from_bytes(data);
        assert_eq!(key.key_id(), sha1!(&data)[12..20]);
    }

    #[test]
    fn exposes_the_raw_key() {
        let data: [u8; AUTH_KEY_LEN] = std::array::from_fn(|i| i as u8);
        let key = AuthKey::from_slice(&data).unwrap();
        assert_eq!(key.as_bytes(), &data);
        assert_eq!(key.to_bytes(), data);
        assert_eq!(key, AuthKey::from_bytes(key.to_bytes()));
    }

    #[test]
    fn from_slice_rejects_wrong_length() {
        assert!(AuthKey::from_slice(&[0u8; 255]).is_none());
        assert!(AuthKey::from_slice(&[0u8; 256]).is_some());
    }

    #[test]
    fn debug_does_not_leak_key_material() {
        let key = AuthKey::from_bytes([0xAB; AUTH_KEY_LEN]);
        let dbg = format!("{key:?}");
        assert!(dbg.starts_with("AuthKey(id="));
        assert!(!dbg.contains("171, 171"));
    }
}
