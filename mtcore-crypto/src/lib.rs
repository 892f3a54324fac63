//! Cryptographic primitives for the MTProto 2.0 session core.
//!
//! Provides:
//! - AES-256-IGE encryption/decryption
//! - SHA-1 / SHA-256 hash macros
//! - `AuthKey`: 256-byte authorization key
//! - `calc_key`: per-message AES key/IV derivation
//! - MTProto 2.0 frame encryption / decryption

#![deny(unsafe_code)]

pub mod aes;
mod auth_key;
mod deque_buffer;
mod sha;

pub use auth_key::{AUTH_KEY_LEN, AuthKey};
pub use deque_buffer::DequeBuffer;
pub use sha::sha256;

#[doc(hidden)]
pub mod __private {
    pub use ::sha1;
    pub use ::sha2;
}

/// Length of `auth_key_id || msg_key` at the start of every encrypted frame.
pub const FRAME_HEADER_LEN: usize = 8 + 16;

// ─── MTProto 2.0 encrypt / decrypt ───────────────────────────────────────────

/// Errors from [`decrypt_data_v2`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecryptError {
    /// Ciphertext too short or not block-aligned.
    InvalidBuffer,
    /// The `auth_key_id` in the ciphertext does not match our key.
    AuthKeyMismatch,
    /// The `msg_key` in the ciphertext does not match our computed value.
    MessageKeyMismatch,
}

impl std::fmt::Display for DecryptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBuffer => write!(f, "invalid ciphertext buffer length"),
            Self::AuthKeyMismatch => write!(f, "auth_key_id mismatch"),
            Self::MessageKeyMismatch => write!(f, "msg_key mismatch"),
        }
    }
}
impl std::error::Error for DecryptError {}

/// Which peer produced a frame.
///
/// Selects the `x` offset into the auth key: 0 for client→server traffic,
/// 8 for server→client. Both sides derive with the *sender's* offset.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Side {
    /// The frame originates from this client.
    Client,
    /// The frame originates from the server.
    Server,
}

impl Side {
    /// Byte offset into the auth key used by this side.
    pub const fn x(self) -> usize {
        match self { Side::Client => 0, Side::Server => 8 }
    }
}

/// Derive the AES-256-IGE `(key, iv)` for a message.
///
/// ```text
/// a   = SHA256(msg_key || auth_key[x .. x+36])
/// b   = SHA256(auth_key[x+40 .. x+76] || msg_key)
/// key = a[0..8]  || b[8..24] || a[24..32]
/// iv  = b[0..8]  || a[8..24] || b[24..32]
/// ```
pub fn calc_key(auth_key: &AuthKey, msg_key: &[u8; 16], side: Side) -> ([u8; 32], [u8; 32]) {
    let x = side.x();
    let sha_a = sha256!(msg_key, &auth_key.data[x..x + 36]);
    let sha_b = sha256!(&auth_key.data[40 + x..40 + x + 36], msg_key);

    let mut aes_key = [0u8; 32];
    aes_key[..8].copy_from_slice(&sha_a[..8]);
    aes_key[8..24].copy_from_slice(&sha_b[8..24]);
    aes_key[24..].copy_from_slice(&sha_a[24..]);

    let mut aes_iv = [0u8; 32];
    aes_iv[..8].copy_from_slice(&sha_b[..8]);
    aes_iv[8..24].copy_from_slice(&sha_a[8..24]);
    aes_iv[24..].copy_from_slice(&sha_b[24..]);

    (aes_key, aes_iv)
}

/// `msg_key` for `plaintext` (already padded) sent by `side`.
pub fn calc_msg_key(auth_key: &AuthKey, plaintext: &[u8], side: Side) -> [u8; 16] {
    let x = side.x();
    let large = sha256!(&auth_key.data[88 + x..88 + x + 32], plaintext);
    let mut msg_key = [0u8; 16];
    msg_key.copy_from_slice(&large[8..24]);
    msg_key
}

/// Random padding length: at least 12 bytes, total a multiple of 16.
pub fn padding_len(len: usize) -> usize {
    (16 - (len + 12) % 16) % 16 + 12
}

/// Encrypt `buffer` in place as a client frame.
///
/// After this call `buffer` contains `key_id || msg_key || ciphertext`.
pub fn encrypt_data_v2(buffer: &mut DequeBuffer, auth_key: &AuthKey) -> Result<(), getrandom::Error> {
    encrypt_data_v2_as(buffer, auth_key, Side::Client)
}

/// Encrypt `buffer` in place as a frame sent by `side`.
pub fn encrypt_data_v2_as(buffer: &mut DequeBuffer, auth_key: &AuthKey, side: Side) -> Result<(), getrandom::Error> {
    let mut rnd = [0u8; 32];
    getrandom::getrandom(&mut rnd)?;
    do_encrypt_data_v2(buffer, auth_key, side, &rnd);
    Ok(())
}

pub(crate) fn do_encrypt_data_v2(buffer: &mut DequeBuffer, auth_key: &AuthKey, side: Side, rnd: &[u8; 32]) {
    let pad = padding_len(buffer.len());
    buffer.extend(rnd.iter().take(pad).copied());

    let msg_key = calc_msg_key(auth_key, buffer.as_ref(), side);
    let (key, iv) = calc_key(auth_key, &msg_key, side);
    aes::ige_encrypt(buffer.as_mut(), &key, &iv);

    buffer.extend_front(&msg_key);
    buffer.extend_front(&auth_key.key_id);
}

/// Decrypt a frame sent by the server.
///
/// `buffer` must start with `key_id || msg_key || ciphertext`.
/// On success returns the slice of `buffer` holding the padded plaintext.
pub fn decrypt_data_v2<'a>(buffer: &'a mut [u8], auth_key: &AuthKey) -> Result<&'a mut [u8], DecryptError> {
    decrypt_data_v2_as(buffer, auth_key, Side::Server)
}

/// Decrypt a frame that was produced by `side`.
pub fn decrypt_data_v2_as<'a>(buffer: &'a mut [u8], auth_key: &AuthKey, side: Side) -> Result<&'a mut [u8], DecryptError> {
    if buffer.len() < 8 {
        return Err(DecryptError::InvalidBuffer);
    }
    if auth_key.key_id != buffer[..8] {
        return Err(DecryptError::AuthKeyMismatch);
    }
    if buffer.len() < FRAME_HEADER_LEN || (buffer.len() - FRAME_HEADER_LEN) % 16 != 0 {
        return Err(DecryptError::InvalidBuffer);
    }
    let mut msg_key = [0u8; 16];
    msg_key.copy_from_slice(&buffer[8..FRAME_HEADER_LEN]);

    let (key, iv) = calc_key(auth_key, &msg_key, side);
    aes::ige_decrypt(&mut buffer[FRAME_HEADER_LEN..], &key, &iv);

    if msg_key != calc_msg_key(auth_key, &buffer[FRAME_HEADER_LEN..], side) {
        return Err(DecryptError::MessageKeyMismatch);
    }
    Ok(&mut buffer[FRAME_HEADER_LEN..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> AuthKey {
        let mut data = [0u8; AUTH_KEY_LEN];
        for (i, b) in data.iter_mut().enumerate() {
            *b = i as u8;
        }
        AuthKey::from_bytes(data)
    }

    #[test]
    fn padding_is_12_to_27_and_aligned() {
        for len in 0..64 {
            let pad = padding_len(len);
            assert!((12..=27).contains(&pad), "len {len} pad {pad}");
            assert_eq!((len + pad) % 16, 0);
        }
    }

    #[test]
    fn encrypt_is_deterministic_for_fixed_padding() {
        let key = test_key();
        let rnd = [0x5Au8; 32];
        let mut a = DequeBuffer::with_capacity(32, 32);
        a.extend_from_slice(&[1u8; 32]);
        let mut b = a.clone();
        do_encrypt_data_v2(&mut a, &key, Side::Client, &rnd);
        do_encrypt_data_v2(&mut b, &key, Side::Client, &rnd);
        assert_eq!(a.as_ref(), b.as_ref());
        assert_eq!(&a.as_ref()[..8], &key.key_id());
        assert_eq!((a.len() - FRAME_HEADER_LEN) % 16, 0);
    }

    #[test]
    fn calc_key_known_vectors() {
        let key = test_key();
        let msg_key = [9u8; 16];

        let client_key: [u8; 32] = [
            0x66, 0x2d, 0xdb, 0xc5, 0x45, 0x51, 0xee, 0x30,
            0x63, 0x08, 0x41, 0x80, 0xa1, 0xf1, 0x67, 0x34,
            0x0d, 0xca, 0xfa, 0xa4, 0x51, 0xf9, 0xb7, 0x42,
            0x70, 0x15, 0x29, 0xf6, 0x6d, 0xa5, 0x39, 0x3e,
        ];
        let client_iv: [u8; 32] = [
            0x8d, 0xe7, 0xd7, 0x6f, 0xda, 0x1a, 0x41, 0x8d,
            0x86, 0x0f, 0x0d, 0xbb, 0x1c, 0x45, 0x9e, 0xe1,
            0x2b, 0x81, 0xdd, 0x6a, 0x14, 0xff, 0x69, 0x95,
            0x04, 0x2b, 0x9e, 0xd2, 0x8e, 0x2e, 0x81, 0xb1,
        ];
        assert_eq!(calc_key(&key, &msg_key, Side::Client), (client_key, client_iv));

        let server_key: [u8; 32] = [
            0x10, 0xc1, 0xf2, 0xb9, 0x0c, 0x6a, 0xb2, 0xe8,
            0xa7, 0x49, 0xb8, 0x43, 0xf6, 0x87, 0xcb, 0x30,
            0x7c, 0x2a, 0xbc, 0xf2, 0xcb, 0xf5, 0x66, 0x04,
            0x23, 0x69, 0xf6, 0x0a, 0x23, 0x9a, 0x11, 0xee,
        ];
        let server_iv: [u8; 32] = [
            0xec, 0x7d, 0x6e, 0x1e, 0x15, 0xbf, 0x29, 0x99,
            0x25, 0xfa, 0x17, 0xdd, 0xed, 0x71, 0xb2, 0xa4,
            0x57, 0x0e, 0x6d, 0xdd, 0x94, 0x9f, 0x85, 0xfb,
            0xa3, 0x3a, 0x08, 0xad, 0x3c, 0xe0, 0xe5, 0x1d,
        ];
        assert_eq!(calc_key(&key, &msg_key, Side::Server), (server_key, server_iv));
    }

    #[test]
    fn client_frame_known_bytes() {
        let key = test_key();
        let mut buf = DequeBuffer::with_capacity(32, 32);
        buf.extend_from_slice(&[1u8; 32]);
        do_encrypt_data_v2(&mut buf, &key, Side::Client, &[0x5Au8; 32]);

        let expected: [u8; 72] = [
            0x32, 0xd1, 0x58, 0x6e, 0xa4, 0x57, 0xdf, 0xc8,
            0x6b, 0x18, 0xd5, 0x36, 0x9b, 0x43, 0x10, 0x3e,
            0x13, 0x40, 0x4d, 0x88, 0x16, 0x1a, 0x2f, 0xc7,
            0x47, 0xec, 0x56, 0x6c, 0x4e, 0xd3, 0x3d, 0x5e,
            0x47, 0x50, 0x26, 0x31, 0x7c, 0xc2, 0x61, 0xd0,
            0xc4, 0x71, 0x25, 0x3e, 0x86, 0x53, 0x15, 0xd2,
            0x67, 0xa5, 0x29, 0xd4, 0x13, 0xfc, 0x46, 0x55,
            0x8b, 0x42, 0xce, 0x30, 0xa9, 0xc3, 0xd9, 0x1d,
            0x7d, 0x45, 0x78, 0xff, 0xea, 0x3a, 0x50, 0x10,
        ];
        assert_eq!(buf.as_ref(), &expected[..]);
    }

    #[test]
    fn sides_derive_different_keys() {
        let key = test_key();
        let msg_key = [9u8; 16];
        assert_ne!(calc_key(&key, &msg_key, Side::Client), calc_key(&key, &msg_key, Side::Server));
    }

    #[test]
    fn client_frame_is_not_readable_as_server_frame() {
        let key = test_key();
        let mut buf = DequeBuffer::with_capacity(48, 32);
        buf.extend_from_slice(&[7u8; 48]);
        encrypt_data_v2(&mut buf, &key).unwrap();
        let mut frame = buf.into_vec();
        assert_eq!(decrypt_data_v2(&mut frame, &key), Err(DecryptError::MessageKeyMismatch));
    }
}
