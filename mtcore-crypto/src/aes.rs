//! AES-256 in Infinite Garble Extension (IGE) mode.
//!
//! ```text
//! c[i] = E(p[i] ^ c[i-1]) ^ p[i-1]      c[0] = iv[..16], p[0] = iv[16..]
//! ```

use aes::Aes256;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit, generic_array::GenericArray};

const BLOCK: usize = 16;

fn xor_into(dst: &mut [u8; BLOCK], a: &[u8], b: &[u8]) {
    for ((d, x), y) in dst.iter_mut().zip(a).zip(b) {
        *d = x ^ y;
    }
}

/// Encrypt `buffer` in place.
///
/// # Panics
/// If `buffer.len()` is not a multiple of 16.
pub fn ige_encrypt(buffer: &mut [u8], key: &[u8; 32], iv: &[u8; 32]) {
    assert_eq!(buffer.len() % BLOCK, 0, "IGE input must be block-aligned");
    let cipher = Aes256::new(GenericArray::from_slice(key));

    let mut prev_cipher = [0u8; BLOCK];
    let mut prev_plain = [0u8; BLOCK];
    prev_cipher.copy_from_slice(&iv[..BLOCK]);
    prev_plain.copy_from_slice(&iv[BLOCK..]);

    for chunk in buffer.chunks_exact_mut(BLOCK) {
        let mut plain = [0u8; BLOCK];
        plain.copy_from_slice(chunk);

        let mut mixed = [0u8; BLOCK];
        xor_into(&mut mixed, &plain, &prev_cipher);
        let block = GenericArray::from_mut_slice(&mut mixed);
        cipher.encrypt_block(block);

        let mut out = [0u8; BLOCK];
        xor_into(&mut out, &mixed, &prev_plain);
        chunk.copy_from_slice(&out);

        prev_cipher = out;
        prev_plain = plain;
    }
}

/// Decrypt `buffer` in place.
///
/// # Panics
/// If `buffer.len()` is not a multiple of 16.
pub fn ige_decrypt(buffer: &mut [u8], key: &[u8; 32], iv: &[u8; 32]) {
    assert_eq!(buffer.len() % BLOCK, 0, "IGE input must be block-aligned");
    let cipher = Aes256::new(GenericArray::from_slice(key));

    let mut prev_cipher = [0u8; BLOCK];
    let mut prev_plain = [0u8; BLOCK];
    prev_cipher.copy_from_slice(&iv[..BLOCK]);
    prev_plain.copy_from_slice(&iv[BLOCK..]);

    for chunk in buffer.chunks_exact_mut(BLOCK) {
        let mut ciphertext = [0u8; BLOCK];
        ciphertext.copy_from_slice(chunk);

        let mut mixed = [0u8; BLOCK];
        xor_into(&mut mixed, &ciphertext, &prev_plain);
        let block = GenericArray::from_mut_slice(&mut mixed);
        cipher.decrypt_block(block);

        let mut out = [0u8; BLOCK];
        xor_into(&mut out, &mixed, &prev_cipher);
        chunk.copy_from_slice(&out);

        prev_cipher = ciphertext;
        prev_plain = out;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [7u8; 32];
    const IV: [u8; 32] = [
        0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15,
        16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29, 30, 31,
    ];

    #[test]
    fn roundtrip() {
        let plain: Vec<u8> = (0..64u8).collect();
        let mut buf = plain.clone();
        ige_encrypt(&mut buf, &KEY, &IV);
        assert_ne!(buf, plain);
        ige_decrypt(&mut buf, &KEY, &IV);
        assert_eq!(buf, plain);
    }

    #[test]
    fn known_vector() {
        let key: [u8; 32] = std::array::from_fn(|i| i as u8);
        let iv: [u8; 32] = std::array::from_fn(|i| 32 + i as u8);
        let plain: Vec<u8> = (0..48u8).collect();
        let expected: [u8; 48] = [
            0x42, 0xe6, 0x6e, 0x1a, 0x75, 0x6c, 0xcc, 0xf5,
            0xb2, 0x7a, 0xcc, 0x47, 0x52, 0x3a, 0xd0, 0x74,
            0xee, 0x39, 0xbf, 0x54, 0xe3, 0xdb, 0x37, 0xbb,
            0xdf, 0x41, 0x5d, 0xf6, 0xb4, 0x00, 0xfc, 0xa9,
            0x77, 0xf7, 0x08, 0x32, 0x7c, 0x9e, 0x93, 0x41,
            0xcc, 0x3d, 0xc8, 0xef, 0xd3, 0x1e, 0x76, 0x46,
        ];

        let mut buf = plain.clone();
        ige_encrypt(&mut buf, &key, &iv);
        assert_eq!(buf, expected);
        ige_decrypt(&mut buf, &key, &iv);
        assert_eq!(buf, plain);
    }

    #[test]
    fn identical_blocks_encrypt_differently() {
        let mut buf = vec![0x42u8; 32];
        ige_encrypt(&mut buf, &KEY, &IV);
        assert_ne!(buf[..16], buf[16..]);
    }

    #[test]
    fn corruption_garbles_following_blocks_only() {
        let plain: Vec<u8> = (0..48u8).collect();
        let mut buf = plain.clone();
        ige_encrypt(&mut buf, &KEY, &IV);
        buf[20] ^= 0x01;
        ige_decrypt(&mut buf, &KEY, &IV);
        assert_eq!(buf[..16], plain[..16]);
        assert_ne!(buf[16..32], plain[16..32]);
        assert_ne!(buf[32..], plain[32..]);
    }

    #[test]
    #[should_panic]
    fn unaligned_input_panics() {
        let mut buf = vec![0u8; 15];
        ige_encrypt(&mut buf, &KEY, &IV);
    }
}
