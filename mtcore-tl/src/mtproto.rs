//! Core MTProto service constructors used by the session layer.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::GzEncoder;

use crate::deserialize::{Buffer, Cursor, Error, Result};
use crate::{Deserializable, Identifiable, Serializable};

/// Payloads at or below this size are never compressed.
pub const DEFAULT_GZIP_THRESHOLD: usize = 512;

/// Upper bound on the inflated size of a single `gzip_packed` payload.
pub const MAX_INFLATED_LEN: usize = 16 * 1024 * 1024;

// ─── gzip_packed ─────────────────────────────────────────────────────────────

/// `gzip_packed#3072cfa1 packed_data:bytes = Object`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GzipPacked {
    /// Gzip-compressed serialization of the wrapped object.
    pub packed_data: Vec<u8>,
}

impl Identifiable for GzipPacked {
    const CONSTRUCTOR_ID: u32 = 0x3072cfa1;
}

impl GzipPacked {
    /// Compress `unpacked` into a new `gzip_packed`.
    pub fn new(unpacked: &[u8]) -> std::io::Result<Self> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(unpacked)?;
        Ok(Self { packed_data: enc.finish()? })
    }

    /// Inflate the wrapped object's serialization.
    ///
    /// Fails with [`Error::GzipTooLarge`] past [`MAX_INFLATED_LEN`] bytes.
    pub fn decompress(&self) -> Result<Vec<u8>> {
        gz_inflate(&self.packed_data, MAX_INFLATED_LEN)
    }
}

impl Serializable for GzipPacked {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        Self::CONSTRUCTOR_ID.serialize(buf);
        self.packed_data.serialize(buf);
    }
}

impl Deserializable for GzipPacked {
    fn deserialize(buf: Buffer) -> Result<Self> {
        let id = u32::deserialize(buf)?;
        if id != Self::CONSTRUCTOR_ID {
            return Err(Error::UnexpectedConstructor { id });
        }
        Ok(Self { packed_data: Vec::<u8>::deserialize(buf)? })
    }
}

fn gz_inflate(data: &[u8], limit: usize) -> Result<Vec<u8>> {
    let cap = limit as u64 + 1;
    let mut out = Vec::new();
    let gzip_ok = GzDecoder::new(data).take(cap).read_to_end(&mut out).is_ok();
    if !(gzip_ok && !out.is_empty()) {
        out.clear();
        ZlibDecoder::new(data)
            .take(cap)
            .read_to_end(&mut out)
            .map_err(|_| Error::InvalidGzip)?;
    }
    if out.len() > limit {
        return Err(Error::GzipTooLarge { limit });
    }
    Ok(out)
}

/// Wrap `data` in `gzip_packed` when that is worthwhile.
///
/// Only content-related payloads larger than `threshold` are tried, and the
/// compressed form is kept only if it is strictly smaller.
pub fn gzip_if_smaller(content_related: bool, data: &[u8], threshold: usize) -> Vec<u8> {
    if content_related && data.len() > threshold {
        if let Ok(packed) = GzipPacked::new(data) {
            let packed = packed.to_bytes();
            if packed.len() < data.len() {
                return packed;
            }
        }
    }
    data.to_vec()
}

// ─── invokeAfterMsg ──────────────────────────────────────────────────────────

/// `invokeAfterMsg#cb9f372d {X:Type} msg_id:long query:!X = X`
///
/// `query` is an already-serialized call and is written verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvokeAfterMsg<'a> {
    /// Message that must be processed first.
    pub msg_id: i64,
    /// Serialized inner query.
    pub query: &'a [u8],
}

impl Identifiable for InvokeAfterMsg<'_> {
    const CONSTRUCTOR_ID: u32 = 0xcb9f372d;
}

impl Serializable for InvokeAfterMsg<'_> {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        Self::CONSTRUCTOR_ID.serialize(buf);
        self.msg_id.serialize(buf);
        buf.extend(self.query.iter().copied());
    }
}

// ─── Object ──────────────────────────────────────────────────────────────────

/// An undecoded boxed TL object: its constructor ID and the bytes after it.
///
/// Deserializing transparently unwraps one level of `gzip_packed`, so
/// `constructor_id` never equals [`GzipPacked::CONSTRUCTOR_ID`]. A
/// `gzip_packed` nested inside another is rejected as [`Error::InvalidGzip`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Object {
    /// Constructor ID of the object.
    pub constructor_id: u32,
    /// Serialized fields following the constructor ID.
    pub data: Vec<u8>,
}

impl Object {
    /// Reinterpret as a concrete type.
    pub fn decode<T: Deserializable>(&self) -> Result<T> {
        T::from_bytes(&self.to_bytes())
    }
}

impl Serializable for Object {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.constructor_id.serialize(buf);
        buf.extend(self.data.iter().copied());
    }
}

impl Deserializable for Object {
    fn deserialize(buf: Buffer) -> Result<Self> {
        Self::deserialize_packed(buf, true)
    }
}

impl Object {
    fn deserialize_packed(buf: Buffer, may_unpack: bool) -> Result<Self> {
        let constructor_id = u32::deserialize(buf)?;
        if constructor_id == GzipPacked::CONSTRUCTOR_ID {
            if !may_unpack {
                return Err(Error::InvalidGzip);
            }
            let packed = GzipPacked { packed_data: Vec::<u8>::deserialize(buf)? };
            let inner = packed.decompress()?;
            return Self::deserialize_packed(&mut Cursor::from_slice(&inner), false);
        }
        let mut data = Vec::with_capacity(buf.remaining());
        buf.read_to_end(&mut data);
        Ok(Self { constructor_id, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_payload_is_left_alone() {
        let data = vec![0u8; DEFAULT_GZIP_THRESHOLD];
        assert_eq!(gzip_if_smaller(true, &data, DEFAULT_GZIP_THRESHOLD), data);
    }

    #[test]
    fn non_content_payload_is_left_alone() {
        let data = vec![0u8; 4096];
        assert_eq!(gzip_if_smaller(false, &data, DEFAULT_GZIP_THRESHOLD), data);
    }

    #[test]
    fn compressible_payload_is_packed() {
        let data = vec![0u8; 4096];
        let out = gzip_if_smaller(true, &data, DEFAULT_GZIP_THRESHOLD);
        assert!(out.len() < data.len());
        assert_eq!(out[..4], GzipPacked::CONSTRUCTOR_ID.to_le_bytes());
        let packed = GzipPacked::from_bytes(&out).unwrap();
        assert_eq!(packed.decompress().unwrap(), data);
    }

    #[test]
    fn incompressible_payload_is_left_alone() {
        // xorshift noise does not compress
        let mut s = 0x9E37_79B9u32;
        let data: Vec<u8> = (0..2048)
            .map(|_| {
                s ^= s << 13;
                s ^= s >> 17;
                s ^= s << 5;
                s as u8
            })
            .collect();
        assert_eq!(gzip_if_smaller(true, &data, DEFAULT_GZIP_THRESHOLD), data);
    }

    #[test]
    fn invoke_after_msg_layout() {
        let bytes = InvokeAfterMsg { msg_id: 0x0102_0304_0506_0708, query: &[0xAA, 0xBB] }.to_bytes();
        assert_eq!(bytes[..4], 0xcb9f372du32.to_le_bytes());
        assert_eq!(bytes[4..12], 0x0102_0304_0506_0708i64.to_le_bytes());
        assert_eq!(&bytes[12..], &[0xAA, 0xBB]);
    }

    #[test]
    fn object_unwraps_gzip() {
        let inner = Object { constructor_id: 0x1234_5678, data: vec![1, 2, 3, 4] };
        let packed = GzipPacked::new(&inner.to_bytes()).unwrap().to_bytes();
        assert_eq!(Object::from_bytes(&packed).unwrap(), inner);
    }

    #[test]
    fn inflate_stops_at_the_cap() {
        let packed = GzipPacked::new(&[0u8; 4096]).unwrap();
        assert_eq!(gz_inflate(&packed.packed_data, 4096).unwrap().len(), 4096);
        assert_eq!(
            gz_inflate(&packed.packed_data, 4095),
            Err(Error::GzipTooLarge { limit: 4095 }),
        );
    }

    #[test]
    fn oversized_gzip_is_rejected() {
        let bomb = GzipPacked::new(&vec![0u8; MAX_INFLATED_LEN + 1]).unwrap();
        assert!(bomb.packed_data.len() < 64 * 1024);
        assert_eq!(
            Object::from_bytes(&bomb.to_bytes()),
            Err(Error::GzipTooLarge { limit: MAX_INFLATED_LEN }),
        );
    }

    #[test]
    fn nested_gzip_is_rejected() {
        let inner = Object { constructor_id: 0x1234_5678, data: vec![1, 2, 3, 4] };
        let once = GzipPacked::new(&inner.to_bytes()).unwrap().to_bytes();
        let twice = GzipPacked::new(&once).unwrap().to_bytes();
        assert_eq!(Object::from_bytes(&twice), Err(Error::InvalidGzip));
    }

    #[test]
    fn corrupt_gzip_is_an_error() {
        let packed = GzipPacked { packed_data: vec![0xde, 0xad, 0xbe, 0xef] }.to_bytes();
        assert_eq!(Object::from_bytes(&packed), Err(Error::InvalidGzip));
    }
}
