//! Minimal TL (Type Language) binary serialization for the session core.
//!
//! Only what the MTProto session layer itself needs lives here: the
//! [`Serializable`] / [`Deserializable`] traits, a zero-copy [`Cursor`],
//! and the service constructors wrapped around application payloads
//! ([`mtproto::GzipPacked`], [`mtproto::InvokeAfterMsg`]). Application
//! objects pass through as opaque [`mtproto::Object`] values.
//!
//! # Example
//!
//! ```rust
//! use mtcore_tl::{Deserializable, Serializable, mtproto::Object};
//!
//! let obj = Object { constructor_id: 0x62d6b459, data: vec![0; 8] };
//! let bytes = obj.to_bytes();
//! assert_eq!(Object::from_bytes(&bytes).unwrap(), obj);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod deserialize;
pub mod mtproto;
pub mod serialize;

pub use deserialize::{Cursor, Deserializable};
pub use serialize::Serializable;

/// Every TL constructor has a unique 32-bit ID.
pub trait Identifiable {
    /// The constructor ID as specified in the TL schema.
    const CONSTRUCTOR_ID: u32;
}
