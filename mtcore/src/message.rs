//! MTProto message framing types.

use std::fmt;

use mtcore_tl::Serializable;
use mtcore_tl::mtproto::{InvokeAfterMsg, gzip_if_smaller};

/// A 64-bit MTProto message identifier.
///
/// Bits 32..64 carry Unix seconds, bits 2..32 the sub-second fraction.
/// The two low bits are zero for client messages; server messages are odd.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct MessageId(pub i64);

impl MessageId {
    /// Unix seconds encoded in the upper half.
    pub fn secs(self) -> i64 { self.0 >> 32 }

    /// Whether the ID was generated by the server.
    pub fn is_server(self) -> bool { self.0 & 1 == 1 }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A framed outgoing message, before encryption.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Unique identifier for this message.
    pub id: MessageId,
    /// Odd for content-related messages, even otherwise.
    pub seq_no: i32,
    /// The body: a serialized object, possibly gzip-packed or wrapped in
    /// `invokeAfterMsg`.
    pub body: Vec<u8>,
}

impl Message {
    /// `msg_id:long seq_no:int bytes:int`
    pub const HEADER_LEN: usize = 8 + 4 + 4;

    /// Construct a message from its parts.
    pub fn new(id: MessageId, seq_no: i32, body: Vec<u8>) -> Self {
        Self { id, seq_no, body }
    }

    /// Size of the serialized envelope.
    pub fn len(&self) -> usize { Self::HEADER_LEN + self.body.len() }

    /// True if the body is empty.
    pub fn is_empty(&self) -> bool { self.body.is_empty() }
}

/// Envelope layout:
///
/// ```text
/// msg_id:  i64
/// seq_no:  i32
/// length:  i32
/// body:    [u8; length]
/// ```
impl Serializable for Message {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.id.0.serialize(buf);
        self.seq_no.serialize(buf);
        (self.body.len() as u32).serialize(buf);
        buf.extend(self.body.iter().copied());
    }
}

/// What gets framed as a message body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Payload<'a> {
    /// A serialized object sent as-is.
    Plain(&'a [u8]),
    /// A serialized call the server must run only after `msg_id`.
    After {
        /// The message that must be processed first.
        msg_id: MessageId,
        /// Serialized inner call.
        query: &'a [u8],
    },
}

impl<'a> Payload<'a> {
    /// Build from raw bytes and an optional "send after" ID.
    pub fn new(data: &'a [u8], after: Option<MessageId>) -> Self {
        match after {
            Some(msg_id) => Payload::After { msg_id, query: data },
            None => Payload::Plain(data),
        }
    }

    /// Produce the final body, compressing when it pays off.
    pub fn into_body(self, content_related: bool, gzip_threshold: usize) -> Vec<u8> {
        match self {
            Payload::Plain(data) => gzip_if_smaller(content_related, data, gzip_threshold),
            Payload::After { msg_id, query } => {
                let wrapped = InvokeAfterMsg { msg_id: msg_id.0, query }.to_bytes();
                gzip_if_smaller(content_related, &wrapped, gzip_threshold)
            }
        }
    }
}
