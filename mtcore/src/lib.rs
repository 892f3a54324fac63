//! MTProto 2.0 session-state core.
//!
//! This crate turns application payloads into encrypted frames and server
//! frames back into sequenced messages:
//! * Message framing (message IDs, sequence numbers, `invokeAfterMsg`, gzip)
//! * Clock-skew correction from server-confirmed message IDs
//! * Replay protection over recently seen server message IDs
//! * MTProto 2.0 encryption / decryption against a shared [`AuthKeySlot`]
//!
//! It is intentionally transport-agnostic: frames go in and out as bytes.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod auth_key;
pub mod clock;
pub mod config;
pub mod encrypted;
pub mod errors;
pub mod message;
pub mod msg_id;
pub mod replay;
pub mod seq_no;

pub use auth_key::AuthKeySlot;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use encrypted::{DecryptedMessage, MtpState};
pub use errors::{Error, Result, SecurityError};
pub use message::{Message, MessageId, Payload};
