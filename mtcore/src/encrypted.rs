//! Encrypted MTProto 2.0 session state.
//!
//! [`MtpState`] owns everything that must stay consistent across the
//! messages of one session: the session ID, salt, clock skew, outgoing
//! message-ID and sequence counters, and the window of recently seen remote
//! message IDs. It is single-owner; wrap it in a mutex if several tasks send
//! over one connection.

use mtcore_crypto::{AuthKey, DequeBuffer, FRAME_HEADER_LEN, decrypt_data_v2, encrypt_data_v2};
use mtcore_tl::mtproto::Object;
use mtcore_tl::{Cursor, Deserializable, Serializable};

use crate::auth_key::AuthKeySlot;
use crate::config::Config;
use crate::errors::{Error, Result, SecurityError};
use crate::message::{Message, MessageId, Payload};
use crate::msg_id::MsgIdGenerator;
use crate::replay::ReplayWindow;
use crate::seq_no::SeqNoGenerator;

/// `salt:long session_id:long`
const PLAINTEXT_PREFIX_LEN: usize = 8 + 8;

/// A message recovered from a server frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecryptedMessage {
    /// Server-assigned message ID.
    pub msg_id: MessageId,
    /// Server sequence number.
    pub seq_no: i32,
    /// The decoded body.
    pub body: Object,
}

/// MTProto 2.0 protocol state for one session.
///
/// # Example
///
/// ```rust
/// use mtcore::{AuthKeySlot, Config, MtpState};
/// use mtcore_crypto::AuthKey;
///
/// # async fn demo() -> mtcore::Result<()> {
/// let slot = AuthKeySlot::ready(AuthKey::from_bytes([7u8; 256]));
/// let mut state = MtpState::new(slot, Config::default())?;
/// state.set_salt(0x1122_3344_5566_7788);
///
/// let mut pending: Vec<u8> = Vec::new();
/// let msg_id = state.write_data_as_message(&mut pending, b"ping....", false, None);
/// let frame = state.encrypt_message_data(&pending).await?;
/// # let _ = (msg_id, frame);
/// # Ok(())
/// # }
/// ```
pub struct MtpState {
    auth_key:   AuthKeySlot,
    config:     Config,
    session_id: i64,
    salt:       Option<i64>,
    msg_ids:    MsgIdGenerator,
    seq_no:     SeqNoGenerator,
    remote_ids: ReplayWindow,
}

fn random_i64() -> Result<i64> {
    let mut b = [0u8; 8];
    getrandom::getrandom(&mut b)?;
    Ok(i64::from_le_bytes(b))
}

impl MtpState {
    /// Create a state bound to `auth_key` with a fresh random session ID.
    pub fn new(auth_key: AuthKeySlot, config: Config) -> Result<Self> {
        Ok(Self {
            auth_key,
            session_id: random_i64()?,
            salt:       None,
            msg_ids:    MsgIdGenerator::new(config.time_offset),
            seq_no:     SeqNoGenerator::new(),
            remote_ids: ReplayWindow::new(config.replay_window),
            config,
        })
    }

    /// Start a new session: new session ID, counters and replay window cleared.
    ///
    /// Salt, time offset and the auth key survive.
    pub fn reset(&mut self) -> Result<()> {
        let old = self.session_id;
        let mut id = random_i64()?;
        while id == old {
            id = random_i64()?;
        }
        self.session_id = id;
        self.msg_ids = MsgIdGenerator::new(self.msg_ids.time_offset());
        self.seq_no = SeqNoGenerator::new();
        self.remote_ids.clear();
        log::trace!("[mtcore] Session reset, new session_id {id}");
        Ok(())
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    /// The current session ID.
    pub fn session_id(&self) -> i64 { self.session_id }

    /// The current server salt, if one has been set.
    pub fn salt(&self) -> Option<i64> { self.salt }

    /// Adopt a salt issued by the server.
    pub fn set_salt(&mut self, salt: i64) { self.salt = Some(salt); }

    /// Clock skew correction in seconds.
    pub fn time_offset(&self) -> i32 { self.msg_ids.time_offset() }

    /// The most recently generated outgoing message ID, or 0.
    pub fn last_msg_id(&self) -> i64 { self.msg_ids.last_msg_id() }

    /// Whether incoming security violations are rejected.
    pub fn security_checks(&self) -> bool { self.config.security_checks }

    /// Toggle rejection of incoming security violations.
    pub fn set_security_checks(&mut self, enabled: bool) { self.config.security_checks = enabled; }

    /// The configuration this state runs with.
    pub fn config(&self) -> &Config { &self.config }

    /// The authorization key slot this state reads from.
    pub fn auth_key(&self) -> &AuthKeySlot { &self.auth_key }

    // ── Outgoing ───────────────────────────────────────────────────────────

    /// Allocate the next outgoing message ID.
    pub fn next_msg_id(&mut self) -> MessageId {
        self.msg_ids.next(self.config.clock.now())
    }

    /// Allocate the next sequence number.
    pub fn next_seq_no(&mut self, content_related: bool) -> i32 {
        self.seq_no.next(content_related)
    }

    /// Give `message` a fresh ID, e.g. before re-sending it after the server
    /// rejected the old one.
    pub fn update_message_id(&mut self, message: &mut Message) {
        message.id = self.next_msg_id();
    }

    /// Frame `data` as a [`Message`] without writing it anywhere.
    ///
    /// With `after` set, the body becomes `invokeAfterMsg` around `data`.
    /// Content-related bodies may be gzip-packed when that makes them smaller.
    pub fn pack_message(&mut self, data: &[u8], content_related: bool, after: Option<MessageId>) -> Message {
        let id = self.next_msg_id();
        let seq_no = self.next_seq_no(content_related);
        let body = Payload::new(data, after).into_body(content_related, self.config.gzip_threshold);
        Message::new(id, seq_no, body)
    }

    /// Frame `data` and append the envelope to `sink`, returning its ID.
    pub fn write_data_as_message(
        &mut self,
        sink: &mut impl Extend<u8>,
        data: &[u8],
        content_related: bool,
        after: Option<MessageId>,
    ) -> MessageId {
        let message = self.pack_message(data, content_related, after);
        message.serialize(sink);
        message.id
    }

    /// Encrypt one or more serialized envelopes, waiting for the auth key
    /// if needed (bounded by [`Config::auth_key_timeout`]).
    pub async fn encrypt_message_data(&self, data: &[u8]) -> Result<Vec<u8>> {
        let key = self.auth_key.wait_until_ready(self.config.auth_key_timeout).await?;
        self.encrypt_message_data_with(&key, data)
    }

    /// Encrypt with a key the caller already holds.
    ///
    /// Output layout: `auth_key_id:8 | msg_key:16 | ciphertext`.
    pub fn encrypt_message_data_with(&self, key: &AuthKey, data: &[u8]) -> Result<Vec<u8>> {
        let salt = self.salt.ok_or(Error::AuthKeyUnset)?;

        let mut buf = DequeBuffer::with_capacity(PLAINTEXT_PREFIX_LEN + data.len() + 32, FRAME_HEADER_LEN);
        buf.extend(salt.to_le_bytes());
        buf.extend(self.session_id.to_le_bytes());
        buf.extend_from_slice(data);

        encrypt_data_v2(&mut buf, key)?;
        Ok(buf.into_vec())
    }

    // ── Incoming ───────────────────────────────────────────────────────────

    /// Verify and decrypt a frame received from the server.
    ///
    /// `frame` is decrypted in place.
    pub fn decrypt_message_data(&mut self, frame: &mut [u8]) -> Result<DecryptedMessage> {
        if frame.len() < 8 {
            return Err(Error::InvalidBuffer);
        }
        let key = match self.auth_key.get() {
            Some(key) if key.key_id()[..] == frame[..8] => key,
            Some(_) => return Err(SecurityError::InvalidAuthKey.into()),
            None => return Err(SecurityError::UnsetAuthKey.into()),
        };

        let plaintext = decrypt_data_v2(frame, &key)?;
        let mut cur = Cursor::from_slice(plaintext);
        let truncated = |_| Error::InvalidBuffer;

        let _salt      = i64::deserialize(&mut cur).map_err(truncated)?;
        let session_id = i64::deserialize(&mut cur).map_err(truncated)?;
        let msg_id     = MessageId(i64::deserialize(&mut cur).map_err(truncated)?);
        let seq_no     = i32::deserialize(&mut cur).map_err(truncated)?;
        let body_len   = u32::deserialize(&mut cur).map_err(truncated)? as usize;
        let body       = cur.read_slice(body_len).map_err(truncated)?;

        // Some servers echo a different session ID during handshakes; not fatal.
        if session_id != self.session_id {
            log::debug!(
                "[mtcore] Ignoring session_id mismatch (ours {}, frame {session_id})",
                self.session_id,
            );
        }

        self.check_remote_msg_id(msg_id)?;

        let body = Object::from_bytes(body)?;
        Ok(DecryptedMessage { msg_id, seq_no, body })
    }

    /// Re-derive the clock skew from a server message ID known to be good.
    pub fn update_time_offset(&mut self, correct_msg_id: MessageId) -> i32 {
        self.msg_ids.update_time_offset(correct_msg_id, self.config.clock.now())
    }

    fn violation(&self, err: SecurityError, msg_id: MessageId) -> Result<()> {
        if self.config.security_checks {
            return Err(err.into());
        }
        log::warn!("[mtcore] {err} (msg_id {msg_id}), accepted: security checks disabled");
        Ok(())
    }

    fn check_remote_msg_id(&mut self, msg_id: MessageId) -> Result<()> {
        if !msg_id.is_server() {
            self.violation(SecurityError::EvenMsgId, msg_id)?;
        }

        let now = self.config.clock.now().as_secs() as i64 + i64::from(self.time_offset());
        let delta = msg_id.secs() - now;
        if self.config.msg_too_old_delta > 0 && -delta > self.config.msg_too_old_delta {
            self.violation(SecurityError::MsgTooOld, msg_id)?;
        }
        if self.config.msg_too_new_delta > 0 && delta > self.config.msg_too_new_delta {
            self.violation(SecurityError::MsgTooNew, msg_id)?;
        }

        if !self.remote_ids.insert(msg_id) {
            self.violation(SecurityError::DuplicateMsgId, msg_id)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for MtpState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MtpState")
            .field("auth_key", &self.auth_key)
            .field("session_id", &self.session_id)
            .field("salt", &self.salt)
            .field("time_offset", &self.time_offset())
            .field("last_msg_id", &self.last_msg_id())
            .field("sequence", &self.seq_no.sequence())
            .field("security_checks", &self.config.security_checks)
            .finish()
    }
}
