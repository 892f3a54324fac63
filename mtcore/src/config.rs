//! Tunables for [`crate::MtpState`].

use std::sync::Arc;
use std::time::Duration;

use mtcore_tl::mtproto::DEFAULT_GZIP_THRESHOLD;

use crate::clock::{Clock, SystemClock};
use crate::replay::DEFAULT_REPLAY_WINDOW;

/// Configuration for a [`crate::MtpState`].
///
/// ```rust
/// use std::time::Duration;
/// use mtcore::Config;
///
/// let config = Config {
///     auth_key_timeout: Some(Duration::from_secs(10)),
///     ..Default::default()
/// };
/// assert!(config.security_checks);
/// assert_eq!(config.msg_too_new_delta, 0);
/// ```
#[derive(Clone)]
pub struct Config {
    /// Reject duplicate / implausible remote message IDs. Disable only for
    /// diagnostics.
    pub security_checks:   bool,
    /// How many recent remote message IDs to remember.
    pub replay_window:     usize,
    /// Content-related payloads larger than this are offered to gzip.
    pub gzip_threshold:    usize,
    /// Max age in seconds of an accepted remote message ID. 0 (the default)
    /// leaves the age unchecked; the replay window already covers duplicates.
    pub msg_too_old_delta: i64,
    /// Max lead in seconds of an accepted remote message ID. 0 (the default)
    /// leaves the lead unchecked, since server clocks routinely run ahead
    /// until the first time-offset correction.
    pub msg_too_new_delta: i64,
    /// Initial clock skew in seconds, e.g. restored from a saved session.
    pub time_offset:       i32,
    /// Bound on how long encryption waits for the auth key. `None` waits
    /// until the key is set or the slot is closed.
    pub auth_key_timeout:  Option<Duration>,
    /// Wall-clock source.
    pub clock:             Arc<dyn Clock>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            security_checks:   true,
            replay_window:     DEFAULT_REPLAY_WINDOW,
            gzip_threshold:    DEFAULT_GZIP_THRESHOLD,
            msg_too_old_delta: 0,
            msg_too_new_delta: 0,
            time_offset:       0,
            auth_key_timeout:  None,
            clock:             Arc::new(SystemClock),
        }
    }
}
