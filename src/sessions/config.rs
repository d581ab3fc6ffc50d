//! Configuration of a session.
//!
//! | Preset | Use |
//! |--------|-----|
//! | `SessionConfig::human()` | A client driven by a person at the screen |
//! | `SessionConfig::bot()` | An automated player that answers domino effects itself |
//!
//! # Example
//!
//! ```
//! use wargame_session::SessionConfig;
//!
//! let config = SessionConfig {
//!     title_base: "Skirmish at Tukayyid".to_owned(),
//!     ..SessionConfig::human()
//! };
//! assert!(config.validate().is_ok());
//! ```

use web_time::Duration;

use crate::error::{SessionError, SessionResult};

/// Settings of one session.
///
/// # Forward Compatibility
///
/// New fields may be added in future versions. Construct instances with the
/// `..SessionConfig::default()` pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "SessionConfig has no effect unless passed to SessionBuilder::with_config()"]
pub struct SessionConfig {
    /// Window title without the round/phase suffix.
    ///
    /// Default: `"Wargame"`
    pub title_base: String,

    /// Whether this client is an automated player. Automated players answer domino
    /// effect requests through their own decision logic.
    ///
    /// Default: `false`
    pub automated_client: bool,

    /// Inbound queue length above which a backlog is reported. Events are never
    /// dropped.
    ///
    /// Default: 256
    pub inbound_queue_capacity: usize,

    /// Decision prompts that stay open longer than this are logged at warn level.
    ///
    /// Default: 60s
    pub slow_prompt_threshold: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            title_base: "Wargame".to_owned(),
            automated_client: false,
            inbound_queue_capacity: 256,
            slow_prompt_threshold: Duration::from_secs(60),
        }
    }
}

impl SessionConfig {
    /// Upper bound accepted for [`inbound_queue_capacity`](Self::inbound_queue_capacity).
    pub const MAX_INBOUND_QUEUE_CAPACITY: usize = 65_536;

    /// Creates a new `SessionConfig` with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// A client with a person at the screen.
    pub fn human() -> Self {
        Self::default()
    }

    /// An automated player. Prompts are answered by code, so anything slower than a
    /// second is worth a warning.
    pub fn bot() -> Self {
        Self {
            title_base: "Wargame (bot)".to_owned(),
            automated_client: true,
            inbound_queue_capacity: 1024,
            slow_prompt_threshold: Duration::from_secs(1),
        }
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidConfiguration`] if the title is blank, the queue
    /// capacity is outside `1..=MAX_INBOUND_QUEUE_CAPACITY`, or the slow prompt
    /// threshold is zero.
    pub fn validate(&self) -> SessionResult<()> {
        if self.title_base.trim().is_empty() {
            return Err(SessionError::InvalidConfiguration {
                info: "title_base must not be blank".to_owned(),
            });
        }
        if self.inbound_queue_capacity == 0
            || self.inbound_queue_capacity > Self::MAX_INBOUND_QUEUE_CAPACITY
        {
            return Err(SessionError::InvalidConfiguration {
                info: format!(
                    "inbound_queue_capacity must be in 1..={}, got {}",
                    Self::MAX_INBOUND_QUEUE_CAPACITY,
                    self.inbound_queue_capacity
                ),
            });
        }
        if self.slow_prompt_threshold.is_zero() {
            return Err(SessionError::InvalidConfiguration {
                info: "slow_prompt_threshold must be positive".to_owned(),
            });
        }
        Ok(())
    }
}
