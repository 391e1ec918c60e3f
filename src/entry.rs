//! Expiry rules for entry files.
//!
//! Entries carry no metadata of their own; the file's modification time is the
//! write time.

use std::fs::Metadata;
use std::io;
use std::time::{Duration, SystemTime};

/// How long an entry stays fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ttl {
    /// The entry never expires.
    #[default]
    Never,
    /// The entry expires once it is older than this.
    After(Duration),
}

impl Ttl {
    /// TTL in minutes. Zero, negative and NaN mean [`Ttl::Never`].
    ///
    /// Fractions are kept, so `Ttl::minutes(1.0 / 60.0)` is one second.
    pub fn minutes(minutes: f64) -> Self {
        if minutes.is_nan() || minutes <= 0.0 {
            return Ttl::Never;
        }
        // Duration::from_secs_f64 panics on overflow.
        Duration::try_from_secs_f64(minutes * 60.0)
            .map(Ttl::After)
            .unwrap_or(Ttl::Never)
    }

    pub fn seconds(seconds: u64) -> Self {
        Self::from(Duration::from_secs(seconds))
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Ttl::Never => None,
            Ttl::After(d) => Some(*d),
        }
    }
}

impl From<Duration> for Ttl {
    fn from(d: Duration) -> Self {
        if d.is_zero() {
            Ttl::Never
        } else {
            Ttl::After(d)
        }
    }
}

impl From<Option<Duration>> for Ttl {
    fn from(d: Option<Duration>) -> Self {
        d.map(Ttl::from).unwrap_or(Ttl::Never)
    }
}

/// Check an entry against `ttl` using its metadata, as of now.
pub fn is_expired(metadata: io::Result<Metadata>, ttl: Ttl) -> bool {
    is_expired_at(metadata.and_then(|m| m.modified()), ttl, SystemTime::now())
}

/// Check an entry against `ttl` at a given time.
/// This is useful for testing with a controlled clock.
///
/// An unknown modification time counts as expired; one in the future counts
/// as age zero.
pub fn is_expired_at(modified: io::Result<SystemTime>, ttl: Ttl, now: SystemTime) -> bool {
    let max_age = match ttl {
        Ttl::Never => return false,
        Ttl::After(d) => d,
    };
    match modified {
        Ok(modified) => {
            let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
            age > max_age
        }
        Err(_) => true,
    }
}
