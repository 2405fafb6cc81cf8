//! Rate limiting between backlog rows.

use serde::Deserialize;
use std::time::{Duration, Instant};

fn default_delay_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum PacingConfig {
    None,
    Fixed {
        #[serde(default = "default_delay_ms")]
        delay_ms: u64,
    },
    TokenBucket {
        capacity: u32,
        refill_per_sec: f64,
    },
}

impl Default for PacingConfig {
    fn default() -> Self {
        PacingConfig::Fixed {
            delay_ms: default_delay_ms(),
        }
    }
}

impl PacingConfig {
    pub fn validate(&self) -> Result<(), String> {
        match self {
            PacingConfig::TokenBucket { capacity, .. } if *capacity == 0 => {
                Err("pacing.capacity must be at least 1".into())
            }
            PacingConfig::TokenBucket { refill_per_sec, .. }
                if !(refill_per_sec.is_finite() && *refill_per_sec > 0.0) =>
            {
                Err("pacing.refill_per_sec must be a positive number".into())
            }
            PacingConfig::TokenBucket { refill_per_sec, .. }
                if Duration::try_from_secs_f64(1.0 / refill_per_sec).is_err() =>
            {
                Err(format!(
                    "pacing.refill_per_sec {refill_per_sec} is too small to wait for"
                ))
            }
            _ => Ok(()),
        }
    }
}

/// Waits between rows according to the configured policy.
#[derive(Debug)]
pub enum Pacer {
    Unpaced,
    Fixed(Duration),
    Bucket(TokenBucket),
}

impl Pacer {
    pub fn from_config(config: &PacingConfig) -> Self {
        match config {
            PacingConfig::None => Pacer::Unpaced,
            PacingConfig::Fixed { delay_ms } => Pacer::Fixed(Duration::from_millis(*delay_ms)),
            PacingConfig::TokenBucket {
                capacity,
                refill_per_sec,
            } => Pacer::Bucket(TokenBucket::new(*capacity, *refill_per_sec, Instant::now())),
        }
    }

    pub async fn wait(&mut self) {
        let delay = match self {
            Pacer::Unpaced => Duration::ZERO,
            Pacer::Fixed(delay) => *delay,
            Pacer::Bucket(bucket) => bucket.reserve(Instant::now()),
        };
        if !delay.is_zero() {
            tracing::trace!(delay_ms = delay.as_millis() as u64, "pacing");
            tokio::time::sleep(delay).await;
        }
    }
}

/// Token bucket that starts full. Taking a token from an empty bucket puts
/// it in debt; the returned delay is how long until the debt is repaid.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last: Instant,
}

impl TokenBucket {
    pub fn new(capacity: u32, refill_per_sec: f64, now: Instant) -> Self {
        let capacity = f64::from(capacity.max(1));
        Self {
            capacity,
            tokens: capacity,
            refill_per_sec,
            last: now,
        }
    }

    pub fn reserve(&mut self, now: Instant) -> Duration {
        let elapsed = now.saturating_duration_since(self.last).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last = now;
        self.tokens -= 1.0;
        if self.tokens >= 0.0 {
            Duration::ZERO
        } else {
            Duration::try_from_secs_f64(-self.tokens / self.refill_per_sec)
                .unwrap_or(Duration::MAX)
        }
    }
}
