//! Navigation pacing using a token bucket with random jitter.

use rand::Rng;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::config::CaptureConfig;

/// Token bucket rate limiter for page navigations
#[derive(Clone)]
pub struct RateLimiter {
    state: Arc<Mutex<RateLimiterState>>,
}

struct RateLimiterState {
    tokens: f64,
    last_update: Instant,
    max_tokens: f64,
    refill_rate: f64, // tokens per second
    min_delay: Duration,
    max_delay: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter
    ///
    /// # Arguments
    /// * `navigations_per_minute` - Maximum navigations per minute
    /// * `min_delay_secs` - Minimum pause before each navigation
    /// * `max_delay_secs` - Maximum pause before each navigation
    pub fn new(navigations_per_minute: u32, min_delay_secs: f64, max_delay_secs: f64) -> Self {
        let max_tokens = f64::from(navigations_per_minute.max(1));
        let refill_rate = max_tokens / 60.0;
        let min_delay = Duration::from_secs_f64(min_delay_secs.max(0.0));
        let max_delay = Duration::from_secs_f64(max_delay_secs.max(0.0)).max(min_delay);

        Self {
            state: Arc::new(Mutex::new(RateLimiterState {
                tokens: max_tokens,
                last_update: Instant::now(),
                max_tokens,
                refill_rate,
                min_delay,
                max_delay,
            })),
        }
    }

    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new(
            config.navigations_per_minute,
            config.min_pacing_secs,
            config.max_pacing_secs,
        )
    }

    /// No pacing at all
    pub fn unlimited() -> Self {
        Self::new(u32::MAX, 0.0, 0.0)
    }

    /// Acquire a token, waiting if necessary
    pub async fn acquire(&self) {
        let delay = {
            let mut state = self.state.lock().await;

            let now = Instant::now();
            let elapsed = now.duration_since(state.last_update).as_secs_f64();
            state.tokens = (state.tokens + elapsed * state.refill_rate).min(state.max_tokens);
            state.last_update = now;

            if state.tokens >= 1.0 {
                state.tokens -= 1.0;
                let delay_range = state.max_delay - state.min_delay;
                state.min_delay + delay_range.mul_f64(rand::thread_rng().gen::<f64>())
            } else {
                let wait_time = (1.0 - state.tokens) / state.refill_rate;
                state.tokens = 0.0;
                Duration::from_secs_f64(wait_time) + state.min_delay
            }
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
