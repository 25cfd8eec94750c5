//! Request pacing between posts and between dependent sub-requests.
//!
//! The remote API has informal rate limits. Pacing is a fixed cooperative
//! delay: it does not react to 429 responses. The orchestrator only asks a
//! [`Pacer`] how long to wait, so a real rate limiter can be swapped in.

use std::time::Duration;

use postpress_shared::PacingConfig;

/// The points in a run where the orchestrator pauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    /// After a post has completed (success, skip, or failure).
    AfterPost,
    /// Between consecutive term resolutions within one post.
    BetweenSubRequests,
}

/// Decides how long to wait at each pause point.
pub trait Pacer: Send + Sync {
    fn delay(&self, pause: Pause) -> Duration;
}

/// Constant delays per pause point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPacing {
    pub after_post: Duration,
    pub between_requests: Duration,
}

impl FixedPacing {
    /// No delays at all (tests, local sites).
    pub fn none() -> Self {
        Self {
            after_post: Duration::ZERO,
            between_requests: Duration::ZERO,
        }
    }
}

impl Default for FixedPacing {
    fn default() -> Self {
        Self::from(&PacingConfig::default())
    }
}

impl From<&PacingConfig> for FixedPacing {
    fn from(config: &PacingConfig) -> Self {
        Self {
            after_post: Duration::from_millis(config.after_post_ms),
            between_requests: Duration::from_millis(config.between_requests_ms),
        }
    }
}

impl Pacer for FixedPacing {
    fn delay(&self, pause: Pause) -> Duration {
        match pause {
            Pause::AfterPost => self.after_post,
            Pause::BetweenSubRequests => self.between_requests,
        }
    }
}

/// Sleep for the pacer's delay, if any.
pub(crate) async fn wait(pacer: &dyn Pacer, pause: Pause) {
    let delay = pacer.delay(pause);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
