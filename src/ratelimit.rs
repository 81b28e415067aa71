//! Server-driven request budget tracking.
//!
//! The provider reports its quota on every response through `x-ratelimit-*` headers. The
//! [`RateLimiter`] treats those values as authoritative and only decrements its local copy
//! between responses, so a stale estimate is corrected by the very next call.

// std
use std::time::Duration as StdDuration;
// crates.io
use oauth2::http::{HeaderMap, StatusCode, header::RETRY_AFTER};
use time::format_description::well_known::Rfc2822;
use tokio::time::{self as tokio_time, Instant};
// self
use crate::{_prelude::*, obs};

/// Header carrying the number of calls consumed in the current window.
pub const USED_HEADER: &str = "x-ratelimit-used";
/// Header carrying the number of calls left in the current window (may be fractional).
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
/// Header carrying the seconds until the window rolls over.
pub const RESET_HEADER: &str = "x-ratelimit-reset";

/// Rate-limit counters reported by the provider on a single response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitHeaders {
	/// Calls consumed in the current window.
	pub used: u32,
	/// Calls left in the current window.
	pub remaining: u32,
	/// Time until the window rolls over.
	pub reset_after: Duration,
}
impl RateLimitHeaders {
	/// Reads the `x-ratelimit-*` headers; `None` unless both remaining and reset are present.
	pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
		let remaining = header_number(headers, REMAINING_HEADER)?;
		let reset = header_number(headers, RESET_HEADER)?;
		let used = header_number(headers, USED_HEADER).unwrap_or_default();

		Some(Self {
			used: used.max(0.) as u32,
			remaining: remaining.max(0.).floor() as u32,
			reset_after: Duration::seconds(reset.max(0.).ceil() as i64),
		})
	}

	/// Reads rate-limit metadata from a complete response.
	///
	/// A `429 Too Many Requests` without `x-ratelimit-*` headers but with `Retry-After` is
	/// read as an exhausted window that resets after the hinted delay.
	pub fn from_response(status: StatusCode, headers: &HeaderMap) -> Option<Self> {
		Self::from_headers(headers).or_else(|| {
			if status != StatusCode::TOO_MANY_REQUESTS {
				return None;
			}

			parse_retry_after(headers).map(|reset_after| Self {
				used: 0,
				remaining: 0,
				reset_after,
			})
		})
	}
}

/// Point-in-time view of a [`RateLimiter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitState {
	/// Calls consumed in the current window, as last reported plus local estimates.
	pub used: u32,
	/// Calls left in the current window; `None` until the provider reports a budget.
	pub remaining: Option<u32>,
	/// Time until the window rolls over (zero when unknown or already elapsed).
	pub reset_after: Duration,
}

#[derive(Debug, Default)]
struct Window {
	used: u32,
	remaining: Option<u32>,
	reset_at: Option<Instant>,
}
impl Window {
	fn roll_over(&mut self) {
		self.used = 0;
		self.remaining = None;
		self.reset_at = None;
	}
}

/// Serializes callers against the provider's request budget.
///
/// Waiters sleep until the window resets without holding the lock, so [`state`](Self::state)
/// and [`update`](Self::update) stay responsive. Woken waiters race for the new budget, and a
/// caller dropped while waiting never consumes a permit.
#[derive(Debug, Default)]
pub struct RateLimiter {
	window: AsyncMutex<Window>,
}
impl RateLimiter {
	/// Creates a limiter with an unknown budget; calls pass until the provider reports one.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a limiter seeded with previously observed counters.
	pub fn with_headers(headers: RateLimitHeaders) -> Self {
		let mut window = Window::default();

		apply(&mut window, &headers);

		Self { window: AsyncMutex::new(window) }
	}

	/// Waits until the current window allows one more call and consumes it.
	pub async fn acquire(&self) {
		loop {
			let reset_at = {
				let mut window = self.window.lock().await;

				match window.remaining {
					None => return,
					Some(remaining) if remaining > 0 => {
						window.remaining = Some(remaining - 1);
						window.used = window.used.saturating_add(1);

						return;
					},
					Some(_) => match window.reset_at {
						Some(reset_at) if reset_at > Instant::now() => reset_at,
						_ => {
							window.roll_over();

							continue;
						},
					},
				}
			};
			let wait = reset_at.saturating_duration_since(Instant::now());

			obs::debug_event!("Rate-limit window exhausted; waiting {wait:?} for reset.");

			// The lock is released while sleeping; a fresh report may move the reset.
			tokio_time::sleep_until(reset_at).await;
		}
	}

	/// Overwrites the local counters with the provider's report.
	///
	/// `None` (no metadata, e.g. the request never reached the server) keeps the last known
	/// state untouched.
	pub async fn update(&self, headers: Option<&RateLimitHeaders>) {
		let Some(headers) = headers else { return };
		let mut window = self.window.lock().await;

		apply(&mut window, headers);
	}

	/// Returns the current counters.
	pub async fn state(&self) -> RateLimitState {
		let window = self.window.lock().await;
		let reset_after = window
			.reset_at
			.map(|at| at.saturating_duration_since(Instant::now()))
			.and_then(|left| Duration::try_from(left).ok())
			.unwrap_or(Duration::ZERO);

		RateLimitState { used: window.used, remaining: window.remaining, reset_after }
	}
}

fn apply(window: &mut Window, headers: &RateLimitHeaders) {
	window.used = headers.used;
	window.remaining = Some(headers.remaining);
	window.reset_at = Instant::now().checked_add(to_std(headers.reset_after));
}

fn to_std(duration: Duration) -> StdDuration {
	if duration.is_negative() { StdDuration::ZERO } else { duration.unsigned_abs() }
}

fn header_number(headers: &HeaderMap, name: &str) -> Option<f64> {
	let raw = headers.get(name)?.to_str().ok()?.trim();

	raw.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Parses a `Retry-After` header given either as delta seconds or an HTTP date.
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u32>() {
		return Some(Duration::seconds(secs.into()));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
