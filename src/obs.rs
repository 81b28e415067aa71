//! Optional observability helpers for dispatcher operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `reddit_dispatch.operation` with the
//!   `operation` and `stage` (call site) fields, plus warnings for swallowed failures.
//! - Enable `metrics` to increment the `reddit_dispatch_operation_total` counter for every
//!   attempt/success/failure, labeled by `operation` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Emits a warning through `tracing` when the feature is enabled.
macro_rules! warn_event {
	($($arg:tt)+) => {{
		#[cfg(feature = "tracing")]
		::tracing::warn!($($arg)+);
		#[cfg(not(feature = "tracing"))]
		{
			let _ = format_args!($($arg)+);
		}
	}};
}

/// Emits a debug event through `tracing` when the feature is enabled.
macro_rules! debug_event {
	($($arg:tt)+) => {{
		#[cfg(feature = "tracing")]
		::tracing::debug!($($arg)+);
		#[cfg(not(feature = "tracing"))]
		{
			let _ = format_args!($($arg)+);
		}
	}};
}

pub(crate) use {debug_event, warn_event};

/// Dispatcher operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Token acquisition through the active login strategy.
	Login,
	/// Explicit or expiry-driven token renewal.
	Refresh,
	/// Token revocation.
	Logout,
	/// Authenticated API request.
	Send,
}
impl Operation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::Login => "login",
			Operation::Refresh => "refresh",
			Operation::Logout => "logout",
			Operation::Send => "send",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to a dispatcher operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::Failure => "failure",
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
