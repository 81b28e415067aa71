// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for dispatcher activity.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
	token_grants: AtomicU64,
	renewals: AtomicU64,
	revocations: AtomicU64,
	requests: AtomicU64,
	failures: AtomicU64,
}
impl DispatchMetrics {
	/// Returns the number of login grants sent to the token endpoint.
	pub fn token_grants(&self) -> u64 {
		self.token_grants.load(Ordering::Relaxed)
	}

	/// Returns the number of token renewals attempted (refresh grant or re-login).
	pub fn renewals(&self) -> u64 {
		self.renewals.load(Ordering::Relaxed)
	}

	/// Returns the number of revocation calls issued.
	pub fn revocations(&self) -> u64 {
		self.revocations.load(Ordering::Relaxed)
	}

	/// Returns the number of API requests sent.
	pub fn requests(&self) -> u64 {
		self.requests.load(Ordering::Relaxed)
	}

	/// Returns the number of public operations that returned an error.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_token_grant(&self) {
		self.token_grants.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_renewal(&self) {
		self.renewals.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_revocation(&self) {
		self.revocations.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_request(&self) {
		self.requests.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}
