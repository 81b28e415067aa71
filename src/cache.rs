//! Fixed-TTL cache for resource lookups layered above the dispatcher.
//!
//! The cache is an ordinary value injected where it is needed, so its lifetime and test
//! isolation follow the owner rather than the process.

// self
use crate::{
	_prelude::*,
	clock::{Clock, SystemClock},
};

struct Entry<V> {
	value: V,
	// `None` when the TTL reaches past the last representable instant.
	expires_at: Option<OffsetDateTime>,
}
impl<V> Entry<V> {
	fn is_live(&self, now: OffsetDateTime) -> bool {
		self.expires_at.is_none_or(|at| at > now)
	}
}

type EntryMap<K, V> = Arc<RwLock<HashMap<K, Entry<V>>>>;

/// Thread-safe key/value cache whose entries expire a fixed time after insertion.
pub struct TtlCache<K, V> {
	entries: EntryMap<K, V>,
	ttl: Duration,
	clock: Arc<dyn Clock>,
}
impl<K, V> TtlCache<K, V>
where
	K: Eq + Hash,
	V: Clone,
{
	/// Creates a cache backed by the system clock.
	pub fn new(ttl: Duration) -> Self {
		Self::with_clock(ttl, Arc::new(SystemClock))
	}

	/// Creates a cache that reads time from `clock`.
	pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
		Self { entries: Default::default(), ttl, clock }
	}

	/// Time-to-live applied to new entries.
	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Returns a live entry; an expired one is evicted on the way.
	pub fn get(&self, key: &K) -> Option<V> {
		let now = self.clock.now();

		{
			let guard = self.entries.read();
			let entry = guard.get(key)?;

			if entry.is_live(now) {
				return Some(entry.value.clone());
			}
		}

		let mut guard = self.entries.write();

		// Another caller may have refreshed the entry between the two locks.
		if guard.get(key).is_some_and(|entry| !entry.is_live(now)) {
			guard.remove(key);
		}

		None
	}

	/// Inserts or replaces an entry, restarting its TTL.
	pub fn insert(&self, key: K, value: V) {
		let expires_at = self.clock.now().checked_add(self.ttl);

		self.entries.write().insert(key, Entry { value, expires_at });
	}

	/// Removes an entry, returning it if it was still live.
	pub fn invalidate(&self, key: &K) -> Option<V> {
		let now = self.clock.now();

		self.entries
			.write()
			.remove(key)
			.filter(|entry| entry.is_live(now))
			.map(|entry| entry.value)
	}

	/// Drops every expired entry and returns how many were removed.
	pub fn purge_expired(&self) -> usize {
		let now = self.clock.now();
		let mut guard = self.entries.write();
		let before = guard.len();

		guard.retain(|_, entry| entry.is_live(now));

		before - guard.len()
	}

	/// Number of stored entries, including expired ones not yet purged.
	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	/// Returns true when no entries are stored.
	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}

	/// Returns the live entry for `key`, or runs `load` and caches its success.
	///
	/// Errors are returned as-is and nothing is cached. Concurrent misses for the same key may
	/// each run `load`; the last successful value wins.
	pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, load: F) -> Result<V, E>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<V, E>>,
	{
		if let Some(value) = self.get(&key) {
			return Ok(value);
		}

		let value = load().await?;

		self.insert(key, value.clone());

		Ok(value)
	}
}
impl<K, V> Clone for TtlCache<K, V> {
	fn clone(&self) -> Self {
		Self { entries: Arc::clone(&self.entries), ttl: self.ttl, clock: Arc::clone(&self.clock) }
	}
}
impl<K, V> Debug for TtlCache<K, V> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TtlCache")
			.field("ttl", &self.ttl)
			.field("entries", &self.entries.read().len())
			.finish()
	}
}
