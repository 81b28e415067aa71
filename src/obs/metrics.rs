// self
use crate::obs::{Operation, Outcome};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_outcome(operation: Operation, outcome: Outcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"reddit_dispatch_operation_total",
			"operation" => operation.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (operation, outcome);
	}
}

/// Records success or failure for a finished operation and hands the result back.
pub(crate) fn record_result<T, E>(operation: Operation, result: Result<T, E>) -> Result<T, E> {
	match &result {
		Ok(_) => record_outcome(operation, Outcome::Success),
		Err(_) => record_outcome(operation, Outcome::Failure),
	}

	result
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_outcome_noop_without_recorder() {
		record_outcome(Operation::Send, Outcome::Failure);

		assert_eq!(record_result::<u8, ()>(Operation::Login, Ok(7)), Ok(7));
	}
}
