/// Generation counter for armed timers.
///
/// Every cancellation bumps the session epoch; a tick carrying an older epoch
/// is stale and must be ignored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Epoch(u64);

impl Epoch {
	pub fn next(self) -> Self {
		Self(self.0.wrapping_add(1))
	}
}

/// Periodic timer driven by logical time instead of the wall clock.
#[derive(Clone, Debug)]
pub struct Ticker {
	period_ms: f64,
	elapsed_ms: f64,
	epoch: Epoch,
}

impl Ticker {
	pub fn armed(period_ms: f64, epoch: Epoch) -> Self {
		Self {
			period_ms: period_ms.max(1.0),
			elapsed_ms: 0.0,
			epoch,
		}
	}

	pub fn epoch(&self) -> Epoch {
		self.epoch
	}

	/// Time left until the next fire.
	pub fn remaining_ms(&self) -> f64 {
		(self.period_ms - self.elapsed_ms).max(0.0)
	}

	pub fn elapse(&mut self, dt_ms: f64) {
		self.elapsed_ms += dt_ms;
	}

	/// Starts the next period after a fire.
	pub fn rearm(&mut self) {
		self.elapsed_ms = (self.elapsed_ms - self.period_ms).max(0.0);
	}
}
