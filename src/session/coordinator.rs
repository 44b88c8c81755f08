// std
use std::sync::atomic::{AtomicUsize, Ordering};
// self
use crate::{_prelude::*, error::RefreshFailure};

/// Result every request in a refresh batch is released with.
pub type RefreshOutcome = Result<(), RefreshFailure>;

/// Single-instance refresh state: idle, or refreshing with one batch of waiters.
///
/// The mutex only guards the hand-off between "start a refresh" and "join the running one"; it is
/// never held across an `.await`. Waiters park on the batch's one-shot cell instead.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
	inflight: Mutex<Option<Arc<RefreshBatch>>>,
}
impl RefreshCoordinator {
	/// Creates an idle coordinator.
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	/// Leads a new refresh when idle, or joins the batch of the refresh in flight.
	pub fn enter(self: &Arc<Self>) -> RefreshTicket {
		let mut inflight = self.inflight.lock();

		match inflight.as_ref() {
			Some(batch) => {
				batch.waiters.fetch_add(1, Ordering::Relaxed);

				RefreshTicket::Follow(RefreshWaiter { batch: Arc::clone(batch) })
			},
			None => {
				let batch = Arc::new(RefreshBatch::new());

				*inflight = Some(Arc::clone(&batch));

				RefreshTicket::Lead(RefreshLease {
					coordinator: Arc::clone(self),
					batch,
					settled: false,
				})
			},
		}
	}

	/// Returns true while a refresh is in flight.
	pub fn is_refreshing(&self) -> bool {
		self.inflight.lock().is_some()
	}

	/// Returns how many requests are parked on the refresh in flight.
	pub fn queued(&self) -> usize {
		self.inflight.lock().as_ref().map_or(0, |batch| batch.waiters.load(Ordering::Relaxed))
	}
}

/// Role handed out by [`RefreshCoordinator::enter`].
#[derive(Debug)]
pub enum RefreshTicket {
	/// Caller must perform the refresh and settle the lease.
	Lead(RefreshLease),
	/// Caller must wait for the leader's outcome.
	Follow(RefreshWaiter),
}

/// Obligation to settle the refresh in flight.
///
/// Dropping an unsettled lease (the leader's future was cancelled) settles it as abandoned, so the
/// batch is always released and the coordinator always returns to idle.
#[derive(Debug)]
pub struct RefreshLease {
	coordinator: Arc<RefreshCoordinator>,
	batch: Arc<RefreshBatch>,
	settled: bool,
}
impl RefreshLease {
	/// Returns the coordinator to idle, then releases every waiter with `outcome`.
	///
	/// Returns the number of waiters released.
	pub fn settle(mut self, outcome: RefreshOutcome) -> usize {
		self.release(outcome)
	}

	fn release(&mut self, outcome: RefreshOutcome) -> usize {
		{
			let mut inflight = self.coordinator.inflight.lock();

			if inflight.as_ref().is_some_and(|batch| Arc::ptr_eq(batch, &self.batch)) {
				*inflight = None;
			}
		}

		self.settled = true;

		// No waiter can join once the batch left the coordinator, so the count is final.
		let released = self.batch.waiters.load(Ordering::Relaxed);
		let _ = self.batch.outcome.set_blocking(outcome);

		released
	}
}
impl Drop for RefreshLease {
	fn drop(&mut self) {
		if !self.settled {
			self.release(Err(RefreshFailure::abandoned()));
		}
	}
}

/// Parked request waiting for the leader's outcome.
#[derive(Debug)]
pub struct RefreshWaiter {
	batch: Arc<RefreshBatch>,
}
impl RefreshWaiter {
	/// Waits until the refresh settles and returns its outcome.
	pub async fn wait(self) -> RefreshOutcome {
		self.batch.outcome.wait().await.clone()
	}
}

struct RefreshBatch {
	outcome: AsyncOnceCell<RefreshOutcome>,
	waiters: AtomicUsize,
}
impl RefreshBatch {
	fn new() -> Self {
		Self { outcome: AsyncOnceCell::new(), waiters: AtomicUsize::new(0) }
	}
}
impl Debug for RefreshBatch {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshBatch")
			.field("settled", &self.outcome.is_initialized())
			.field("waiters", &self.waiters.load(Ordering::Relaxed))
			.finish()
	}
}
