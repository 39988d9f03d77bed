//! Push-based change notification for store observers.
//!
//! Every committed mutation publishes a [ChangeEvent] on the [ChangeBus].
//! Observers hold a [LiveQuery], which re-runs its query whenever a
//! relevant event arrives. Query results are always read fresh from the
//! store and never cached.

use tokio::sync::broadcast;

use crate::{Error, database_id::GoalId};

/// A committed mutation that observers may need to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    /// A goal row was inserted, updated, or deleted.
    ///
    /// Goal-list observers should also watch [ChangeEvent::Ledger], since
    /// the derived progress attached to each goal changes with the ledger.
    Goals,
    /// A transaction was appended to the given goal's ledger (or removed
    /// with the goal).
    Ledger(GoalId),
    /// A preference value changed.
    Preferences,
    /// A widget binding changed.
    Widgets,
}

/// Lightweight broadcast bus that fans out change events to any active
/// observer.
#[derive(Debug, Clone)]
pub struct ChangeBus {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeBus {
    /// Create a bus that buffers up to `capacity` undelivered events per
    /// observer.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to all future change events.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    /// Publish a committed mutation to all observers.
    pub fn publish(&self, event: ChangeEvent) {
        // Sending fails only when there are no observers, which is fine.
        let _ = self.sender.send(event);
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        // Observers re-query rather than replay events, so a small buffer
        // is enough: lagging just coalesces into one refresh.
        Self::new(16)
    }
}

/// A query that re-runs whenever a relevant mutation is committed.
///
/// `relevant` filters the event stream; `query` reads fresh results from
/// the store. A lagged observer (more events than the bus buffers) simply
/// re-queries, since results are always rebuilt from the store rather than
/// patched incrementally.
pub struct LiveQuery<T, Q, F>
where
    Q: FnMut() -> Result<T, Error>,
    F: Fn(&ChangeEvent) -> bool,
{
    receiver: broadcast::Receiver<ChangeEvent>,
    query: Q,
    relevant: F,
}

impl<T, Q, F> LiveQuery<T, Q, F>
where
    Q: FnMut() -> Result<T, Error>,
    F: Fn(&ChangeEvent) -> bool,
{
    /// Observe `bus`, re-running `query` for events where `relevant`
    /// returns true.
    pub fn new(bus: &ChangeBus, relevant: F, query: Q) -> Self {
        Self {
            receiver: bus.subscribe(),
            query,
            relevant,
        }
    }

    /// Run the query immediately, e.g. for the first render.
    pub fn current(&mut self) -> Result<T, Error> {
        (self.query)()
    }

    /// Wait for the next relevant mutation and return the fresh query
    /// result.
    ///
    /// Returns `None` once the bus is closed (all publishers dropped).
    pub async fn next_update(&mut self) -> Option<Result<T, Error>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if (self.relevant)(&event) => return Some((self.query)()),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => return Some((self.query)()),
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::{ChangeBus, ChangeEvent, LiveQuery};

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = ChangeBus::default();
        let mut receiver = bus.subscribe();

        bus.publish(ChangeEvent::Goals);

        assert_eq!(receiver.recv().await.unwrap(), ChangeEvent::Goals);
    }

    #[test]
    fn publishing_without_observers_does_not_panic() {
        let bus = ChangeBus::default();

        bus.publish(ChangeEvent::Preferences);
    }

    #[tokio::test]
    async fn live_query_reruns_on_relevant_event() {
        let bus = ChangeBus::default();
        let runs = Arc::new(AtomicUsize::new(0));
        let query_runs = Arc::clone(&runs);

        let mut live = LiveQuery::new(
            &bus,
            |event| matches!(event, ChangeEvent::Goals | ChangeEvent::Ledger(_)),
            move || Ok(query_runs.fetch_add(1, Ordering::SeqCst) + 1),
        );

        assert_eq!(live.current(), Ok(1));

        bus.publish(ChangeEvent::Ledger(1));
        assert_eq!(live.next_update().await, Some(Ok(2)));
    }

    #[tokio::test]
    async fn live_query_skips_irrelevant_events() {
        let bus = ChangeBus::default();

        let mut live = LiveQuery::new(
            &bus,
            |event| matches!(event, ChangeEvent::Goals),
            || Ok("fresh"),
        );

        bus.publish(ChangeEvent::Widgets);
        bus.publish(ChangeEvent::Preferences);
        bus.publish(ChangeEvent::Goals);

        // Only the goals event produces an update.
        assert_eq!(live.next_update().await, Some(Ok("fresh")));
    }

    #[tokio::test]
    async fn live_query_ends_when_the_bus_is_dropped() {
        let bus = ChangeBus::new(4);
        let mut live = LiveQuery::new(&bus, |_| true, || Ok(()));
        drop(bus);

        assert_eq!(live.next_update().await, None);
    }
}
