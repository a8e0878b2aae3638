//! # Per-car work queue
//!
//! Each car owns exactly one [`CarQueue`]. The dispatcher is the only producer of
//! pickups; the car is the only consumer. Reposition and ShaftSplit directives sit in
//! their own single-entry slots next to the pickup backlog.
//!
//! Pickups are kept per waiting floor, so the car can ask "who is waiting here"
//! and "where is anyone waiting" without scanning the whole backlog.
//!
//! A [`Notify`] wakes the car whenever something is offered or the queue is ended.
//! `notify_one` stores a permit when the car is not parked yet, so an offer racing
//! with the car's emptiness check is never lost.

use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use tokio::sync::{Mutex, Notify};

use crate::directive::{Reposition, Waiting};
use crate::elevator_logic::reconfigure::SplitOrder;
use crate::floor::Floor;

/// Summary of a backlog used by the car's decision logic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueView {
    /// Highest waiting priority per floor
    pub waiting: BTreeMap<Floor, u32>,
    /// Number of waiting pickups
    pub len: usize,
}

#[derive(Default)]
struct QueueState {
    waiting: BTreeMap<Floor, BinaryHeap<Waiting>>,
    len: usize,
    reposition: Option<Reposition>,
    split: Option<SplitOrder>,
    onboard_targets: Vec<Floor>,
    ended: bool,
}

impl QueueState {
    fn is_empty(&self) -> bool {
        self.len == 0 && self.reposition.is_none() && self.split.is_none()
    }
}

/// Work assigned to one car.
#[derive(Default)]
pub struct CarQueue {
    state: Mutex<QueueState>,
    work: Notify,
}

impl CarQueue {
    #[allow(missing_docs)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pickup to the backlog and wakes the car.
    pub async fn offer_pickup(&self, waiting: Waiting) {
        let mut state = self.state.lock().await;
        state.waiting.entry(waiting.floor).or_default().push(waiting);
        state.len += 1;
        drop(state);
        self.work.notify_one();
    }

    /// Fills the reposition slot. Returns `false` if one is already queued.
    pub async fn offer_reposition(&self, reposition: Reposition) -> bool {
        let mut state = self.state.lock().await;
        if state.reposition.is_some() {
            return false;
        }
        state.reposition = Some(reposition);
        drop(state);
        self.work.notify_one();
        true
    }

    /// Fills the shaft split slot. Returns `false` if one is already queued.
    pub async fn offer_split(&self, order: SplitOrder) -> bool {
        let mut state = self.state.lock().await;
        if state.split.is_some() {
            return false;
        }
        state.split = Some(order);
        drop(state);
        self.work.notify_one();
        true
    }

    /// Removes and returns the best pickup waiting at `floor`.
    pub async fn poll_at(&self, floor: Floor) -> Option<Waiting> {
        let mut state = self.state.lock().await;
        let heap = state.waiting.get_mut(&floor)?;
        let best = heap.pop();
        if heap.is_empty() {
            state.waiting.remove(&floor);
        }
        if best.is_some() {
            state.len -= 1;
        }
        best
    }

    /// The pickup [`CarQueue::poll_at`] would return, without removing it.
    pub async fn peek_at(&self, floor: Floor) -> Option<Waiting> {
        let state = self.state.lock().await;
        state.waiting.get(&floor).and_then(|heap| heap.peek().copied())
    }

    /// Takes the pending reposition, if any.
    pub async fn take_reposition(&self) -> Option<Reposition> {
        self.state.lock().await.reposition.take()
    }

    /// Takes the pending shaft split, if any.
    pub async fn take_split(&self) -> Option<SplitOrder> {
        self.state.lock().await.split.take()
    }

    /// Removes every pickup from the backlog, best first.
    pub async fn drain(&self) -> Vec<Waiting> {
        let mut state = self.state.lock().await;
        state.len = 0;
        let mut drained: Vec<Waiting> = std::mem::take(&mut state.waiting)
            .into_values()
            .flat_map(BinaryHeap::into_vec)
            .collect();
        drained.sort_by(|a, b| b.cmp(a));
        drained
    }

    /// Number of pickups assigned but not boarded yet.
    pub async fn backlog_len(&self) -> usize {
        self.state.lock().await.len
    }

    /// True when there are no pickups and no pending directives.
    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.is_empty()
    }

    /// True once the dispatcher has declared that no more work will come.
    pub async fn is_ended(&self) -> bool {
        self.state.lock().await.ended
    }

    /// Marks the queue ended and wakes the car so it can observe it.
    pub async fn set_end(&self) {
        self.state.lock().await.ended = true;
        self.work.notify_one();
    }

    /// Parks until the queue holds work or has been ended.
    pub async fn wait_for_work(&self) {
        loop {
            {
                let state = self.state.lock().await;
                if !state.is_empty() || state.ended {
                    return;
                }
            }
            self.work.notified().await;
        }
    }

    /// Highest waiting priority per floor.
    pub async fn view(&self) -> QueueView {
        let state = self.state.lock().await;
        let waiting = state
            .waiting
            .iter()
            .filter_map(|(floor, heap)| heap.peek().map(|w| (*floor, w.priority())))
            .collect();
        QueueView { waiting, len: state.len }
    }

    /// Records where the passengers currently onboard are headed.
    pub async fn set_onboard_targets(&self, targets: Vec<Floor>) {
        self.state.lock().await.onboard_targets = targets;
    }

    /// Every floor the car already intends to stop at.
    pub async fn planned_stops(&self) -> BTreeSet<Floor> {
        let state = self.state.lock().await;
        let mut stops: BTreeSet<Floor> = state.onboard_targets.iter().copied().collect();
        for (floor, heap) in &state.waiting {
            stops.insert(*floor);
            stops.extend(heap.iter().map(|w| w.request.to));
        }
        stops
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::PersonRequest;
    use std::sync::Arc;
    use std::time::Duration;

    fn waiting(id: u32, priority: u32, from: i32, to: i32, seq: u64) -> Waiting {
        let from = Floor::new(from).unwrap();
        let to = Floor::new(to).unwrap();
        Waiting { request: PersonRequest { id, priority, from, to }, floor: from, seq }
    }

    #[tokio::test]
    async fn polls_best_at_floor_first() {
        let queue = CarQueue::new();
        queue.offer_pickup(waiting(1, 3, 2, 5, 0)).await;
        queue.offer_pickup(waiting(2, 9, 2, 4, 1)).await;
        queue.offer_pickup(waiting(3, 50, 6, 1, 2)).await;

        let f2 = Floor::new(2).unwrap();
        assert_eq!(queue.peek_at(f2).await.map(|w| w.request.id), Some(2));
        assert_eq!(queue.poll_at(f2).await.map(|w| w.request.id), Some(2));
        assert_eq!(queue.poll_at(f2).await.map(|w| w.request.id), Some(1));
        assert_eq!(queue.poll_at(f2).await, None);
        assert_eq!(queue.backlog_len().await, 1);

        let view = queue.view().await;
        assert_eq!(view.len, 1);
        assert_eq!(view.waiting.get(&Floor::new(6).unwrap()), Some(&50));
    }

    #[tokio::test]
    async fn drain_empties_backlog_best_first() {
        let queue = CarQueue::new();
        queue.offer_pickup(waiting(1, 3, 2, 5, 0)).await;
        queue.offer_pickup(waiting(2, 9, -1, 4, 1)).await;
        queue.offer_pickup(waiting(3, 9, 6, 1, 2)).await;

        let ids: Vec<u32> = queue.drain().await.iter().map(|w| w.request.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert!(queue.is_empty().await);
        assert_eq!(queue.backlog_len().await, 0);
    }

    #[tokio::test]
    async fn reposition_slot_holds_one() {
        let queue = CarQueue::new();
        let r = Reposition { car: 1, floor: Floor::new(3).unwrap(), speed: 0.2 };
        assert!(queue.offer_reposition(r).await);
        assert!(!queue.offer_reposition(r).await);
        assert!(!queue.is_empty().await);
        assert_eq!(queue.take_reposition().await, Some(r));
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn planned_stops_include_onboard_targets() {
        let queue = CarQueue::new();
        queue.offer_pickup(waiting(1, 3, 2, 5, 0)).await;
        queue.set_onboard_targets(vec![Floor::new(-3).unwrap()]).await;
        let stops: Vec<i32> = queue.planned_stops().await.into_iter().map(Floor::index).collect();
        assert_eq!(stops, vec![-3, 2, 5]);
    }

    #[tokio::test(start_paused = true)]
    async fn offer_before_wait_is_not_lost() {
        let queue = Arc::new(CarQueue::new());
        queue.offer_pickup(waiting(1, 1, 1, 2, 0)).await;
        tokio::time::timeout(Duration::from_secs(1), queue.wait_for_work())
            .await
            .expect("queue had work");

        let parked = Arc::new(CarQueue::new());
        let waiter = {
            let parked = parked.clone();
            tokio::spawn(async move { parked.wait_for_work().await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        parked.set_end().await;
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("woken by end")
            .unwrap();
        assert!(parked.is_ended().await);
    }
}
