//! # Shaft split
//!
//! Two cars that share a shaft can be split at a transfer floor. Afterwards the upper
//! car serves `[transfer, max]` and the lower car `[min, transfer]`, so the transfer
//! floor is the only floor both cars may visit.
//!
//! The pair shares one [`ShaftLink`]:
//! - an occupant slot for the transfer floor. A car claims it with compare-and-swap
//!   before it moves onto the floor and releases it after leaving, so the two cars
//!   are never there at the same time.
//! - a two-party barrier. Both cars meet on it to bracket the reconfiguration with
//!   `UPDATE-BEGIN` and `UPDATE-END`, emitted by whichever car arrives last.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::Barrier;
use tokio::time::sleep;

use crate::directive::{CarId, ShaftSplit};
use crate::elevator_logic::{fsm, Car};
use crate::event::Event;
use crate::fleet_view::{CarBehaviour, Dirn, SplitRole};
use crate::floor::{Floor, FloorRange};
use crate::print;

const FREE: u8 = 0;

/// State shared by the two cars of a split shaft.
#[derive(Debug)]
pub struct ShaftLink {
    split: ShaftSplit,
    occupant: AtomicU8,
    barrier: Barrier,
}

impl ShaftLink {
    #[allow(missing_docs)]
    pub fn new(split: ShaftSplit) -> Self {
        Self {
            split,
            occupant: AtomicU8::new(FREE),
            barrier: Barrier::new(2),
        }
    }

    /// The floor both cars share.
    pub fn transfer(&self) -> Floor {
        self.split.transfer
    }

    /// Claims the transfer floor for `car`. Returns `false` while the partner holds it.
    pub fn try_enter(&self, car: CarId) -> bool {
        match self.occupant.compare_exchange(FREE, car, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => true,
            Err(current) => current == car,
        }
    }

    /// Releases the transfer floor if `car` holds it.
    pub fn leave(&self, car: CarId) {
        let _ = self.occupant.compare_exchange(car, FREE, Ordering::SeqCst, Ordering::SeqCst);
    }

    /// The car currently on the transfer floor.
    pub fn occupant(&self) -> Option<CarId> {
        match self.occupant.load(Ordering::SeqCst) {
            FREE => None,
            car => Some(car),
        }
    }

    /// Waits for the partner. Returns `true` for the car that arrived last.
    async fn rendezvous(&self) -> bool {
        self.barrier.wait().await.is_leader()
    }
}

/// A shaft split as delivered to one of the two cars.
#[derive(Debug)]
pub struct SplitOrder {
    #[allow(missing_docs)]
    pub split: ShaftSplit,
    /// Which half this car keeps
    pub role: SplitRole,
    #[allow(missing_docs)]
    pub link: Arc<ShaftLink>,
    /// Range of the whole building, split at the transfer floor
    pub building: FloorRange,
}

/// Runs the whole reconfiguration for one car of the pair.
///
/// ## Steps
/// - Meet the partner and emit `UPDATE-BEGIN` once for the pair
/// - Discharge everyone onboard at the current floor
/// - Hand the not yet boarded backlog back to the dispatcher
/// - Hold for the settle time
/// - Commit: narrow the range, park one floor beyond the transfer floor, switch travel rate
/// - Meet the partner again and emit `UPDATE-END` once for the pair
/// - Clear the pending flag and tell the dispatcher the car takes work again
pub async fn execute(car: &mut Car, order: SplitOrder) {
    let SplitOrder { split, role, link, building } = order;
    car.status.set_behaviour(CarBehaviour::Reconfigure);
    print::car(car.id, format!("Splitting shaft at {} as the {} car", split.transfer, role.as_str()));

    if link.rendezvous().await {
        car.events.emit(Event::SplitBegin { car_a: split.car_a, car_b: split.car_b });
    }
    // Ingen av bilene går videre før BEGIN er sendt
    link.rendezvous().await;

    if !car.onboard.is_empty() {
        let door_time = car.config.door_time;
        fsm::discharge_all(car, door_time).await;
        car.status.set_behaviour(CarBehaviour::Reconfigure);
    }
    let returned = car.queue.drain().await;
    for waiting in returned {
        car.dispatcher.requeue(waiting.request, waiting.floor).await;
    }

    sleep(car.config.split_settle).await;

    let range = role.range(split.transfer, building);
    car.range = range;
    car.floor = role.parked_floor(split.transfer);
    car.dirn = Dirn::Stop;
    car.travel_time = car.config.split_travel_time;
    car.link = Some((link.clone(), role));
    car.status.set_floor(car.floor);
    car.status.commit_split(role, range);

    if link.rendezvous().await {
        car.events.emit(Event::SplitEnd { car_a: split.car_a, car_b: split.car_b });
    }
    link.rendezvous().await;

    // Først etter END kan bilen få nye oppdrag
    car.status.set_reconfiguration_pending(false);
    car.status.set_behaviour(CarBehaviour::Wait);
    print::car(car.id, format!("Now serving {} from {}", range, car.floor));
    car.dispatcher.capacity_freed();
}


#[cfg(test)]
mod tests {
    use super::*;

    fn link() -> ShaftLink {
        ShaftLink::new(ShaftSplit { car_a: 1, car_b: 2, transfer: Floor::above(3) })
    }

    #[test]
    fn transfer_floor_admits_one_car() {
        let link = link();
        assert!(link.try_enter(1));
        assert!(link.try_enter(1));
        assert!(!link.try_enter(2));
        assert_eq!(link.occupant(), Some(1));

        link.leave(2);
        assert_eq!(link.occupant(), Some(1));
        link.leave(1);
        assert_eq!(link.occupant(), None);
        assert!(link.try_enter(2));
    }

    #[tokio::test]
    async fn rendezvous_elects_one_leader() {
        let link = Arc::new(link());
        let other = {
            let link = link.clone();
            tokio::spawn(async move { link.rendezvous().await })
        };
        let mine = link.rendezvous().await;
        let theirs = other.await.unwrap();
        assert!(mine ^ theirs);
    }
}
