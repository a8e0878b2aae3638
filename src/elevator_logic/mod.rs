//! # Car control loop
//!
//! Every car runs [`Car::run`] as its own tokio task. Per iteration it picks the most
//! urgent thing to do, in this order:
//! 1. Continue an active Reposition
//! 2. Start a pending Reposition
//! 3. Start a pending ShaftSplit ([`reconfigure`])
//! 4. Normal scan ([`request::choose_direction`]), which opens the doors ([`fsm`]),
//!    moves one floor, or waits
//!
//! A car parks on its queue only when it has nothing onboard, no backlog and no directive,
//! and leaves the loop once the dispatcher has ended its queue in that state.

pub mod fsm;
pub mod reconfigure;
pub mod request;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use crate::car_queue::CarQueue;
use crate::config::FleetConfig;
use crate::directive::{CarId, PersonRequest, Reposition};
use crate::event::{Event, EventSink};
use crate::fleet_view::{CarBehaviour, CarSnapshot, CarStatus, Dirn, SplitRole};
use crate::floor::{Floor, FloorRange};
use crate::manager::Dispatcher;
use crate::print;

use reconfigure::ShaftLink;
use request::CarSight;

/// One elevator car and everything its control loop owns.
pub struct Car {
    pub(crate) id: CarId,
    pub(crate) floor: Floor,
    pub(crate) dirn: Dirn,
    pub(crate) range: FloorRange,
    pub(crate) onboard: Vec<PersonRequest>,
    pub(crate) travel_time: Duration,
    pub(crate) reposition: Option<Reposition>,
    pub(crate) link: Option<(Arc<ShaftLink>, SplitRole)>,
    pub(crate) config: FleetConfig,
    pub(crate) status: Arc<CarStatus>,
    pub(crate) queue: Arc<CarQueue>,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) events: EventSink,
}

impl Car {
    /// Builds a car parked at its status' floor with the full range of the status.
    pub fn new(
        config: FleetConfig,
        status: Arc<CarStatus>,
        queue: Arc<CarQueue>,
        dispatcher: Dispatcher,
        events: EventSink,
    ) -> Self {
        Self {
            id: status.id(),
            floor: status.floor(),
            dirn: Dirn::Stop,
            range: status.range(),
            onboard: Vec::with_capacity(config.capacity),
            travel_time: config.travel_time,
            reposition: None,
            link: None,
            config,
            status,
            queue,
            dispatcher,
            events,
        }
    }

    /// Transfer floor of the shaft this car was split from, if any.
    pub(crate) fn transfer(&self) -> Option<Floor> {
        self.link.as_ref().map(|(link, _)| link.transfer())
    }

    pub(crate) fn sight<'a>(&'a self, waiting: &'a BTreeMap<Floor, u32>) -> CarSight<'a> {
        CarSight {
            floor: self.floor,
            dirn: self.dirn,
            range: self.range,
            transfer: self.transfer(),
            capacity: self.config.capacity,
            preempt_factor: self.config.preempt_factor,
            onboard: &self.onboard,
            waiting,
        }
    }

    /// Mirrors the onboard passengers into the status record and the queue.
    pub(crate) async fn publish_onboard(&self) {
        self.status.set_onboard(self.onboard.len());
        let targets = self
            .onboard
            .iter()
            .map(|p| request::drop_off(self.range, self.transfer(), p.to))
            .collect();
        self.queue.set_onboard_targets(targets).await;
    }

    /// Runs the control loop until the dispatcher ends the queue and the car is idle.
    ///
    /// ## Returns
    /// - The final state of the car
    pub async fn run(mut self) -> CarSnapshot {
        print::info(format!("Car {} started at {} serving {}", self.id, self.floor, self.range));
        loop {
            if let Some(target) = self.reposition {
                self.continue_reposition(target).await;
                continue;
            }
            if let Some(reposition) = self.queue.take_reposition().await {
                self.begin_reposition(reposition).await;
                continue;
            }
            if let Some(order) = self.queue.take_split().await {
                reconfigure::execute(&mut self, order).await;
                continue;
            }

            let view = self.queue.view().await;
            if view.len == 0 && self.onboard.is_empty() {
                if let Some(dirn) = self.off_transfer_floor() {
                    let hop = self.travel_time;
                    self.travel(dirn, hop).await;
                    continue;
                }
                self.dirn = Dirn::Stop;
                self.status.set_behaviour(CarBehaviour::Wait);
                if self.queue.is_ended().await && self.queue.is_empty().await {
                    break;
                }
                self.queue.wait_for_work().await;
                continue;
            }

            let next = request::choose_direction(&self.sight(&view.waiting));
            match next.behaviour {
                CarBehaviour::DoorOpen => fsm::door_cycle(&mut self).await,
                CarBehaviour::Move | CarBehaviour::Reverse => {
                    let hop = self.travel_time;
                    self.travel(next.dirn, hop).await;
                }
                CarBehaviour::Wait | CarBehaviour::Reconfigure => {
                    self.status.set_behaviour(CarBehaviour::Wait);
                    sleep(self.config.poll_period).await;
                }
            }
        }

        let snapshot = CarSnapshot::read(&self.status, self.queue.backlog_len().await);
        print::ok(format!("Car {} done at {}", self.id, self.floor));
        snapshot
    }

    /// Direction that takes an idle car off the shared transfer floor.
    fn off_transfer_floor(&self) -> Option<Dirn> {
        match &self.link {
            Some((link, role)) if link.transfer() == self.floor => Some(role.away_from_transfer()),
            _ => None,
        }
    }

    /// Moves one floor in `dirn`, taking `hop` time.
    ///
    /// A split car only moves onto the transfer floor after claiming it. If the partner
    /// is there the car stays put for one poll period instead.
    pub(crate) async fn travel(&mut self, dirn: Dirn, hop: Duration) {
        let next = dirn.step(self.floor);
        if dirn == Dirn::Stop || !self.range.contains(next) {
            print::cosmic_err(format!("car {} told to leave {} for {}", self.id, self.range, next));
            sleep(self.config.poll_period).await;
            return;
        }

        let transfer = self.transfer();
        if transfer == Some(next) {
            let claimed = self.link.as_ref().map_or(true, |(link, _)| link.try_enter(self.id));
            if !claimed {
                self.status.set_behaviour(CarBehaviour::Wait);
                sleep(self.config.poll_period).await;
                return;
            }
            self.status.set_occupying_transfer_floor(true);
        }

        let behaviour = if self.dirn != Dirn::Stop && self.dirn != dirn {
            CarBehaviour::Reverse
        } else {
            CarBehaviour::Move
        };
        self.status.set_behaviour(behaviour);
        self.dirn = dirn;

        sleep(hop).await;
        let left = self.floor;
        self.floor = next;
        self.status.set_floor(next);
        self.events.emit(Event::Arrive { floor: next, car: self.id });

        if transfer == Some(left) {
            if let Some((link, _)) = &self.link {
                link.leave(self.id);
            }
            self.status.set_occupying_transfer_floor(false);
        }
    }

    /// Starts a Reposition: announces it and hands the backlog back to the dispatcher.
    async fn begin_reposition(&mut self, reposition: Reposition) {
        print::car(self.id, format!("Repositioning to {} at {}s per floor", reposition.floor, reposition.speed));
        self.events.emit(Event::ScheduleBegin { car: self.id });
        self.reposition = Some(reposition);
        for waiting in self.queue.drain().await {
            self.dispatcher.requeue(waiting.request, waiting.floor).await;
        }
    }

    /// One step of an active Reposition: a hop towards the target, or the final discharge.
    async fn continue_reposition(&mut self, reposition: Reposition) {
        if self.floor != reposition.floor {
            let dirn = Dirn::towards(self.floor, reposition.floor);
            self.travel(dirn, Duration::from_secs_f64(reposition.speed)).await;
            return;
        }

        let dwell = self.config.reposition_dwell;
        fsm::discharge_all(self, dwell).await;
        self.reposition = None;
        self.dirn = Dirn::Stop;
        self.status.set_behaviour(CarBehaviour::Wait);
        self.events.emit(Event::ScheduleEnd { car: self.id });
        self.status.set_in_reposition(false);
        self.dispatcher.capacity_freed();
    }
}
