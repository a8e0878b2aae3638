//! # Dispatcher
//!
//! The single coordinator of the fleet. It accepts every directive, keeps the backlog
//! of pickups nobody has been given yet, hands them to cars one at a time, and decides
//! when the whole fleet is done.
//!
//! ## Locking
//! The dispatcher state lock is always taken before a car queue lock, never after.
//! Cars call back into the dispatcher (`requeue`, `confirm_delivered`) only while they
//! hold no queue lock, so the order can not be inverted.
//!
//! ## Wakeups
//! The assignment loop parks on a [`Notify`] when there is nothing to assign, or when
//! no car is eligible for the head of the backlog (the fleet is busy). Every submit,
//! requeue, delivery, freed capacity and the end of input wakes it.

pub mod task_allocator;

use std::collections::{BinaryHeap, HashSet};
use std::sync::Arc;

use tokio::sync::{Mutex, Notify};

use crate::car_queue::CarQueue;
use crate::directive::{CarId, Directive, PersonId, PersonRequest, Reposition, ShaftSplit, Waiting};
use crate::elevator_logic::reconfigure::{ShaftLink, SplitOrder};
use crate::error::DirectiveError;
use crate::event::{Event, EventSink};
use crate::fleet_view::{CarStatus, SplitRole};
use crate::floor::{Floor, FloorRange};
use crate::print;

use task_allocator::Candidate;

/// What the dispatcher holds of each car.
#[derive(Clone)]
pub struct CarHandle {
    #[allow(missing_docs)]
    pub id: CarId,
    #[allow(missing_docs)]
    pub status: Arc<CarStatus>,
    #[allow(missing_docs)]
    pub queue: Arc<CarQueue>,
}

/// Passenger counters used for termination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// Pickups ever accepted
    pub received: u64,
    /// Passengers delivered to their destination
    pub arrived: u64,
}

#[derive(Default)]
struct DispatchState {
    backlog: BinaryHeap<Waiting>,
    next_seq: u64,
    counters: Counters,
    persons: HashSet<PersonId>,
    input_ended: bool,
    fleet_busy: bool,
}

impl DispatchState {
    fn push(&mut self, request: PersonRequest, floor: Floor) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.backlog.push(Waiting { request, floor, seq });
    }

    fn finished(&self) -> bool {
        self.input_ended && self.backlog.is_empty() && self.counters.received == self.counters.arrived
    }
}

struct Inner {
    state: Mutex<DispatchState>,
    wakeup: Notify,
    cars: Vec<CarHandle>,
    building: FloorRange,
    backlog_limit: usize,
    events: EventSink,
}

enum Step {
    Assigned,
    Idle,
    FleetBusy,
    Finished,
}

/// Cloneable handle to the dispatcher.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    /// Creates a dispatcher over `cars` in a building spanning `building`.
    pub fn new(cars: Vec<CarHandle>, building: FloorRange, backlog_limit: usize, events: EventSink) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(DispatchState::default()),
                wakeup: Notify::new(),
                cars,
                building,
                backlog_limit,
                events,
            }),
        }
    }

    fn car(&self, id: CarId) -> Result<&CarHandle, DirectiveError> {
        self.inner
            .cars
            .iter()
            .find(|c| c.id == id)
            .ok_or(DirectiveError::UnknownCar(id))
    }

    /// Accepts a directive from the input source.
    ///
    /// Pickups join the backlog. Reposition and ShaftSplit go straight to the named
    /// cars' queues, after the cars have been flagged so no new pickups reach them.
    ///
    /// ## Returns
    /// - `Err(DirectiveError)` if the directive was rejected. Nothing is queued in that case.
    pub async fn submit(&self, directive: Directive) -> Result<(), DirectiveError> {
        let mut state = self.inner.state.lock().await;
        if state.input_ended {
            return Err(DirectiveError::InputEnded);
        }
        let accepted = match directive {
            Directive::Pickup(request) => self.accept_pickup(&mut state, request),
            Directive::Reposition(reposition) => self.accept_reposition(reposition).await,
            Directive::ShaftSplit(split) => self.accept_split(split).await,
        };
        drop(state);

        match &accepted {
            Ok(()) => {
                print::dispatch(format!("Accepted {:?}", directive));
                self.inner.wakeup.notify_one();
            }
            Err(e) => print::warn(format!("Rejected {:?}: {}", directive, e)),
        }
        accepted
    }

    fn accept_pickup(&self, state: &mut DispatchState, request: PersonRequest) -> Result<(), DirectiveError> {
        for floor in [request.from, request.to] {
            if !self.inner.building.contains(floor) {
                return Err(DirectiveError::OutsideBuilding(floor));
            }
        }
        if request.from == request.to {
            return Err(DirectiveError::EmptyTrip(request.id));
        }
        if !state.persons.insert(request.id) {
            return Err(DirectiveError::DuplicatePerson(request.id));
        }
        state.counters.received += 1;
        state.push(request, request.from);
        Ok(())
    }

    async fn accept_reposition(&self, reposition: Reposition) -> Result<(), DirectiveError> {
        let car = self.car(reposition.car)?;
        if !(reposition.speed.is_finite() && reposition.speed > 0.0) {
            return Err(DirectiveError::InvalidSpeed(reposition.speed));
        }
        if car.status.directive_active() {
            return Err(DirectiveError::Conflict(car.id));
        }
        if !car.status.range().contains(reposition.floor) {
            return Err(DirectiveError::OutOfRange { car: car.id, floor: reposition.floor });
        }
        // Flagget settes før køen vekker bilen, ellers kan bilen rekke å rydde det først
        car.status.set_in_reposition(true);
        if !car.queue.offer_reposition(reposition).await {
            return Err(DirectiveError::Conflict(car.id));
        }
        Ok(())
    }

    async fn accept_split(&self, split: ShaftSplit) -> Result<(), DirectiveError> {
        if split.car_a == split.car_b {
            return Err(DirectiveError::SameCar(split.car_a));
        }
        let upper = self.car(split.car_a)?;
        let lower = self.car(split.car_b)?;
        for car in [upper, lower] {
            if car.status.reconfiguration_committed() {
                return Err(DirectiveError::AlreadySplit(car.id));
            }
            if car.status.directive_active() {
                return Err(DirectiveError::Conflict(car.id));
            }
        }
        let building = self.inner.building;
        if !building.contains(split.transfer) {
            return Err(DirectiveError::OutsideBuilding(split.transfer));
        }
        // Begge halvdelene må ha minst én etasje utenom overgangsetasjen
        if split.transfer == building.min || split.transfer == building.max {
            return Err(DirectiveError::OutOfRange { car: split.car_a, floor: split.transfer });
        }

        let link = Arc::new(ShaftLink::new(split));
        for (car, role) in [(upper, SplitRole::Upper), (lower, SplitRole::Lower)] {
            car.status.set_reconfiguration_pending(true);
            car.queue
                .offer_split(SplitOrder { split, role, link: link.clone(), building })
                .await;
        }
        Ok(())
    }

    /// Signals that the input source is exhausted.
    pub async fn end_input(&self) {
        self.inner.state.lock().await.input_ended = true;
        print::dispatch("Input ended".to_string());
        self.inner.wakeup.notify_one();
    }

    /// Hands a passenger back for reassignment from `floor`. Does not count as a new pickup.
    pub(crate) async fn requeue(&self, request: PersonRequest, floor: Floor) {
        self.inner.state.lock().await.push(request, floor);
        print::dispatch(format!("Person {} waits again at {}", request.id, floor));
        self.inner.wakeup.notify_one();
    }

    /// Records a delivered passenger. The id may be submitted again afterwards.
    pub(crate) async fn confirm_delivered(&self, person: PersonId) {
        {
            let mut state = self.inner.state.lock().await;
            state.counters.arrived += 1;
            state.persons.remove(&person);
        }
        print::dispatch(format!("Person {} delivered", person));
        self.inner.wakeup.notify_one();
    }

    /// A car can take work again.
    pub(crate) fn capacity_freed(&self) {
        self.inner.wakeup.notify_one();
    }

    /// Current passenger counters.
    pub async fn counters(&self) -> Counters {
        self.inner.state.lock().await.counters
    }

    /// The assignment loop. Returns once every passenger has been delivered after the
    /// end of input, having ended every car queue.
    pub async fn run(self) -> Counters {
        loop {
            match self.assign_next().await {
                Step::Assigned => continue,
                Step::Idle | Step::FleetBusy => self.inner.wakeup.notified().await,
                Step::Finished => break,
            }
        }
        for car in &self.inner.cars {
            car.queue.set_end().await;
        }
        let counters = self.counters().await;
        print::ok(format!(
            "Dispatcher done: {} received, {} arrived",
            counters.received, counters.arrived
        ));
        counters
    }

    async fn assign_next(&self) -> Step {
        let mut state = self.inner.state.lock().await;
        let Some(head) = state.backlog.peek().copied() else {
            return if state.finished() { Step::Finished } else { Step::Idle };
        };

        let candidates = self.candidates().await;
        let Some(id) = task_allocator::choose_car(&head, &candidates, self.inner.backlog_limit) else {
            if !state.fleet_busy {
                print::dispatch(format!("No car free for person {}", head.request.id));
            }
            state.fleet_busy = true;
            return Step::FleetBusy;
        };
        state.backlog.pop();
        state.fleet_busy = false;

        // RECEIVE går ut før bilen kan se passasjeren, så den kommer før bilens egne hendelser
        self.inner.events.emit(Event::Receive { person: head.request.id, car: id });
        // Køen fylles mens dispatcher-låsen holdes, så et nytt direktiv kan ikke snike seg imellom
        if let Ok(car) = self.car(id) {
            car.queue.offer_pickup(head).await;
        }
        Step::Assigned
    }

    async fn candidates(&self) -> Vec<Candidate> {
        let mut candidates = Vec::with_capacity(self.inner.cars.len());
        for car in &self.inner.cars {
            let range = car.status.range();
            let split = car.status.split_role().map(|role| {
                let transfer = match role {
                    SplitRole::Upper => range.min,
                    SplitRole::Lower => range.max,
                };
                (transfer, role)
            });
            candidates.push(Candidate {
                id: car.id,
                floor: car.status.floor(),
                range,
                split,
                directive_active: car.status.directive_active(),
                backlog: car.queue.backlog_len().await,
                planned_stops: car.queue.planned_stops().await,
            });
        }
        candidates
    }
}
