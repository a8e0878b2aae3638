//! # Fleet view
//!
//! The state of each car that other components are allowed to look at without going
//! through a queue. Every field is an atomic written only by the car itself, except the
//! directive flags which the dispatcher raises to signal a pending Reposition or ShaftSplit.
//!
//! Both the dispatcher (eligibility checks) and a split partner poll these records every
//! decision cycle, so they are plain atomics rather than lock-protected state.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU8, AtomicUsize, Ordering};

use serde::Serialize;

use crate::directive::CarId;
use crate::floor::{Floor, FloorRange};

#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
/// Direction a car is travelling or scanning in.
pub enum Dirn {
    Down = -1,
    Stop = 0,
    Up = 1,
}

impl Dirn {
    /// The floor one hop away in this direction. `Stop` stays put.
    pub fn step(self, floor: Floor) -> Floor {
        match self {
            Dirn::Up => floor.up(),
            Dirn::Down => floor.down(),
            Dirn::Stop => floor,
        }
    }

    /// Direction that leads from `from` towards `to`.
    pub fn towards(from: Floor, to: Floor) -> Dirn {
        match to.cmp(&from) {
            std::cmp::Ordering::Greater => Dirn::Up,
            std::cmp::Ordering::Less => Dirn::Down,
            std::cmp::Ordering::Equal => Dirn::Stop,
        }
    }
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
/// The control-loop state of a car.
pub enum CarBehaviour {
    Wait = 0,
    Move = 1,
    Reverse = 2,
    DoorOpen = 3,
    Reconfigure = 4,
}

impl CarBehaviour {
    /// Short label used in the fleet table.
    pub fn as_str(self) -> &'static str {
        match self {
            CarBehaviour::Wait => "WAIT",
            CarBehaviour::Move => "MOVE",
            CarBehaviour::Reverse => "REVERSE",
            CarBehaviour::DoorOpen => "DOOR_OPEN",
            CarBehaviour::Reconfigure => "RECONFIGURE",
        }
    }

    fn from_u8(raw: u8) -> CarBehaviour {
        match raw {
            1 => CarBehaviour::Move,
            2 => CarBehaviour::Reverse,
            3 => CarBehaviour::DoorOpen,
            4 => CarBehaviour::Reconfigure,
            _ => CarBehaviour::Wait,
        }
    }
}

/// Which half of a split shaft a car serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SplitRole {
    /// Serves `[transfer, max]`
    Upper = 1,
    /// Serves `[min, transfer]`
    Lower = 2,
}

impl SplitRole {
    /// Label used in the fleet table.
    pub fn as_str(self) -> &'static str {
        match self {
            SplitRole::Upper => "upper",
            SplitRole::Lower => "lower",
        }
    }

    /// The range this half keeps after splitting `building` at `transfer`.
    pub fn range(self, transfer: Floor, building: FloorRange) -> FloorRange {
        match self {
            SplitRole::Upper => FloorRange { min: transfer, max: building.max },
            SplitRole::Lower => FloorRange { min: building.min, max: transfer },
        }
    }

    /// The floor one step beyond the transfer floor, into this half's exclusive part.
    pub fn parked_floor(self, transfer: Floor) -> Floor {
        match self {
            SplitRole::Upper => transfer.up(),
            SplitRole::Lower => transfer.down(),
        }
    }

    /// Direction that leads away from the transfer floor into this half.
    pub fn away_from_transfer(self) -> Dirn {
        match self {
            SplitRole::Upper => Dirn::Up,
            SplitRole::Lower => Dirn::Down,
        }
    }

    fn from_u8(raw: u8) -> Option<SplitRole> {
        match raw {
            1 => Some(SplitRole::Upper),
            2 => Some(SplitRole::Lower),
            _ => None,
        }
    }
}

/// Atomically shared status of one car.
#[derive(Debug)]
pub struct CarStatus {
    id: CarId,
    floor: AtomicI32,
    min: AtomicI32,
    max: AtomicI32,
    behaviour: AtomicU8,
    onboard: AtomicUsize,
    split_role: AtomicU8,
    in_reposition: AtomicBool,
    reconfiguration_pending: AtomicBool,
    reconfiguration_committed: AtomicBool,
    occupying_transfer_floor: AtomicBool,
}

impl CarStatus {
    /// Status of a car parked at `home` and able to reach all of `range`.
    pub fn new(id: CarId, home: Floor, range: FloorRange) -> Self {
        Self {
            id,
            floor: AtomicI32::new(home.index()),
            min: AtomicI32::new(range.min.index()),
            max: AtomicI32::new(range.max.index()),
            behaviour: AtomicU8::new(CarBehaviour::Wait as u8),
            onboard: AtomicUsize::new(0),
            split_role: AtomicU8::new(0),
            in_reposition: AtomicBool::new(false),
            reconfiguration_pending: AtomicBool::new(false),
            reconfiguration_committed: AtomicBool::new(false),
            occupying_transfer_floor: AtomicBool::new(false),
        }
    }

    #[allow(missing_docs)]
    pub fn id(&self) -> CarId {
        self.id
    }

    /// Current floor of the car.
    pub fn floor(&self) -> Floor {
        Floor::from_stored(self.floor.load(Ordering::SeqCst))
    }

    pub(crate) fn set_floor(&self, floor: Floor) {
        self.floor.store(floor.index(), Ordering::SeqCst);
    }

    /// Floors the car may currently serve.
    pub fn range(&self) -> FloorRange {
        FloorRange {
            min: Floor::from_stored(self.min.load(Ordering::SeqCst)),
            max: Floor::from_stored(self.max.load(Ordering::SeqCst)),
        }
    }

    pub(crate) fn set_range(&self, range: FloorRange) {
        self.min.store(range.min.index(), Ordering::SeqCst);
        self.max.store(range.max.index(), Ordering::SeqCst);
    }

    #[allow(missing_docs)]
    pub fn behaviour(&self) -> CarBehaviour {
        CarBehaviour::from_u8(self.behaviour.load(Ordering::SeqCst))
    }

    pub(crate) fn set_behaviour(&self, behaviour: CarBehaviour) {
        self.behaviour.store(behaviour as u8, Ordering::SeqCst);
    }

    /// Number of passengers onboard.
    pub fn onboard(&self) -> usize {
        self.onboard.load(Ordering::SeqCst)
    }

    pub(crate) fn set_onboard(&self, count: usize) {
        self.onboard.store(count, Ordering::SeqCst);
    }

    /// Half of a split shaft this car serves, if it has been split.
    pub fn split_role(&self) -> Option<SplitRole> {
        SplitRole::from_u8(self.split_role.load(Ordering::SeqCst))
    }

    /// True from the moment a Reposition is accepted until the car has finished it.
    pub fn in_reposition(&self) -> bool {
        self.in_reposition.load(Ordering::SeqCst)
    }

    pub(crate) fn set_in_reposition(&self, on: bool) {
        self.in_reposition.store(on, Ordering::SeqCst);
    }

    /// True from the moment a ShaftSplit is accepted until it commits.
    pub fn reconfiguration_pending(&self) -> bool {
        self.reconfiguration_pending.load(Ordering::SeqCst)
    }

    pub(crate) fn set_reconfiguration_pending(&self, on: bool) {
        self.reconfiguration_pending.store(on, Ordering::SeqCst);
    }

    /// True once the car's range has been narrowed by a ShaftSplit.
    pub fn reconfiguration_committed(&self) -> bool {
        self.reconfiguration_committed.load(Ordering::SeqCst)
    }

    /// Publishes the narrowed range and role. The car stays ineligible until
    /// `reconfiguration_pending` is cleared after the pair has emitted `UPDATE-END`.
    pub(crate) fn commit_split(&self, role: SplitRole, range: FloorRange) {
        self.set_range(range);
        self.split_role.store(role as u8, Ordering::SeqCst);
        self.reconfiguration_committed.store(true, Ordering::SeqCst);
    }

    /// True while the car holds the shared transfer floor.
    pub fn occupying_transfer_floor(&self) -> bool {
        self.occupying_transfer_floor.load(Ordering::SeqCst)
    }

    pub(crate) fn set_occupying_transfer_floor(&self, on: bool) {
        self.occupying_transfer_floor.store(on, Ordering::SeqCst);
    }

    /// Whether the car is busy with, or about to start, a Reposition or ShaftSplit.
    pub fn directive_active(&self) -> bool {
        self.in_reposition() || self.reconfiguration_pending()
    }
}

/// A point-in-time copy of a car's state, used for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct CarSnapshot {
    #[allow(missing_docs)]
    pub id: CarId,
    #[allow(missing_docs)]
    pub floor: Floor,
    #[allow(missing_docs)]
    pub range: FloorRange,
    #[allow(missing_docs)]
    pub behaviour: CarBehaviour,
    /// Passengers onboard
    pub onboard: usize,
    /// Assigned but not yet boarded
    pub backlog: usize,
    #[allow(missing_docs)]
    pub split_role: Option<SplitRole>,
}

impl CarSnapshot {
    /// Reads a snapshot out of a status record. `backlog` comes from the car's queue.
    pub fn read(status: &CarStatus, backlog: usize) -> Self {
        Self {
            id: status.id(),
            floor: status.floor(),
            range: status.range(),
            behaviour: status.behaviour(),
            onboard: status.onboard(),
            backlog,
            split_role: status.split_role(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_roles_share_only_the_transfer_floor() {
        let building = FloorRange::new(Floor::basement(4), Floor::above(7)).unwrap();
        let transfer = Floor::above(3);
        let upper = SplitRole::Upper.range(transfer, building);
        let lower = SplitRole::Lower.range(transfer, building);
        let shared: Vec<Floor> = building.iter().filter(|f| upper.contains(*f) && lower.contains(*f)).collect();
        assert_eq!(shared, vec![transfer]);
        assert_eq!(SplitRole::Upper.parked_floor(transfer), Floor::above(4));
        assert_eq!(SplitRole::Lower.parked_floor(Floor::above(1)), Floor::basement(1));
    }

    #[test]
    fn status_round_trips_through_atomics() {
        let building = FloorRange::new(Floor::basement(4), Floor::above(7)).unwrap();
        let status = CarStatus::new(3, Floor::above(1), building);
        status.set_floor(Floor::basement(2));
        status.set_behaviour(CarBehaviour::Reverse);
        assert_eq!(status.floor(), Floor::basement(2));
        assert_eq!(status.behaviour(), CarBehaviour::Reverse);
        assert_eq!(status.split_role(), None);

        status.set_reconfiguration_pending(true);
        assert!(status.directive_active());
        let range = SplitRole::Lower.range(Floor::above(2), building);
        status.commit_split(SplitRole::Lower, range);
        assert!(status.directive_active());
        assert!(status.reconfiguration_committed());
        status.set_reconfiguration_pending(false);
        assert!(!status.directive_active());
        assert_eq!(status.range(), range);
        assert_eq!(status.split_role(), Some(SplitRole::Lower));
    }

    #[test]
    fn towards_picks_the_shorter_side() {
        assert_eq!(Dirn::towards(Floor::above(1), Floor::above(5)), Dirn::Up);
        assert_eq!(Dirn::towards(Floor::above(1), Floor::basement(1)), Dirn::Down);
        assert_eq!(Dirn::towards(Floor::above(2), Floor::above(2)), Dirn::Stop);
    }
}
