//! Car decision logic.
//!
//! Stateless functions that look at a snapshot of one car ([`CarSight`]) and decide
//! what it does next: open the doors, move one floor, or wait. The car's control loop
//! handles Reposition and ShaftSplit before it asks here, so this module only covers
//! the normal LOOK-style scan.
//!
//! # Decision order
//! 1. Someone onboard gets off here (destination, or the transfer floor for a
//!    passenger this car cannot take further): open.
//! 2. Someone waiting here can board, or would preempt the lowest priority passenger: open.
//! 3. Passengers onboard: move towards the side with the larger sum of
//!    `priority / distance`. Ties keep the current direction.
//! 4. Only waiting pickups: move towards the nearest waiting floor, current direction first.
//! 5. Otherwise wait.

use std::collections::BTreeMap;

use crate::directive::PersonRequest;
use crate::fleet_view::{CarBehaviour, Dirn};
use crate::floor::{Floor, FloorRange};

/// Direction and behaviour chosen for the next step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirnBehaviourPair {
    /// direction of the car
    pub dirn: Dirn,

    /// the behaviour of the car
    pub behaviour: CarBehaviour,
}

impl DirnBehaviourPair {
    fn open(dirn: Dirn) -> Self {
        Self { dirn, behaviour: CarBehaviour::DoorOpen }
    }

    fn wait() -> Self {
        Self { dirn: Dirn::Stop, behaviour: CarBehaviour::Wait }
    }

    /// `MOVE` while the direction is kept, `REVERSE` when the car turns around.
    fn travel(previous: Dirn, dirn: Dirn) -> Self {
        let behaviour = if previous != Dirn::Stop && previous != dirn {
            CarBehaviour::Reverse
        } else {
            CarBehaviour::Move
        };
        Self { dirn, behaviour }
    }
}

/// What the decision logic may see of a car.
#[derive(Debug, Clone, Copy)]
pub struct CarSight<'a> {
    /// Current floor
    pub floor: Floor,
    /// Direction of the last move
    pub dirn: Dirn,
    /// Floors the car serves
    pub range: FloorRange,
    /// Transfer floor, once the car has been split
    pub transfer: Option<Floor>,
    #[allow(missing_docs)]
    pub capacity: usize,
    #[allow(missing_docs)]
    pub preempt_factor: u32,
    /// Passengers onboard, in boarding order
    pub onboard: &'a [PersonRequest],
    /// Highest waiting priority per floor, from the car's backlog
    pub waiting: &'a BTreeMap<Floor, u32>,
}

/// Where this car will let `passenger` off.
///
/// A split car takes a passenger bound beyond its range to the transfer floor.
pub fn drop_off_floor(sight: &CarSight, passenger: &PersonRequest) -> Floor {
    drop_off(sight.range, sight.transfer, passenger.to)
}

/// [`drop_off_floor`] without a full sight.
pub fn drop_off(range: FloorRange, transfer: Option<Floor>, destination: Floor) -> Floor {
    if range.contains(destination) {
        return destination;
    }
    transfer.unwrap_or_else(|| range.clamp(destination))
}

/// True if anyone onboard gets off at the current floor.
pub fn should_alight(sight: &CarSight) -> bool {
    sight.onboard.iter().any(|p| drop_off_floor(sight, p) == sight.floor)
}

/// Index and priority of the onboard passenger a preemption would bump.
///
/// The first boarded wins among equal priorities.
pub fn lowest_onboard(onboard: &[PersonRequest]) -> Option<(usize, u32)> {
    onboard
        .iter()
        .enumerate()
        .map(|(i, p)| (i, p.priority))
        .min_by_key(|(_, priority)| *priority)
}

/// True if a passenger with `waiting_priority` may bump someone from a full car.
pub fn preempts(sight: &CarSight, waiting_priority: u32) -> bool {
    if sight.onboard.len() < sight.capacity {
        return false;
    }
    match lowest_onboard(sight.onboard) {
        Some((_, lowest)) => u64::from(waiting_priority) > u64::from(sight.preempt_factor) * u64::from(lowest),
        None => false,
    }
}

/// True if the doors should open for someone waiting at the current floor.
pub fn should_board(sight: &CarSight) -> bool {
    match sight.waiting.get(&sight.floor) {
        Some(best) => sight.onboard.len() < sight.capacity || preempts(sight, *best),
        None => false,
    }
}

/// Direction with the larger pull from the passengers onboard.
fn onboard_pull(sight: &CarSight) -> Dirn {
    let (mut up, mut down) = (0.0_f64, 0.0_f64);
    for passenger in sight.onboard {
        let target = drop_off_floor(sight, passenger);
        let distance = sight.floor.distance(target);
        if distance == 0 {
            continue;
        }
        let pull = f64::from(passenger.priority) / f64::from(distance);
        if target > sight.floor {
            up += pull;
        } else {
            down += pull;
        }
    }
    let towards_up = sight.onboard.iter().any(|p| drop_off_floor(sight, p) > sight.floor);
    let towards_down = sight.onboard.iter().any(|p| drop_off_floor(sight, p) < sight.floor);
    match (towards_up, towards_down) {
        (true, false) => Dirn::Up,
        (false, true) => Dirn::Down,
        (false, false) => Dirn::Stop,
        (true, true) if up > down => Dirn::Up,
        (true, true) if down > up => Dirn::Down,
        (true, true) => match sight.dirn {
            Dirn::Down => Dirn::Down,
            _ => Dirn::Up,
        },
    }
}

/// Nearest floor in range where someone is waiting. Ties go to the current direction.
pub fn nearest_waiting(sight: &CarSight) -> Option<Floor> {
    let preferred = match sight.dirn {
        Dirn::Down => Dirn::Down,
        _ => Dirn::Up,
    };
    sight
        .waiting
        .keys()
        .copied()
        .filter(|floor| sight.range.contains(*floor))
        .min_by_key(|floor| {
            let off_course = Dirn::towards(sight.floor, *floor) != preferred;
            (sight.floor.distance(*floor), off_course)
        })
}

/// Main decision logic: what the car does next.
pub fn choose_direction(sight: &CarSight) -> DirnBehaviourPair {
    if should_alight(sight) || should_board(sight) {
        return DirnBehaviourPair::open(sight.dirn);
    }

    if !sight.onboard.is_empty() {
        return match onboard_pull(sight) {
            Dirn::Stop => DirnBehaviourPair::wait(),
            dirn => DirnBehaviourPair::travel(sight.dirn, dirn),
        };
    }

    match nearest_waiting(sight) {
        Some(floor) if floor != sight.floor => {
            DirnBehaviourPair::travel(sight.dirn, Dirn::towards(sight.floor, floor))
        }
        _ => DirnBehaviourPair::wait(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn fl(i: i32) -> Floor {
        Floor::new(i).unwrap()
    }

    fn person(id: u32, priority: u32, to: i32) -> PersonRequest {
        PersonRequest { id, priority, from: fl(1), to: fl(to) }
    }

    fn sight<'a>(floor: i32, onboard: &'a [PersonRequest], waiting: &'a BTreeMap<Floor, u32>) -> CarSight<'a> {
        CarSight {
            floor: fl(floor),
            dirn: Dirn::Stop,
            range: FloorRange::new(fl(-4), fl(7)).unwrap(),
            transfer: None,
            capacity: 2,
            preempt_factor: 5,
            onboard,
            waiting,
        }
    }

    #[test]
    fn opens_for_destination_and_waiting() {
        let none = BTreeMap::new();
        let onboard = [person(1, 3, 4)];
        assert_eq!(choose_direction(&sight(4, &onboard, &none)).behaviour, CarBehaviour::DoorOpen);

        let waiting: BTreeMap<Floor, u32> = [(fl(2), 1)].into_iter().collect();
        assert_eq!(choose_direction(&sight(2, &[], &waiting)).behaviour, CarBehaviour::DoorOpen);
    }

    #[test]
    fn full_car_only_opens_for_preemption() {
        let onboard = [person(1, 4, 6), person(2, 2, 7)];
        let weak: BTreeMap<Floor, u32> = [(fl(3), 10)].into_iter().collect();
        let decision = choose_direction(&sight(3, &onboard, &weak));
        assert_eq!(decision, DirnBehaviourPair { dirn: Dirn::Up, behaviour: CarBehaviour::Move });

        let strong: BTreeMap<Floor, u32> = [(fl(3), 11)].into_iter().collect();
        assert_eq!(choose_direction(&sight(3, &onboard, &strong)).behaviour, CarBehaviour::DoorOpen);
        assert_eq!(lowest_onboard(&onboard), Some((1, 2)));
    }

    #[test]
    fn onboard_pull_weighs_priority_by_distance() {
        let none = BTreeMap::new();
        // 10/1 below beats 12/4 above
        let onboard = [person(1, 12, 5), person(2, 10, -1)];
        let decision = choose_direction(&sight(1, &onboard, &none));
        assert_eq!(decision.dirn, Dirn::Down);

        let mut up = sight(1, &onboard, &none);
        up.dirn = Dirn::Up;
        assert_eq!(choose_direction(&up).behaviour, CarBehaviour::Reverse);
    }

    #[test]
    fn equal_pull_keeps_direction() {
        let none = BTreeMap::new();
        let onboard = [person(1, 4, 3), person(2, 4, -1)];
        let mut s = sight(1, &onboard, &none);
        s.dirn = Dirn::Down;
        assert_eq!(choose_direction(&s).dirn, Dirn::Down);
        s.dirn = Dirn::Up;
        assert_eq!(choose_direction(&s).dirn, Dirn::Up);
    }

    #[test]
    fn heads_for_nearest_waiting_floor() {
        let waiting: BTreeMap<Floor, u32> = [(fl(-2), 1), (fl(6), 50)].into_iter().collect();
        let decision = choose_direction(&sight(1, &[], &waiting));
        assert_eq!(decision, DirnBehaviourPair { dirn: Dirn::Down, behaviour: CarBehaviour::Move });

        let tied: BTreeMap<Floor, u32> = [(fl(1), 1), (fl(5), 1)].into_iter().collect();
        let mut s = sight(3, &[], &tied);
        s.dirn = Dirn::Down;
        assert_eq!(nearest_waiting(&s), Some(fl(1)));
        s.dirn = Dirn::Up;
        assert_eq!(nearest_waiting(&s), Some(fl(5)));
    }

    #[test]
    fn split_car_drops_off_at_transfer() {
        let none = BTreeMap::new();
        let onboard = [person(1, 3, 6)];
        let mut s = sight(3, &onboard, &none);
        s.range = FloorRange::new(fl(-4), fl(3)).unwrap();
        s.transfer = Some(fl(3));
        assert_eq!(drop_off_floor(&s, &onboard[0]), fl(3));
        assert!(should_alight(&s));

        s.floor = fl(1);
        assert_eq!(choose_direction(&s).dirn, Dirn::Up);
    }

    #[test]
    fn idle_car_waits() {
        let none = BTreeMap::new();
        assert_eq!(choose_direction(&sight(1, &[], &none)), DirnBehaviourPair::wait());
    }
}
