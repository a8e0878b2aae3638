//! # Task allocation
//!
//! Picks which car gets a waiting pickup. Every car is turned into a [`Candidate`]
//! describing what the dispatcher can see of it, and each candidate is given a
//! [`Cost`]. The cheapest eligible candidate wins. Equal cost goes to the lowest car id.

use std::collections::BTreeSet;

use crate::directive::{CarId, Waiting};
use crate::fleet_view::SplitRole;
use crate::floor::{Floor, FloorRange};

/// The dispatcher's view of one car at allocation time.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Car id
    pub id: CarId,
    /// Last floor reported by the car
    pub floor: Floor,
    /// Floors the car currently serves
    pub range: FloorRange,
    /// Transfer floor and role, for a car that has been split
    pub split: Option<(Floor, SplitRole)>,
    /// Car is repositioning or about to reconfigure
    pub directive_active: bool,
    /// Assigned but not boarded pickups
    pub backlog: usize,
    /// Floors the car already plans to stop at
    pub planned_stops: BTreeSet<Floor>,
}

/// Ranking key. Lower is better, compared field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cost {
    /// The passenger would have to change cars at the transfer floor
    pub needs_transfer: bool,
    /// Stops the pickup adds to what the car already plans
    pub extra_stops: u8,
    /// Hops from the car to the waiting floor
    pub distance: u32,
}

/// How a candidate could carry the passenger, if at all.
fn route(candidate: &Candidate, waiting: &Waiting) -> Option<bool> {
    if !candidate.range.contains(waiting.floor) {
        return None;
    }
    if candidate.range.contains(waiting.request.to) {
        return Some(false);
    }
    // Bare en delt heis kan ta passasjeren videre til overgangsetasjen
    match candidate.split {
        Some((transfer, _)) if waiting.floor != transfer => Some(true),
        _ => None,
    }
}

/// Computes the cost of handing `waiting` to `candidate`.
///
/// ## Returns
/// - `None` if the car may not take the pickup at all: it is busy with a directive,
///   its backlog is full, or it cannot reach the waiting floor.
pub fn compute_cost(candidate: &Candidate, waiting: &Waiting, backlog_limit: usize) -> Option<Cost> {
    if candidate.directive_active || candidate.backlog >= backlog_limit {
        return None;
    }
    let needs_transfer = route(candidate, waiting)?;
    let drop_off = match (needs_transfer, candidate.split) {
        (true, Some((transfer, _))) => transfer,
        _ => waiting.request.to,
    };
    let extra_stops = [waiting.floor, drop_off]
        .iter()
        .filter(|floor| !candidate.planned_stops.contains(floor))
        .count() as u8;

    Some(Cost {
        needs_transfer,
        extra_stops,
        distance: candidate.floor.distance(waiting.floor),
    })
}

/// Chooses the car for `waiting`, or `None` if no car is eligible right now.
pub fn choose_car(waiting: &Waiting, candidates: &[Candidate], backlog_limit: usize) -> Option<CarId> {
    candidates
        .iter()
        .filter_map(|c| compute_cost(c, waiting, backlog_limit).map(|cost| (cost, c.id)))
        .min()
        .map(|(_, id)| id)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::PersonRequest;

    fn fl(i: i32) -> Floor {
        Floor::new(i).unwrap()
    }

    fn building() -> FloorRange {
        FloorRange::new(fl(-4), fl(7)).unwrap()
    }

    fn candidate(id: CarId, floor: i32) -> Candidate {
        Candidate {
            id,
            floor: fl(floor),
            range: building(),
            split: None,
            directive_active: false,
            backlog: 0,
            planned_stops: BTreeSet::new(),
        }
    }

    fn pickup(from: i32, to: i32) -> Waiting {
        Waiting {
            request: PersonRequest { id: 1, priority: 10, from: fl(from), to: fl(to) },
            floor: fl(from),
            seq: 0,
        }
    }

    #[test]
    fn nearest_idle_car_wins() {
        let cars = vec![candidate(1, 1), candidate(2, 5), candidate(3, -2)];
        assert_eq!(choose_car(&pickup(6, 2), &cars, 10), Some(2));
        assert_eq!(choose_car(&pickup(-3, 2), &cars, 10), Some(3));
    }

    #[test]
    fn ties_go_to_lowest_id() {
        let cars = vec![candidate(2, 1), candidate(1, 1)];
        assert_eq!(choose_car(&pickup(3, 5), &cars, 10), Some(1));
    }

    #[test]
    fn planned_stops_beat_distance() {
        let mut far = candidate(1, -4);
        far.planned_stops = [fl(3), fl(5)].into_iter().collect();
        let near = candidate(2, 3);
        assert_eq!(choose_car(&pickup(3, 5), &[far, near], 10), Some(1));
    }

    #[test]
    fn busy_and_full_cars_are_skipped() {
        let mut repositioning = candidate(1, 3);
        repositioning.directive_active = true;
        let mut full = candidate(2, 3);
        full.backlog = 10;
        let cars = vec![repositioning, full];
        assert_eq!(choose_car(&pickup(3, 5), &cars, 10), None);
    }

    #[test]
    fn split_cars_route_through_transfer() {
        let transfer = fl(3);
        let mut upper = candidate(1, 5);
        upper.range = SplitRole::Upper.range(transfer, building());
        upper.split = Some((transfer, SplitRole::Upper));
        let mut lower = candidate(2, -1);
        lower.range = SplitRole::Lower.range(transfer, building());
        lower.split = Some((transfer, SplitRole::Lower));

        // Only the lower car reaches B2, it carries the passenger to the transfer floor
        let cost = compute_cost(&lower, &pickup(-2, 6), 10).unwrap();
        assert!(cost.needs_transfer);
        assert_eq!(compute_cost(&upper, &pickup(-2, 6), 10), None);
        assert_eq!(choose_car(&pickup(-2, 6), &[upper.clone(), lower.clone()], 10), Some(2));

        // From the transfer floor on, the upper car serves it directly
        assert_eq!(choose_car(&pickup(3, 6), &[upper, lower.clone()], 10), Some(1));
        assert_eq!(compute_cost(&lower, &pickup(3, 6), 10), None);
    }

    #[test]
    fn strict_route_beats_transfer() {
        let transfer = fl(3);
        let mut lower = candidate(1, 1);
        lower.range = SplitRole::Lower.range(transfer, building());
        lower.split = Some((transfer, SplitRole::Lower));
        let whole = candidate(2, -4);
        assert_eq!(choose_car(&pickup(1, 6), &[lower, whole], 10), Some(2));
    }
}
