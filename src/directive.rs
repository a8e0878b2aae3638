//! # Service directives
//!
//! The three record kinds the fleet consumes from its input source:
//! - [`Directive::Pickup`]: a passenger wants to travel between two floors.
//! - [`Directive::Reposition`]: force one car to a floor at a given speed.
//! - [`Directive::ShaftSplit`]: permanently split two cars' reach at a transfer floor.
//!
//! Also holds [`Waiting`], a pickup together with the floor the passenger is
//! currently waiting at. Waiting pickups order by priority (highest first) and then
//! by arrival order, which is the boarding and dispatch order everywhere in the crate.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::floor::Floor;

/// Identifier of a car. Cars are numbered from 1.
pub type CarId = u8;

/// Identifier of a passenger.
pub type PersonId = u32;

/// A passenger's request to travel from `from` to `to`.
///
/// Immutable once created. Higher `priority` is more urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersonRequest {
    /// Unique passenger id
    pub id: PersonId,
    /// Urgency, higher is more urgent
    pub priority: u32,
    /// Floor the passenger first asked to be picked up at
    pub from: Floor,
    /// Destination floor
    pub to: Floor,
}

/// Send one car directly to `floor`, discharging everyone there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reposition {
    /// Car to move
    pub car: CarId,
    /// Target floor
    pub floor: Floor,
    /// Travel time per floor in seconds while repositioning
    pub speed: f64,
}

/// Split two adjacent shafts at a shared transfer floor.
///
/// `car_a` becomes the upper car and keeps `[transfer, max]`,
/// `car_b` becomes the lower car and keeps `[min, transfer]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaftSplit {
    /// Upper car after the split
    pub car_a: CarId,
    /// Lower car after the split
    pub car_b: CarId,
    /// The only floor both cars keep
    pub transfer: Floor,
}

/// A directive consumed by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Directive {
    #[allow(missing_docs)]
    Pickup(PersonRequest),
    #[allow(missing_docs)]
    Reposition(Reposition),
    #[allow(missing_docs)]
    ShaftSplit(ShaftSplit),
}

/// A pickup together with the floor the passenger is currently waiting at.
///
/// `floor` starts out as the request's origin and is reset to the eviction floor
/// whenever the passenger is put off a car without being delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Waiting {
    /// The passenger
    pub request: PersonRequest,
    /// Where the passenger stands right now
    pub floor: Floor,
    /// Arrival sequence number, used as the tie-break between equal priorities
    pub seq: u64,
}

impl Waiting {
    /// Priority of the underlying request.
    pub fn priority(&self) -> u32 {
        self.request.priority
    }
}

impl Ord for Waiting {
    /// Greater means "serve first": higher priority, then earlier arrival.
    fn cmp(&self, other: &Self) -> Ordering {
        self.request
            .priority
            .cmp(&other.request.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Waiting {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    fn waiting(id: PersonId, priority: u32, seq: u64) -> Waiting {
        let f1 = Floor::new(1).unwrap();
        let f2 = Floor::new(2).unwrap();
        Waiting { request: PersonRequest { id, priority, from: f1, to: f2 }, floor: f1, seq }
    }

    #[test]
    fn heap_pops_priority_then_arrival() {
        let mut heap = BinaryHeap::new();
        heap.push(waiting(1, 5, 0));
        heap.push(waiting(2, 20, 1));
        heap.push(waiting(3, 5, 2));
        heap.push(waiting(4, 20, 3));
        let order: Vec<PersonId> = std::iter::from_fn(|| heap.pop()).map(|w| w.request.id).collect();
        assert_eq!(order, vec![2, 4, 1, 3]);
    }

    #[test]
    fn directives_parse_from_json_lines() {
        let pickup: Directive =
            serde_json::from_str(r#"{"kind":"pickup","id":7,"priority":12,"from":"B2","to":"F5"}"#).unwrap();
        assert_eq!(
            pickup,
            Directive::Pickup(PersonRequest {
                id: 7,
                priority: 12,
                from: Floor::new(-2).unwrap(),
                to: Floor::new(5).unwrap(),
            })
        );

        let split: Directive =
            serde_json::from_str(r#"{"kind":"shaft_split","car_a":1,"car_b":2,"transfer":"F3"}"#).unwrap();
        assert!(matches!(split, Directive::ShaftSplit(ShaftSplit { car_a: 1, car_b: 2, .. })));
    }
}
