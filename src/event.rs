//! # Output events
//!
//! Every state transition a car goes through is reported as an [`Event`] on a
//! crossbeam channel. The writer on the other end owns timestamps and formatting
//! of the final output; the core only guarantees per-car ordering.

use std::fmt;

use crossbeam_channel::Sender;
use serde::Serialize;

use crate::directive::{CarId, PersonId};
use crate::floor::Floor;

/// Why a passenger left a car.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Exit {
    /// Arrived at the destination
    Delivered,
    /// Put off the car before reaching the destination, handed back to the dispatcher
    Evicted,
}

/// A single state transition.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    Arrive { floor: Floor, car: CarId },
    Open { floor: Floor, car: CarId },
    Close { floor: Floor, car: CarId },
    In { person: PersonId, floor: Floor, car: CarId },
    Out { person: PersonId, floor: Floor, car: CarId, exit: Exit },
    Receive { person: PersonId, car: CarId },
    ScheduleBegin { car: CarId },
    ScheduleEnd { car: CarId },
    SplitBegin { car_a: CarId, car_b: CarId },
    SplitEnd { car_a: CarId, car_b: CarId },
}

impl Event {
    /// The car this event belongs to. Split markers belong to `car_a`.
    pub fn car(&self) -> CarId {
        match *self {
            Event::Arrive { car, .. }
            | Event::Open { car, .. }
            | Event::Close { car, .. }
            | Event::In { car, .. }
            | Event::Out { car, .. }
            | Event::Receive { car, .. }
            | Event::ScheduleBegin { car }
            | Event::ScheduleEnd { car } => car,
            Event::SplitBegin { car_a, .. } | Event::SplitEnd { car_a, .. } => car_a,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Arrive { floor, car } => write!(f, "ARRIVE-{}-{}", floor, car),
            Event::Open { floor, car } => write!(f, "OPEN-{}-{}", floor, car),
            Event::Close { floor, car } => write!(f, "CLOSE-{}-{}", floor, car),
            Event::In { person, floor, car } => write!(f, "IN-{}-{}-{}", person, floor, car),
            Event::Out { person, floor, car, exit } => {
                let tag = match exit {
                    Exit::Delivered => "S",
                    Exit::Evicted => "F",
                };
                write!(f, "OUT-{}-{}-{}-{}", tag, person, floor, car)
            }
            Event::Receive { person, car } => write!(f, "RECEIVE-{}-{}", person, car),
            Event::ScheduleBegin { car } => write!(f, "SCHE-BEGIN-{}", car),
            Event::ScheduleEnd { car } => write!(f, "SCHE-END-{}", car),
            Event::SplitBegin { car_a, car_b } => write!(f, "UPDATE-BEGIN-{}-{}", car_a, car_b),
            Event::SplitEnd { car_a, car_b } => write!(f, "UPDATE-END-{}-{}", car_a, car_b),
        }
    }
}

/// Cloneable handle used by the dispatcher and every car to report events.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Sender<Event>,
}

impl EventSink {
    /// Wraps the sending half of an event channel.
    pub fn new(tx: Sender<Event>) -> Self {
        Self { tx }
    }

    /// Reports an event. A dropped receiver only means nobody is listening anymore.
    pub fn emit(&self, event: Event) {
        let _ = self.tx.send(event);
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_dash_format() {
        let f3 = Floor::new(3).unwrap();
        let b1 = Floor::new(-1).unwrap();
        assert_eq!(Event::Arrive { floor: f3, car: 2 }.to_string(), "ARRIVE-F3-2");
        assert_eq!(Event::Open { floor: b1, car: 1 }.to_string(), "OPEN-B1-1");
        assert_eq!(
            Event::Out { person: 9, floor: f3, car: 4, exit: Exit::Evicted }.to_string(),
            "OUT-F-9-F3-4"
        );
        assert_eq!(Event::SplitEnd { car_a: 1, car_b: 2 }.to_string(), "UPDATE-END-1-2");
    }
}
