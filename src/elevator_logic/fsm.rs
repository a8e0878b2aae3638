//! Door cycle of a car.
//!
//! One call to [`door_cycle`] is one atomic unit of the control loop: the doors open,
//! passengers get off, waiting passengers get on by priority, and the doors close after
//! the door time. Nothing can interrupt it.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time::sleep;

use crate::directive::PersonRequest;
use crate::elevator_logic::{request, Car};
use crate::event::{Event, Exit};
use crate::fleet_view::CarBehaviour;

/// Opens the doors at the current floor and serves everyone who can be served there.
///
/// ## Steps
/// - `OPEN`
/// - Alight: passengers at their destination are delivered, passengers this car cannot
///   take further are evicted back to the dispatcher
/// - Board from the backlog at this floor, highest priority first, until capacity is reached
/// - Rearrange: while the best waiting passenger outranks the lowest onboard one by more
///   than the preemption factor, swap them
/// - Hold the door time, then `CLOSE`
pub async fn door_cycle(car: &mut Car) {
    car.status.set_behaviour(CarBehaviour::DoorOpen);
    car.events.emit(Event::Open { floor: car.floor, car: car.id });

    alight(car).await;
    board(car).await;
    rearrange(car).await;

    sleep(car.config.door_time).await;
    car.events.emit(Event::Close { floor: car.floor, car: car.id });
    car.publish_onboard().await;
    car.dispatcher.capacity_freed();
}

/// Opens the doors and lets everyone off, holding them open for `dwell`.
///
/// Passengers not at their destination are handed back to the dispatcher from this floor.
pub async fn discharge_all(car: &mut Car, dwell: Duration) {
    car.status.set_behaviour(CarBehaviour::DoorOpen);
    car.events.emit(Event::Open { floor: car.floor, car: car.id });

    for passenger in std::mem::take(&mut car.onboard) {
        let_off(car, passenger).await;
    }
    car.publish_onboard().await;

    sleep(dwell).await;
    car.events.emit(Event::Close { floor: car.floor, car: car.id });
}

async fn alight(car: &mut Car) {
    let (floor, range, transfer) = (car.floor, car.range, car.transfer());
    let (leaving, staying): (Vec<PersonRequest>, Vec<PersonRequest>) = std::mem::take(&mut car.onboard)
        .into_iter()
        .partition(|p| request::drop_off(range, transfer, p.to) == floor);
    car.onboard = staying;
    for passenger in leaving {
        let_off(car, passenger).await;
    }
    car.status.set_onboard(car.onboard.len());
}

async fn board(car: &mut Car) {
    while car.onboard.len() < car.config.capacity {
        match car.queue.poll_at(car.floor).await {
            Some(waiting) => take_in(car, waiting.request),
            None => break,
        }
    }
}

async fn rearrange(car: &mut Car) {
    let nobody = BTreeMap::new();
    while let Some(best) = car.queue.peek_at(car.floor).await {
        if !request::preempts(&car.sight(&nobody), best.priority()) {
            break;
        }
        let Some((index, _)) = request::lowest_onboard(&car.onboard) else {
            break;
        };
        let bumped = car.onboard.remove(index);
        let_off(car, bumped).await;
        if let Some(waiting) = car.queue.poll_at(car.floor).await {
            take_in(car, waiting.request);
        }
    }
}

fn take_in(car: &mut Car, passenger: PersonRequest) {
    car.events.emit(Event::In { person: passenger.id, floor: car.floor, car: car.id });
    car.onboard.push(passenger);
    car.status.set_onboard(car.onboard.len());
}

/// Lets one passenger off at the current floor. Anyone not at their destination goes
/// back to the dispatcher with this floor as their new origin.
async fn let_off(car: &Car, passenger: PersonRequest) {
    let exit = if passenger.to == car.floor { Exit::Delivered } else { Exit::Evicted };
    car.events.emit(Event::Out { person: passenger.id, floor: car.floor, car: car.id, exit });
    match exit {
        Exit::Delivered => car.dispatcher.confirm_delivered(passenger.id).await,
        Exit::Evicted => car.dispatcher.requeue(passenger, car.floor).await,
    }
}
