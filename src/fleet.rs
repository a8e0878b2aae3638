//! # Fleet
//!
//! Wires the dispatcher and the cars together and runs them as tokio tasks.
//!
//! ```rust,no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use elevatorfleet::config::FleetConfig;
//! use elevatorfleet::directive::{Directive, PersonRequest};
//! use elevatorfleet::fleet::Fleet;
//!
//! let (tx, rx) = crossbeam_channel::unbounded();
//! let fleet = Fleet::start(FleetConfig::default(), tx)?;
//! fleet
//!     .submit(Directive::Pickup(PersonRequest {
//!         id: 1,
//!         priority: 1,
//!         from: "F1".parse()?,
//!         to: "F5".parse()?,
//!     }))
//!     .await?;
//! fleet.end_input().await;
//! let report = fleet.join().await?;
//! assert_eq!(report.received, report.arrived);
//! for event in rx.try_iter() {
//!     println!("{}", event);
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crossbeam_channel::Sender;
use tokio::task::JoinHandle;

use crate::car_queue::CarQueue;
use crate::config::FleetConfig;
use crate::directive::Directive;
use crate::elevator_logic::Car;
use crate::error::{ConfigError, DirectiveError, FleetError};
use crate::event::{Event, EventSink};
use crate::fleet_view::{CarSnapshot, CarStatus};
use crate::manager::{CarHandle, Counters, Dispatcher};
use crate::print;

/// Outcome of a finished run.
#[derive(Debug, Clone)]
pub struct FleetReport {
    /// Pickups accepted
    pub received: u64,
    /// Passengers delivered
    pub arrived: u64,
    /// Final state of every car, by id
    pub cars: Vec<CarSnapshot>,
}

/// A running fleet.
pub struct Fleet {
    dispatcher: Dispatcher,
    dispatcher_task: JoinHandle<Counters>,
    car_tasks: Vec<(String, JoinHandle<CarSnapshot>)>,
}

impl Fleet {
    /// Validates `config`, builds every car and the dispatcher, and spawns their tasks.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: FleetConfig, events: Sender<Event>) -> Result<Fleet, ConfigError> {
        config.validate()?;
        let building = config.building()?;
        let sink = EventSink::new(events);

        let handles: Vec<CarHandle> = config
            .car_ids()
            .map(|id| CarHandle {
                id,
                status: Arc::new(CarStatus::new(id, config.home_floor, building)),
                queue: Arc::new(CarQueue::new()),
            })
            .collect();
        let dispatcher = Dispatcher::new(handles.clone(), building, config.backlog_limit, sink.clone());

        let car_tasks = handles
            .into_iter()
            .map(|handle| {
                let car = Car::new(config.clone(), handle.status, handle.queue, dispatcher.clone(), sink.clone());
                (format!("car {}", handle.id), tokio::spawn(car.run()))
            })
            .collect();
        let dispatcher_task = tokio::spawn(dispatcher.clone().run());

        print::info(format!(
            "Fleet of {} cars started in {}, capacity {}",
            config.num_cars, building, config.capacity
        ));
        Ok(Fleet { dispatcher, dispatcher_task, car_tasks })
    }

    /// Forwards a directive to the dispatcher.
    pub async fn submit(&self, directive: Directive) -> Result<(), DirectiveError> {
        self.dispatcher.submit(directive).await
    }

    /// Signals that no more directives will come.
    pub async fn end_input(&self) {
        self.dispatcher.end_input().await;
    }

    /// Handle to the dispatcher, for feeding directives from another task.
    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    /// Waits until the dispatcher and every car have stopped.
    ///
    /// Only returns once [`Fleet::end_input`] has been called and every passenger has arrived.
    pub async fn join(self) -> Result<FleetReport, FleetError> {
        let Fleet { dispatcher, dispatcher_task, car_tasks } = self;
        drop(dispatcher);

        let counters = dispatcher_task.await.map_err(|source| FleetError::TaskFailed {
            name: "dispatcher".to_string(),
            source,
        })?;
        let mut cars = Vec::with_capacity(car_tasks.len());
        for (name, task) in car_tasks {
            let snapshot = task.await.map_err(|source| FleetError::TaskFailed { name, source })?;
            cars.push(snapshot);
        }

        print::fleet_table(&cars);
        Ok(FleetReport { received: counters.received, arrived: counters.arrived, cars })
    }
}
