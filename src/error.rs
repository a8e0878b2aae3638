//! Error types returned at the API boundary of the fleet.
//!
//! Inside the scheduling core most failure modes are prevented by invariant
//! (capacity checks, range checks). What remains are contract violations by the
//! caller, which are rejected here instead of being queued.

use thiserror::Error;

use crate::directive::CarId;
use crate::floor::Floor;

/// Invalid floor index or label.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FloorError {
    /// Index 0 was given
    #[error("floor index 0 does not exist")]
    Zero,

    /// Label is not `B<n>` or `F<n>`
    #[error("malformed floor label '{0}'")]
    Malformed(String),

    /// Lower bound above the upper bound
    #[error("empty floor range: {min} is above {max}")]
    #[allow(missing_docs)]
    EmptyRange { min: Floor, max: Floor },
}

/// A directive the dispatcher refused to accept.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DirectiveError {
    /// Directive names a car the fleet does not have
    #[error("no car with id {0}")]
    UnknownCar(CarId),

    /// Target floor outside the car's range, or a transfer floor at the building edge
    #[error("floor {floor} is outside the reach of car {car}")]
    #[allow(missing_docs)]
    OutOfRange { car: CarId, floor: Floor },

    /// Floor outside the building
    #[error("floor {0} is outside the building")]
    OutsideBuilding(Floor),

    /// Pickup with origin equal to destination
    #[error("person {0} travels from and to the same floor")]
    EmptyTrip(u32),

    /// Person id still in the system
    #[error("person {0} has already been submitted")]
    DuplicatePerson(u32),

    /// Reposition speed not a positive finite number
    #[error("reposition speed must be positive, got {0}")]
    InvalidSpeed(f64),

    /// Both halves of a split name the same car
    #[error("shaft split names car {0} twice")]
    SameCar(CarId),

    /// Car is busy with another Reposition or ShaftSplit
    #[error("car {0} already has a reposition or shaft split pending or running")]
    Conflict(CarId),

    /// Car was split before
    #[error("car {0} has already been split")]
    AlreadySplit(CarId),

    /// Submitted after end of input
    #[error("input has already ended")]
    InputEnded,
}

/// Invalid fleet configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// `num_cars` is 0
    #[error("fleet needs at least one car")]
    NoCars,

    /// `capacity` is 0
    #[error("car capacity must be at least 1")]
    ZeroCapacity,

    /// `backlog_limit` is 0
    #[error("backlog limit must be at least 1")]
    ZeroBacklog,

    /// `home_floor` outside the building
    #[error("home floor {home} is outside {min}..={max}")]
    #[allow(missing_docs)]
    HomeOutOfRange { home: Floor, min: Floor, max: Floor },

    /// Invalid building bounds
    #[error(transparent)]
    Floors(#[from] FloorError),

    /// `preempt_factor` is 0
    #[error("preemption factor must be positive")]
    InvalidPreemptFactor,
}

/// Failure while running the fleet to completion.
#[derive(Debug, Error)]
pub enum FleetError {
    /// A car or dispatcher task panicked or was cancelled
    #[error("task '{name}' failed: {source}")]
    TaskFailed {
        /// Name of the task
        name: String,
        /// Why the join failed
        #[source]
        source: tokio::task::JoinError,
    },

    /// Fleet refused to start
    #[error(transparent)]
    Config(#[from] ConfigError),
}
