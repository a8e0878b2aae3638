#![warn(missing_docs)]
//! # This projects library
//!
//! This library simulates a fleet of elevator cars that pick up and deliver passengers,
//! board by priority, can be sent to a fixed floor, and can have their shafts split at a
//! shared transfer floor.
//!
//! ## Overview
//! - **Config**: Default parameters and the runtime [`config::FleetConfig`].
//! - **Print**: Colour coded terminal logging.
//! - **Init**: Command line, config file and input record parsing.
//! - **Floor**: Floor indices without a zero, and floor ranges.
//! - **Directive**: The three kinds of input the fleet consumes.
//! - **Event**: The state transitions the fleet reports.
//! - **Fleet View**: Status of each car that others may read.
//! - **Car Queue**: Work assigned to one car.
//! - **Manager**: The dispatcher and its task allocation.
//! - **Elevator Logic**: The control loop of each car.
//! - **Fleet**: Starts and joins everything.

/// Global variables
pub mod config;

/// Initialize functions
pub mod init;

/// Print functions with color coding
pub mod print;

pub mod floor;

pub mod directive;

pub mod event;

pub mod error;

pub mod fleet_view;

pub mod car_queue;

/// Dispatcher and task allocation.
pub mod manager;

/// Car control logic.
pub mod elevator_logic;

pub mod fleet;
