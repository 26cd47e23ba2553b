//! `airtix` - An airline flight and ticket booking desk
//!
//! This library provides the flight registry, ticket ledger and reservation
//! code allocator behind the `airtix` console, together with the binary file
//! format they are persisted in between sessions.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod allocator;
pub mod booking;
pub mod cli;
pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod model;
pub mod registry;
pub mod storage;

pub use booking::{BookingConfirmation, BookingDesk, BookingDetails, Cancellation};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use model::{Flight, NewFlight, Ticket};
pub use storage::{LoadStatus, LoadedState, SaveReport, Storage};
