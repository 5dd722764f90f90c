//! Radar broadcast.
//!
//! Runs the radar engine on a driver thread, publishes each finished
//! rotation to the subscribers of the radar's path, and keeps all export
//! work off the tick thread.

pub mod broadcaster;
pub mod driver;
pub mod transport;

pub use driver::{spawn_driver, DriverCommand, DriverConfig, DriverHandle, DriverSummary};
pub use transport::{SessionHub, Subscription, Transport, TransportError};
