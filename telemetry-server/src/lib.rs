//! UDP ingestion endpoint for sensor telemetry.
//! The dispatcher owns the socket; each datagram runs through the handler in its own task.

pub mod ack;
pub mod config;
pub mod dispatcher;
pub mod handler;

pub use config::Config;
pub use dispatcher::{Dispatcher, StartupError};
pub use handler::{Datagram, Handler, Outcome};
