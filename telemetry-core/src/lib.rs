//! Sensor telemetry ingestion core.
//! Host-driven: no I/O; the host passes datagram text and endpoints, and gets back
//! readings, warnings and record updates.

pub mod ack;
pub mod codec;
pub mod endpoint;
pub mod reading;
pub mod table;
pub mod validate;

pub use ack::{should_ack, ACK_PAYLOAD};
pub use codec::{decode_payload, parse_reading, ParseError};
pub use endpoint::ClientEndpoint;
pub use reading::{Field, Reading};
pub use table::{ClientRecord, ClientTable, RecordUpdate};
pub use validate::{check_change, validate, Bounds, Limits, Warning};
