//! Parsed sensor reading.

use std::fmt;

/// The three numeric fields of one datagram. Transient: only the temperature and
/// humidity outlive the datagram, as the sender's last values in the client table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub qos: f32,
    pub temperature: f32,
    pub humidity: f32,
}

/// Wire field names, in template order.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Field {
    Qos,
    Temperature,
    Humidity,
}

impl Field {
    /// Label as it appears on the wire, without the colon.
    pub fn label(self) -> &'static str {
        match self {
            Field::Qos => "QoS",
            Field::Temperature => "Temp",
            Field::Humidity => "Humidity",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "QoS: {:.1}, Temperature: {:.2}°C, Humidity: {:.2}%",
            self.qos, self.temperature, self.humidity
        )
    }
}
