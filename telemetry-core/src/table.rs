//! Shared per-client table: last reading seen from each endpoint.
//!
//! One lock guards the whole map, so lookup-or-create and the update of both last
//! values happen as one step. Records are never evicted.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::endpoint::ClientEndpoint;
use crate::reading::Reading;

/// Last known values for one endpoint. Zero last values with `readings == 0`
/// mean "no prior reading", not a measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientRecord {
    pub endpoint: ClientEndpoint,
    pub last_temperature: f32,
    pub last_humidity: f32,
    /// Readings recorded for this endpoint.
    pub readings: u64,
}

impl ClientRecord {
    fn new(endpoint: ClientEndpoint) -> Self {
        Self {
            endpoint,
            last_temperature: 0.0,
            last_humidity: 0.0,
            readings: 0,
        }
    }
}

/// Result of recording one reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordUpdate {
    /// The record did not exist before this update.
    pub created: bool,
    /// `(temperature, humidity)` replaced by this update, if the record held a reading.
    pub previous: Option<(f32, f32)>,
}

/// Endpoint -> last reading. Share it as `Arc<ClientTable>`.
#[derive(Debug, Default)]
pub struct ClientTable {
    records: Mutex<HashMap<ClientEndpoint, ClientRecord>>,
}

impl ClientTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up or create the endpoint's record and overwrite both last values.
    /// Last writer wins; concurrent datagrams from one sender land in completion order.
    pub fn record(&self, endpoint: &ClientEndpoint, reading: &Reading) -> RecordUpdate {
        let mut records = self.records.lock();
        let mut created = false;
        let record = records.entry(endpoint.clone()).or_insert_with(|| {
            created = true;
            ClientRecord::new(endpoint.clone())
        });
        let previous =
            (record.readings > 0).then_some((record.last_temperature, record.last_humidity));
        record.last_temperature = reading.temperature;
        record.last_humidity = reading.humidity;
        record.readings += 1;
        RecordUpdate { created, previous }
    }

    pub fn get(&self, endpoint: &ClientEndpoint) -> Option<ClientRecord> {
        self.records.lock().get(endpoint).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Copy of every record, in no particular order.
    pub fn snapshot(&self) -> Vec<ClientRecord> {
        self.records.lock().values().cloned().collect()
    }
}
