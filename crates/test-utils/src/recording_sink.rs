use std::sync::{Arc, Mutex};

use cmdgate::sink::{AccessRecord, LogRecord, LogSink};

/// In-memory sink that keeps every record it is given.
#[derive(Clone, Default)]
pub struct RecordingSink {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn access_records(&self) -> Vec<AccessRecord> {
        self.records()
            .into_iter()
            .filter_map(|r| match r {
                LogRecord::Access(a) => Some(a),
                _ => None,
            })
            .collect()
    }

    pub fn step_count(&self) -> usize {
        self.records()
            .iter()
            .filter(|r| matches!(r, LogRecord::Step(_)))
            .count()
    }

    pub fn fault_count(&self) -> usize {
        self.records()
            .iter()
            .filter(|r| matches!(r, LogRecord::Fault(_)))
            .count()
    }
}

impl LogSink for RecordingSink {
    fn write(&self, record: LogRecord) {
        self.records.lock().unwrap().push(record);
    }
}
