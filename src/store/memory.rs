use super::HostStorage;
use crate::error::{Result, StashError};
use serde_json::Value;
use std::cell::Cell;

/// In-memory host storage for testing and development.
/// Does NOT persist data.
///
/// Supports failure injection: the next N reads or writes can be made to
/// fail with a given message, which is how retry and recovery paths are
/// exercised without a filesystem.
#[derive(Default)]
pub struct MemoryHost {
    record: Option<Value>,
    // Cell: reads go through &self but still consume injected failures
    failing_reads: Cell<u32>,
    failing_writes: u32,
    failure_message: String,
    writes: u32,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: Value) -> Self {
        Self {
            record: Some(record),
            ..Self::default()
        }
    }

    /// Fail the next `count` reads with `message`.
    pub fn fail_reads(&mut self, count: u32, message: &str) {
        self.failing_reads.set(count);
        self.failure_message = message.to_string();
    }

    /// Fail the next `count` writes with `message`.
    pub fn fail_writes(&mut self, count: u32, message: &str) {
        self.failing_writes = count;
        self.failure_message = message.to_string();
    }

    /// Write attempts seen, including failed ones.
    pub fn write_count(&self) -> u32 {
        self.writes
    }

    pub fn record(&self) -> Option<&Value> {
        self.record.as_ref()
    }
}

impl HostStorage for MemoryHost {
    fn read(&self) -> Result<Option<Value>> {
        let remaining = self.failing_reads.get();
        if remaining > 0 {
            self.failing_reads.set(remaining - 1);
            return Err(StashError::Host(self.failure_message.clone()));
        }
        Ok(self.record.clone())
    }

    fn write(&mut self, record: &Value) -> Result<()> {
        self.writes += 1;
        if self.failing_writes > 0 {
            self.failing_writes -= 1;
            return Err(StashError::Host(self.failure_message.clone()));
        }
        self.record = Some(record.clone());
        Ok(())
    }
}
