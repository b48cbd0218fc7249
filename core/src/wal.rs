use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::WalError;
use crate::document::Document;
use crate::sync_to_disk;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Record {
    CreateCollection {
        name: String,
        dimension: i32,
        distance: String,
    },
    Upsert {
        collection: String,
        document: Document,
    },
    Delete {
        collection: String,
        id: Uuid,
    },
}

/// Append-only log backing one data file.
pub struct WalManager {
    file: BufWriter<File>,
}

impl WalManager {
    pub fn open(path: &Path) -> Result<Self, WalError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(WalManager {
            file: BufWriter::new(file),
        })
    }

    pub fn write(&mut self, record: &Record) -> Result<(), WalError> {
        let record_bytes = bincode::serialize(record)?;

        self.file.write_all(&record_bytes)?;
        self.file.flush()?;

        if sync_to_disk() {
            self.file.get_ref().sync_data()?;
        }
        Ok(())
    }

    /// Reads records until the first one that does not decode; a torn tail is dropped.
    pub fn read(path: &Path) -> Result<Vec<Record>, WalError> {
        let file = File::open(path).map_err(|e| WalError::ReadError(e.to_string()))?;
        let mut reader = BufReader::new(file);
        let mut records = Vec::new();

        while let Ok(record) = bincode::deserialize_from(&mut reader) {
            records.push(record);
        }

        Ok(records)
    }
}
