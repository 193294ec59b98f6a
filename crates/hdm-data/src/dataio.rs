//! Write-policy transforms wrapped around a buffer's payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::buffer::Backing;
use crate::error::{DataError, DataResult};

/// Compression filter requested for the persisted dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    Gzip,
    Lzf,
    Szip,
}

/// How the persistence layer should lay the payload out on disk.
///
/// The buffer never interprets these; they travel with the payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataIoOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<Compression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_level: Option<u8>,
    /// Chunk shape; `None` leaves chunking to the writer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_value: Option<Value>,
    #[serde(default)]
    pub shuffle: bool,
}

/// A transform that takes ownership of a raw payload and stands in for it.
///
/// Reads delegate to the wrapped payload. A `DataIo` is not growable itself:
/// once installed, appends to the owning buffer fail.
#[derive(Debug, Default)]
pub struct DataIo {
    options: DataIoOptions,
    data: Option<Backing>,
}

impl DataIo {
    pub fn new(options: DataIoOptions) -> Self {
        Self {
            options,
            data: None,
        }
    }

    pub fn options(&self) -> &DataIoOptions {
        &self.options
    }

    /// The wrapped payload, if one has been handed over.
    pub fn data(&self) -> Option<&Backing> {
        self.data.as_ref()
    }

    /// Give the payload back, leaving the transform empty.
    pub fn take_data(&mut self) -> Option<Backing> {
        self.data.take()
    }

    /// Take ownership of `data`, replacing any previous payload.
    pub(crate) fn wrap(&mut self, data: Backing) {
        self.data = Some(data);
    }

    pub fn len(&self) -> usize {
        self.data.as_ref().map_or(0, Backing::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn read(&self, index: usize) -> DataResult<Value> {
        match &self.data {
            Some(data) => data.read(index),
            None => Err(DataError::IndexOutOfBounds { index, len: 0 }),
        }
    }

    pub(crate) fn shape(&self) -> Option<Vec<usize>> {
        self.data.as_ref().and_then(Backing::shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_transform_has_no_payload() {
        let io = DataIo::new(DataIoOptions::default());
        assert!(io.data().is_none());
        assert!(io.is_empty());
        assert!(io.read(0).is_err());
        assert_eq!(io.shape(), None);
    }

    #[test]
    fn wrapped_payload_is_readable_and_returnable() {
        let mut io = DataIo::new(DataIoOptions {
            compression: Some(Compression::Gzip),
            compression_level: Some(4),
            ..Default::default()
        });
        io.wrap(Backing::Growable(vec![json!(1), json!(2)]));
        assert_eq!(io.len(), 2);
        assert_eq!(io.read(1).unwrap(), json!(2));
        assert_eq!(io.shape(), Some(vec![2]));

        let data = io.take_data().unwrap();
        assert_eq!(data.len(), 2);
        assert!(io.is_empty());
    }

    #[test]
    fn options_serde() {
        let json = json!({"compression": "gzip", "chunks": [16, 4], "shuffle": true});
        let opts: DataIoOptions = serde_json::from_value(json).unwrap();
        assert_eq!(opts.compression, Some(Compression::Gzip));
        assert_eq!(opts.chunks, Some(vec![16, 4]));
        assert!(opts.shuffle);
        assert_eq!(opts.fill_value, None);
    }
}
