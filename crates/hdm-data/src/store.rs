//! Growable external storage behind a data buffer.

use std::fmt;

use serde_json::Value;

use crate::error::{DataError, DataResult};
use crate::shape::shape_of_rows;

/// A resizable, index-addressable store living outside the buffer, such as
/// a chunked dataset in an open file.
///
/// All implementations must satisfy these invariants:
/// - `len()` is the current extent of the first axis.
/// - `resize()` changes only the first axis; new slots hold the fill value.
/// - `write()` never changes the length; it fails on out-of-range slots.
/// - All I/O errors are propagated, never silently ignored.
pub trait ExternalStore: fmt::Debug + Send {
    /// Name of the store type, used in error messages.
    fn type_name(&self) -> &str;

    /// Current extent of the first axis.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Full shape, first axis included.
    fn shape(&self) -> Vec<usize>;

    /// Maximum extent of the first axis, `None` if unlimited.
    fn max_len(&self) -> Option<usize> {
        None
    }

    /// Set the extent of the first axis.
    fn resize(&mut self, len: usize) -> DataResult<()>;

    /// Overwrite consecutive slots starting at `start`.
    fn write(&mut self, start: usize, values: &[Value]) -> DataResult<()>;

    /// Read one slot.
    fn read(&self, index: usize) -> DataResult<Value>;
}

/// `Vec`-backed [`ExternalStore`] for tests and embedding.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InMemoryStore {
    rows: Vec<Value>,
    max_len: Option<usize>,
    fill: Value,
}

impl InMemoryStore {
    /// Create an unlimited store holding `rows`.
    pub fn new(rows: Vec<Value>) -> Self {
        Self {
            rows,
            max_len: None,
            fill: Value::Null,
        }
    }

    /// Cap the first axis at `max_len` slots.
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = Some(max_len);
        self
    }

    /// Value written into slots created by `resize`.
    pub fn with_fill(mut self, fill: Value) -> Self {
        self.fill = fill;
        self
    }

    pub fn rows(&self) -> &[Value] {
        &self.rows
    }
}

impl ExternalStore for InMemoryStore {
    fn type_name(&self) -> &str {
        "InMemoryStore"
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn shape(&self) -> Vec<usize> {
        shape_of_rows(&self.rows)
    }

    fn max_len(&self) -> Option<usize> {
        self.max_len
    }

    fn resize(&mut self, len: usize) -> DataResult<()> {
        if let Some(max) = self.max_len {
            if len > max {
                return Err(DataError::ResizeBeyondMax { requested: len, max });
            }
        }
        self.rows.resize(len, self.fill.clone());
        Ok(())
    }

    fn write(&mut self, start: usize, values: &[Value]) -> DataResult<()> {
        let end = start + values.len();
        if end > self.rows.len() {
            return Err(DataError::IndexOutOfBounds {
                index: end - 1,
                len: self.rows.len(),
            });
        }
        self.rows[start..end].clone_from_slice(values);
        Ok(())
    }

    fn read(&self, index: usize) -> DataResult<Value> {
        self.rows
            .get(index)
            .cloned()
            .ok_or(DataError::IndexOutOfBounds {
                index,
                len: self.rows.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resize_fills_new_slots() {
        let mut store = InMemoryStore::new(vec![json!(1)]).with_fill(json!(0));
        store.resize(3).unwrap();
        assert_eq!(store.rows(), &[json!(1), json!(0), json!(0)]);
        store.resize(1).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn resize_respects_max_len() {
        let mut store = InMemoryStore::new(vec![]).with_max_len(2);
        store.resize(2).unwrap();
        assert_eq!(
            store.resize(3).unwrap_err(),
            DataError::ResizeBeyondMax { requested: 3, max: 2 }
        );
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn write_does_not_grow() {
        let mut store = InMemoryStore::new(vec![json!(1), json!(2)]);
        store.write(1, &[json!(9)]).unwrap();
        assert_eq!(store.read(1).unwrap(), json!(9));
        assert!(store.write(1, &[json!(7), json!(8)]).is_err());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn shape_includes_row_shape() {
        let store = InMemoryStore::new(vec![json!([1, 2, 3]), json!([4, 5, 6])]);
        assert_eq!(store.shape(), vec![2, 3]);
        assert_eq!(InMemoryStore::default().shape(), vec![0]);
    }

    #[test]
    fn read_out_of_range_fails() {
        let store = InMemoryStore::new(vec![json!(1)]);
        assert_eq!(
            store.read(5).unwrap_err(),
            DataError::IndexOutOfBounds { index: 5, len: 1 }
        );
    }
}
