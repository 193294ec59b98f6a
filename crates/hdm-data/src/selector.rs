//! Index expressions over a buffer's first axis.

use std::ops::Range;

use serde_json::Value;

use crate::error::{DataError, DataResult};

/// What to read from a buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector {
    /// A single element.
    Index(usize),
    /// A contiguous slice. Bounds are clamped to the buffer length.
    Range(Range<usize>),
    /// Arbitrary elements in the given order. Every index must be in bounds.
    Indices(Vec<usize>),
}

/// Result of a read.
#[derive(Clone, Debug, PartialEq)]
pub enum Selection {
    One(Value),
    Many(Vec<Value>),
}

impl Selection {
    /// The selected elements as a JSON value; a `Many` becomes an array.
    pub fn into_value(self) -> Value {
        match self {
            Self::One(v) => v,
            Self::Many(vs) => Value::Array(vs),
        }
    }

    pub fn into_vec(self) -> Vec<Value> {
        match self {
            Self::One(v) => vec![v],
            Self::Many(vs) => vs,
        }
    }
}

impl Selector {
    /// Evaluate against a buffer of `len` elements using `read` for single
    /// element access.
    pub(crate) fn select<F>(&self, len: usize, read: F) -> DataResult<Selection>
    where
        F: Fn(usize) -> DataResult<Value>,
    {
        let checked = |index: usize| {
            if index >= len {
                Err(DataError::IndexOutOfBounds { index, len })
            } else {
                read(index)
            }
        };
        match self {
            Self::Index(i) => checked(*i).map(Selection::One),
            Self::Range(range) => {
                let end = range.end.min(len);
                let start = range.start.min(end);
                (start..end).map(&checked).collect::<DataResult<_>>().map(Selection::Many)
            }
            Self::Indices(indices) => indices
                .iter()
                .map(|i| checked(*i))
                .collect::<DataResult<_>>()
                .map(Selection::Many),
        }
    }
}

impl From<usize> for Selector {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<Range<usize>> for Selector {
    fn from(range: Range<usize>) -> Self {
        Self::Range(range)
    }
}

impl From<Vec<usize>> for Selector {
    fn from(indices: Vec<usize>) -> Self {
        Self::Indices(indices)
    }
}

impl From<&[usize]> for Selector {
    fn from(indices: &[usize]) -> Self {
        Self::Indices(indices.to_vec())
    }
}
