//! The uniform buffer contract and its backing representations.

use serde_json::Value;
use tracing::{debug, warn};

use crate::dataio::DataIo;
use crate::error::{DataError, DataResult};
use crate::selector::{Selection, Selector};
use crate::shape::shape_of_rows;
use crate::store::ExternalStore;

/// The concrete storage form behind a [`DataBuffer`].
#[derive(Debug)]
pub enum Backing {
    /// Fixed-shape array. Readable, never growable.
    Fixed(Box<[Value]>),
    /// In-memory sequence, grown in place.
    Growable(Vec<Value>),
    /// External store, grown by resizing then writing the new tail.
    External(Box<dyn ExternalStore>),
    /// Write-policy transform owning the previous backing. Not growable.
    Wrapped(Box<DataIo>),
}

impl Backing {
    /// Human-readable name of the representation.
    pub fn representation(&self) -> &str {
        match self {
            Self::Fixed(_) => "fixed array",
            Self::Growable(_) => "list",
            Self::External(store) => store.type_name(),
            Self::Wrapped(_) => "DataIo",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Fixed(items) => items.len(),
            Self::Growable(items) => items.len(),
            Self::External(store) => store.len(),
            Self::Wrapped(io) => io.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn read(&self, index: usize) -> DataResult<Value> {
        let from_slice = |items: &[Value]| {
            items.get(index).cloned().ok_or(DataError::IndexOutOfBounds {
                index,
                len: items.len(),
            })
        };
        match self {
            Self::Fixed(items) => from_slice(&items[..]),
            Self::Growable(items) => from_slice(&items[..]),
            Self::External(store) => store.read(index),
            Self::Wrapped(io) => io.read(index),
        }
    }

    pub(crate) fn shape(&self) -> Option<Vec<usize>> {
        match self {
            Self::Fixed(items) => Some(shape_of_rows(items)),
            Self::Growable(items) => Some(shape_of_rows(items)),
            Self::External(store) => Some(store.shape()),
            Self::Wrapped(io) => io.shape(),
        }
    }

    fn unsupported(&self) -> DataError {
        DataError::UnsupportedMutation {
            representation: self.representation().to_string(),
        }
    }
}

/// Payload of a leaf object behind one append/extend/index contract.
///
/// The buffer exclusively owns its backing. Installing a [`DataIo`] moves the
/// current backing into the transform instead of aliasing it.
#[derive(Debug)]
pub struct DataBuffer {
    backing: Backing,
}

impl DataBuffer {
    pub fn new(backing: Backing) -> Self {
        Self { backing }
    }

    /// A buffer over a fixed array.
    pub fn fixed(values: Vec<Value>) -> Self {
        Self::new(Backing::Fixed(values.into_boxed_slice()))
    }

    /// A buffer over a growable in-memory sequence.
    pub fn growable(values: Vec<Value>) -> Self {
        Self::new(Backing::Growable(values))
    }

    /// A buffer over an external store.
    pub fn external(store: impl ExternalStore + 'static) -> Self {
        Self::new(Backing::External(Box::new(store)))
    }

    pub fn backing(&self) -> &Backing {
        &self.backing
    }

    pub fn into_backing(self) -> Backing {
        self.backing
    }

    pub fn representation(&self) -> &str {
        self.backing.representation()
    }

    pub fn len(&self) -> usize {
        self.backing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backing.is_empty()
    }

    /// Truth value of the buffer: non-empty.
    pub fn is_truthy(&self) -> bool {
        self.len() != 0
    }

    /// Shape of the payload, first axis included.
    pub fn shape(&self) -> Option<Vec<usize>> {
        self.backing.shape()
    }

    /// Read elements. A list of indices yields a list of elements.
    pub fn get(&self, selector: impl Into<Selector>) -> DataResult<Selection> {
        selector
            .into()
            .select(self.len(), |index| self.backing.read(index))
    }

    /// Append one element at the end.
    pub fn append(&mut self, value: Value) -> DataResult<()> {
        match &mut self.backing {
            Backing::Growable(items) => items.push(value),
            Backing::External(store) => {
                let len = store.len();
                grow_store(store.as_mut(), len, &[value])?;
            }
            other => return Err(other.unsupported()),
        }
        debug!(len = self.len(), "buffer appended");
        Ok(())
    }

    /// Append every element of `values` at the end.
    pub fn extend<I>(&mut self, values: I) -> DataResult<()>
    where
        I: IntoIterator<Item = Value>,
    {
        match &mut self.backing {
            Backing::Growable(items) => items.extend(values),
            Backing::External(store) => {
                let values: Vec<Value> = values.into_iter().collect();
                let len = store.len();
                grow_store(store.as_mut(), len, &values)?;
            }
            other => return Err(other.unsupported()),
        }
        debug!(len = self.len(), "buffer extended");
        Ok(())
    }

    /// Hand the current payload to `dataio` and make the transform the new
    /// backing. Installing again wraps the previous transform; the last one
    /// installed is outermost.
    pub fn set_dataio(&mut self, mut dataio: DataIo) {
        let raw = std::mem::replace(&mut self.backing, Backing::Growable(Vec::new()));
        debug!(wrapped = raw.representation(), "installing data I/O transform");
        dataio.wrap(raw);
        self.backing = Backing::Wrapped(Box::new(dataio));
    }
}

impl From<Vec<Value>> for DataBuffer {
    fn from(values: Vec<Value>) -> Self {
        Self::growable(values)
    }
}

/// Resize `store` to hold `values` after its first `len` slots, then write
/// them. A failed write shrinks the store back.
fn grow_store(store: &mut dyn ExternalStore, len: usize, values: &[Value]) -> DataResult<()> {
    store.resize(len + values.len())?;
    if let Err(e) = store.write(len, values) {
        if let Err(rollback) = store.resize(len) {
            warn!(error = %rollback, len, "failed to shrink store after write error");
        }
        return Err(e);
    }
    Ok(())
}
