//! Data leaf operations routed through the tree.
//!
//! Mutations go through here rather than through [`DataBuffer`] directly so
//! that a successful change marks the leaf and its owners modified.

use serde_json::Value;
use tracing::debug;

use hdm_data::{DataBuffer, DataIo, Selection, Selector};

use crate::error::{ContainerError, ContainerResult};
use crate::node::{NodeId, NodeKind};
use crate::tree::ContainerTree;

impl ContainerTree {
    /// The buffer of a data node.
    pub fn data(&self, id: NodeId) -> ContainerResult<&DataBuffer> {
        let node = self.node(id)?;
        node.data().ok_or_else(|| ContainerError::NotData {
            name: node.name.clone(),
        })
    }

    pub fn data_shape(&self, id: NodeId) -> ContainerResult<Option<Vec<usize>>> {
        Ok(self.data(id)?.shape())
    }

    pub fn get_data(
        &self,
        id: NodeId,
        selector: impl Into<Selector>,
    ) -> ContainerResult<Selection> {
        Ok(self.data(id)?.get(selector)?)
    }

    pub fn append_data(&mut self, id: NodeId, value: Value) -> ContainerResult<()> {
        self.data_mut(id)?.append(value)?;
        self.set_modified(id, true)
    }

    pub fn extend_data<I>(&mut self, id: NodeId, values: I) -> ContainerResult<()>
    where
        I: IntoIterator<Item = Value>,
    {
        self.data_mut(id)?.extend(values)?;
        self.set_modified(id, true)
    }

    /// Wrap the node's payload in a write-policy transform.
    pub fn set_dataio(&mut self, id: NodeId, dataio: DataIo) -> ContainerResult<()> {
        self.data_mut(id)?.set_dataio(dataio);
        debug!(node = %id, "data I/O installed");
        self.set_modified(id, true)
    }

    fn data_mut(&mut self, id: NodeId) -> ContainerResult<&mut DataBuffer> {
        let node = self.node_mut(id)?;
        match &mut node.kind {
            NodeKind::Data(buffer) => Ok(buffer),
            NodeKind::Container => Err(ContainerError::NotData {
                name: node.name.clone(),
            }),
        }
    }
}
