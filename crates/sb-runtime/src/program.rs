use std::sync::Arc;

use sb_core::{BlockDefinition, BlockInstance, InstanceId};

/// The learner's ordered block sequence.
#[derive(Debug, Clone, Default)]
pub struct Program {
    blocks: Vec<BlockInstance>,
    next_instance_id: InstanceId,
}

impl Program {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            next_instance_id: 1,
        }
    }

    /// Instance ids come from a counter that survives `clear`, so ids are never reused.
    pub fn append(&mut self, definition: Arc<BlockDefinition>) -> InstanceId {
        let instance_id = self.next_instance_id.max(1);
        self.next_instance_id = instance_id + 1;
        self.blocks.push(BlockInstance {
            instance_id,
            definition,
        });
        instance_id
    }

    /// Returns whether a block was removed. Unknown ids are ignored.
    pub fn remove(&mut self, instance_id: InstanceId) -> bool {
        let before = self.blocks.len();
        self.blocks
            .retain(|instance| instance.instance_id != instance_id);
        self.blocks.len() != before
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    pub fn list(&self) -> &[BlockInstance] {
        &self.blocks
    }

    pub fn block_ids(&self) -> Vec<String> {
        self.blocks
            .iter()
            .map(|instance| instance.block_id().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
