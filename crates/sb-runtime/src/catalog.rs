use std::collections::HashMap;
use std::sync::Arc;

use sb_core::{BlockDefinition, BlockOp, Category, LevelId, SpellBlocksError};

use crate::level::LevelPolicy;

/// Fixed vocabulary of one level. Catalogs are never shared between levels.
#[derive(Debug, Clone)]
pub struct Catalog {
    level: LevelId,
    definitions: Vec<Arc<BlockDefinition>>,
    index_by_id: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(
        policy: &dyn LevelPolicy,
        definitions: Vec<BlockDefinition>,
    ) -> Result<Self, SpellBlocksError> {
        let mut index_by_id = HashMap::new();
        let mut registered = Vec::with_capacity(definitions.len());

        for definition in definitions {
            if index_by_id.contains_key(&definition.id) {
                return Err(SpellBlocksError::new(
                    "CATALOG_DUPLICATE_BLOCK",
                    format!("Block \"{}\" is registered twice.", definition.id),
                ));
            }

            let op_category = definition.op.category();
            if definition.category != op_category {
                return Err(SpellBlocksError::new(
                    "CATALOG_CATEGORY_MISMATCH",
                    format!(
                        "Block \"{}\" is declared as {} but its operation is {}.",
                        definition.id, definition.category, op_category
                    ),
                ));
            }

            if matches!(op_category, Category::Loop | Category::Structure) && !policy.allows_loops()
            {
                return Err(SpellBlocksError::new(
                    "CATALOG_LOOP_NOT_ALLOWED",
                    format!(
                        "Block \"{}\" is a loop block, but level \"{}\" has no loops.",
                        definition.id,
                        policy.id()
                    ),
                ));
            }

            if op_category == Category::Action
                && !matches!(definition.op, BlockOp::Celebrate)
                && !policy.supports_action(&definition.op)
            {
                return Err(SpellBlocksError::new(
                    "CATALOG_ACTION_UNSUPPORTED",
                    format!(
                        "Level \"{}\" cannot perform the action of block \"{}\".",
                        policy.id(),
                        definition.id
                    ),
                ));
            }

            index_by_id.insert(definition.id.clone(), registered.len());
            registered.push(Arc::new(definition));
        }

        Ok(Self {
            level: policy.id(),
            definitions: registered,
            index_by_id,
        })
    }

    pub fn level(&self) -> LevelId {
        self.level
    }

    pub fn get(&self, id: &str) -> Option<&Arc<BlockDefinition>> {
        self.index_by_id
            .get(id)
            .map(|index| &self.definitions[*index])
    }

    pub fn definition(&self, id: &str) -> Result<&Arc<BlockDefinition>, SpellBlocksError> {
        self.get(id).ok_or_else(|| {
            SpellBlocksError::new(
                "CATALOG_BLOCK_NOT_FOUND",
                format!(
                    "Block \"{}\" is not available in level \"{}\".",
                    id, self.level
                ),
            )
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<BlockDefinition>> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
