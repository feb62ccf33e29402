//! Ordered block list of one resource.
//!
//! Blocks are kept sorted by start tick. The most recently scheduled block
//! is tracked so appending after it (the usual case in a forward
//! simulation) skips the ordered search.

use crate::models::{Block, BlockId, Tick};

/// Committed blocks in time order.
#[derive(Debug, Clone, Default)]
pub struct BlockList {
    blocks: Vec<Block>,
    last_scheduled: Option<BlockId>,
}

impl BlockList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from blocks in any order.
    pub fn from_blocks(mut blocks: Vec<Block>) -> Self {
        blocks.sort_by_key(|b| (b.start, b.id));
        let last_scheduled = blocks.last().map(|b| b.id);
        Self { blocks, last_scheduled }
    }

    /// Whether a block starting at `start` would land at the end.
    pub fn appends(&self, start: Tick) -> bool {
        self.blocks.last().map_or(true, |b| b.start <= start)
    }

    /// Inserts `block` in time order and makes it the last scheduled one.
    pub fn insert(&mut self, block: Block) -> &Block {
        let at = if self.appends(block.start) {
            self.blocks.len()
        } else {
            self.blocks.partition_point(|b| b.start <= block.start)
        };
        self.last_scheduled = Some(block.id);
        self.blocks.insert(at, block);
        &self.blocks[at]
    }

    /// Removes a block; the last-scheduled cursor moves to its predecessor.
    pub fn remove(&mut self, id: BlockId) -> Option<Block> {
        let at = self.position(id)?;
        let block = self.blocks.remove(at);
        if self.last_scheduled == Some(id) {
            self.last_scheduled = at.checked_sub(1).map(|i| self.blocks[i].id);
        }
        Some(block)
    }

    pub fn position(&self, id: BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == id)
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    /// Most recently scheduled block still present.
    pub fn last_scheduled(&self) -> Option<&Block> {
        self.last_scheduled.and_then(|id| self.get(id))
    }

    /// Latest-starting block finished by `tick`.
    pub fn preceding(&self, tick: Tick) -> Option<&Block> {
        self.blocks.iter().rev().find(|b| b.end <= tick)
    }

    /// Mutable access to the latest-starting block finished by `tick`.
    pub(crate) fn preceding_mut(&mut self, tick: Tick) -> Option<&mut Block> {
        self.blocks.iter_mut().rev().find(|b| b.end <= tick)
    }

    /// Blocks intersecting `[start, end)`.
    pub fn overlapping(&self, start: Tick, end: Tick) -> impl Iterator<Item = &Block> + '_ {
        let upper = self.blocks.partition_point(|b| b.start < end);
        self.blocks[..upper].iter().filter(move |b| b.end > start)
    }

    /// `(start, end)` of every block, in time order.
    /// Occupied resource time of every block.
    pub fn spans(&self) -> Vec<(Tick, Tick)> {
        self.blocks.iter().flat_map(Block::occupied_spans).collect()
    }

    pub fn last(&self) -> Option<&Block> {
        self.blocks.last()
    }

    pub fn as_slice(&self) -> &[Block] {
        &self.blocks
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RequiredCapacity, SequencedActivity, UsageProfile};
    use std::collections::HashMap;

    fn block(id: u64, start: Tick, end: Tick) -> Block {
        Block {
            id: BlockId(id),
            activity: SequencedActivity {
                activity_id: format!("A{id}"),
                job_id: "J".into(),
                product: "P".into(),
                batch_id: None,
                setup_code: None,
                setup_number: 0.0,
                attributes: HashMap::new(),
            },
            requirement_index: 0,
            start,
            end,
            profile: UsageProfile::new(),
            required: RequiredCapacity::default(),
            attention_percent: 100,
            clean_before: None,
            clean_after: None,
            quantity: 0.0,
        }
    }

    fn starts(list: &BlockList) -> Vec<Tick> {
        list.iter().map(|b| b.start).collect()
    }

    #[test]
    fn test_append_and_insert_keep_order() {
        let mut list = BlockList::new();
        list.insert(block(1, 0, 10));
        list.insert(block(2, 20, 30));
        assert!(!list.appends(15));
        list.insert(block(3, 10, 20));
        assert_eq!(starts(&list), [0, 10, 20]);
        assert_eq!(list.last_scheduled().map(|b| b.id), Some(BlockId(3)));
    }

    #[test]
    fn test_remove_rewinds_cursor() {
        let mut list = BlockList::new();
        list.insert(block(1, 0, 10));
        list.insert(block(2, 10, 20));
        assert_eq!(list.remove(BlockId(2)).map(|b| b.start), Some(10));
        assert_eq!(list.last_scheduled().map(|b| b.id), Some(BlockId(1)));
        assert!(list.remove(BlockId(2)).is_none());
        list.remove(BlockId(1));
        assert!(list.last_scheduled().is_none());
        assert!(list.is_empty());
    }

    #[test]
    fn test_queries() {
        let list = BlockList::from_blocks(vec![block(2, 50, 80), block(1, 0, 40), block(3, 60, 120)]);
        assert_eq!(starts(&list), [0, 50, 60]);
        assert_eq!(list.preceding(90).map(|b| b.id), Some(BlockId(2)));
        assert_eq!(list.preceding(45).map(|b| b.id), Some(BlockId(1)));
        assert!(list.preceding(30).is_none());
        let hits: Vec<_> = list.overlapping(70, 100).map(|b| b.id.0).collect();
        assert_eq!(hits, [2, 3]);
        assert_eq!(list.spans(), [(0, 40), (50, 80), (60, 120)]);
    }
}
