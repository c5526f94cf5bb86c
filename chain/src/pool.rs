use crate::{record::AccessRecord, resource::Resource, MAX_RECORDS};

#[derive(Debug)]
enum Node<R: Resource> {
    Used(AccessRecord<R>),
    Free(Option<u32>),
}

/// Fixed-capacity arena of access records.
/// Records are addressed by slot index and linked into per-resource chains.
#[derive(Debug)]
pub(crate) struct RecordPool<R: Resource> {
    nodes: Vec<Node<R>>,
    free: Option<u32>,
    used: usize,
}

impl<R> RecordPool<R>
where
    R: Resource,
{
    pub(crate) fn new() -> Self {
        RecordPool {
            nodes: Vec::with_capacity(MAX_RECORDS),
            free: None,
            used: 0,
        }
    }

    /// Number of live records.
    pub(crate) fn len(&self) -> usize {
        self.used
    }

    /// Put record into the pool.
    ///
    /// # Panics
    ///
    /// Panics if `MAX_RECORDS` records are alive already.
    pub(crate) fn insert(&mut self, record: AccessRecord<R>) -> u32 {
        self.used += 1;
        match self.free {
            Some(slot) => {
                let node = &mut self.nodes[slot as usize];
                self.free = match *node {
                    Node::Free(next) => next,
                    Node::Used(_) => unreachable!("Free list points to used slot {}", slot),
                };
                *node = Node::Used(record);
                slot
            }
            None => {
                assert!(
                    self.nodes.len() < MAX_RECORDS,
                    "{} access records exhausted (MAX_RECORDS = {})",
                    R::NAME,
                    MAX_RECORDS
                );
                self.nodes.push(Node::Used(record));
                (self.nodes.len() - 1) as u32
            }
        }
    }

    /// Take record out of the pool returning its slot to the free list.
    pub(crate) fn remove(&mut self, slot: u32) -> AccessRecord<R> {
        let node = std::mem::replace(&mut self.nodes[slot as usize], Node::Free(self.free));
        match node {
            Node::Used(record) => {
                self.free = Some(slot);
                self.used -= 1;
                record
            }
            Node::Free(next) => {
                self.nodes[slot as usize] = Node::Free(next);
                panic!("Access record slot {} is already free", slot);
            }
        }
    }

    pub(crate) fn get(&self, slot: u32) -> &AccessRecord<R> {
        match &self.nodes[slot as usize] {
            Node::Used(record) => record,
            Node::Free(_) => panic!("Access record slot {} is free", slot),
        }
    }

    pub(crate) fn get_mut(&mut self, slot: u32) -> &mut AccessRecord<R> {
        match &mut self.nodes[slot as usize] {
            Node::Used(record) => record,
            Node::Free(_) => panic!("Access record slot {} is free", slot),
        }
    }

    /// Free whole chain starting at `head`.
    /// Returns number of freed records.
    pub(crate) fn free_chain(&mut self, head: Option<u32>) -> usize {
        let mut count = 0;
        let mut cur = head;
        while let Some(slot) = cur {
            cur = self.remove(slot).next;
            count += 1;
        }
        count
    }
}
