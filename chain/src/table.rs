//!
//! Per-resource chains of access records
//! addressed by an open-addressed map from resource id to chain head.
//!

use crate::{
    barrier::Barrier,
    pool::RecordPool,
    record::{AccessRecord, Overlap},
    region::Region,
    resource::Resource,
    Id, MAX_RESOURCES,
};
use syncline_core::{syncline_slow_assert, syncline_slow_assert_eq};
use std::{
    cmp::max,
    hash::{Hash, Hasher},
    ops::Range,
};
use syncline_core::hal::pso::PipelineStage;

const TABLE_SIZE: usize = MAX_RESOURCES * 2;

#[derive(Clone, Copy, Debug)]
struct Entry {
    id: Id,
    head: Option<u32>,
    stamp: u64,
}

/// Linear probing map with backward shift deletion.
/// Never filled more than half so probing always meets an empty slot.
#[derive(Debug)]
struct ResourceMap {
    slots: Vec<Option<Entry>>,
    len: usize,
}

impl ResourceMap {
    fn new() -> Self {
        debug_assert!(TABLE_SIZE.is_power_of_two());
        ResourceMap {
            slots: vec![None; TABLE_SIZE],
            len: 0,
        }
    }

    fn ideal(id: Id) -> usize {
        let mut hasher = fnv::FnvHasher::default();
        id.hash(&mut hasher);
        hasher.finish() as usize & (TABLE_SIZE - 1)
    }

    fn find(&self, id: Id) -> Option<usize> {
        let mut index = Self::ideal(id);
        loop {
            match &self.slots[index] {
                None => return None,
                Some(entry) if entry.id == id => return Some(index),
                Some(_) => index = (index + 1) & (TABLE_SIZE - 1),
            }
        }
    }

    fn find_or_insert(&mut self, id: Id, stamp: u64) -> usize {
        let mut index = Self::ideal(id);
        loop {
            match &self.slots[index] {
                None => break,
                Some(entry) if entry.id == id => return index,
                Some(_) => index = (index + 1) & (TABLE_SIZE - 1),
            }
        }

        assert!(
            self.len < MAX_RESOURCES,
            "Too many tracked resources (MAX_RESOURCES = {})",
            MAX_RESOURCES
        );
        self.len += 1;
        self.slots[index] = Some(Entry {
            id,
            head: None,
            stamp,
        });
        index
    }

    fn entry(&self, index: usize) -> &Entry {
        match &self.slots[index] {
            Some(entry) => entry,
            None => panic!("Resource map slot {} is empty", index),
        }
    }

    fn entry_mut(&mut self, index: usize) -> &mut Entry {
        match &mut self.slots[index] {
            Some(entry) => entry,
            None => panic!("Resource map slot {} is empty", index),
        }
    }

    fn remove_at(&mut self, mut hole: usize) -> Entry {
        let removed = self.slots[hole].take();
        self.len -= 1;

        let mut next = (hole + 1) & (TABLE_SIZE - 1);
        while let Some(entry) = self.slots[next] {
            let ideal = Self::ideal(entry.id);
            let stays = if hole <= next {
                hole < ideal && ideal <= next
            } else {
                hole < ideal || ideal <= next
            };
            if !stays {
                self.slots[hole] = self.slots[next].take();
                hole = next;
            }
            next = (next + 1) & (TABLE_SIZE - 1);
        }

        match removed {
            Some(entry) => entry,
            None => panic!("Removing empty resource map slot"),
        }
    }

    fn entries(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.slots.iter().filter_map(Option::as_ref)
    }
}

/// Iterator over one resource chain.
#[derive(Debug)]
pub struct ChainIter<'a, R: Resource> {
    pool: &'a RecordPool<R>,
    cur: Option<u32>,
}

impl<'a, R> Iterator for ChainIter<'a, R>
where
    R: Resource,
{
    type Item = &'a AccessRecord<R>;

    fn next(&mut self) -> Option<&'a AccessRecord<R>> {
        let slot = self.cur?;
        let record = self.pool.get(slot);
        self.cur = record.next;
        Some(record)
    }
}

/// Tracked state of all resources of one kind as seen by one queue.
#[derive(Debug)]
pub(crate) struct HazardTable<R: Resource> {
    pool: RecordPool<R>,
    map: ResourceMap,
    evicted: Vec<Id>,
}

impl<R> HazardTable<R>
where
    R: Resource,
{
    pub(crate) fn new() -> Self {
        HazardTable {
            pool: RecordPool::new(),
            map: ResourceMap::new(),
            evicted: Vec::new(),
        }
    }

    /// Number of tracked resources.
    pub(crate) fn len(&self) -> usize {
        self.map.len
    }

    /// Number of live records across all chains.
    pub(crate) fn records(&self) -> usize {
        self.pool.len()
    }

    pub(crate) fn contains(&self, id: Id) -> bool {
        self.map.find(id).is_some()
    }

    /// Generation at which the resource was last touched.
    pub(crate) fn stamp(&self, id: Id) -> Option<u64> {
        self.map.find(id).map(|index| self.map.entry(index).stamp)
    }

    pub(crate) fn chain(&self, id: Id) -> ChainIter<'_, R> {
        ChainIter {
            pool: &self.pool,
            cur: self.map.find(id).and_then(|index| self.map.entry(index).head),
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (Id, &AccessRecord<R>)> + '_ {
        let pool = &self.pool;
        self.map.entries().flat_map(move |entry| {
            let id = entry.id;
            ChainIter {
                pool,
                cur: entry.head,
            }
            .map(move |record| (id, record))
        })
    }

    /// Unlink record from the chain. Returns removed record.
    fn unlink(&mut self, index: usize, prev: Option<u32>, slot: u32) -> AccessRecord<R> {
        let record = self.pool.remove(slot);
        match prev {
            Some(prev) => self.pool.get_mut(prev).next = record.next,
            None => self.map.entry_mut(index).head = record.next,
        }
        record
    }

    /// Apply new claim to the resource chain.
    ///
    /// Every conflicting record is replaced by the claim and reported to `emit`
    /// together with source and destination stages.
    pub(crate) fn record<F>(
        &mut self,
        id: Id,
        mut claim: AccessRecord<R>,
        generation: u64,
        mut emit: F,
    ) where
        F: FnMut(Barrier<R>, Range<PipelineStage>),
    {
        let index = self.map.find_or_insert(id, generation);
        self.map.entry_mut(index).stamp = generation;

        let mut absorbed = false;
        let mut prev = None;
        let mut cur = self.map.entry(index).head;

        while let Some(slot) = cur {
            let (overlap, next) = {
                let existing = self.pool.get(slot);
                (existing.overlap(&claim), existing.next)
            };

            match overlap {
                Overlap::Disjoint => {
                    prev = Some(slot);
                    cur = next;
                    continue;
                }
                Overlap::Inclusive if !absorbed => {
                    log::trace!("{} {:?} already in {:?}", R::NAME, id, claim.state);
                    return;
                }
                Overlap::Hazard => {
                    let existing = self.unlink(index, prev, slot);
                    let barrier = Barrier {
                        id,
                        region: existing.region.barrier_cover(&claim.region),
                        families: existing.owner.transfer_to(claim.owner),
                        states: (existing.state.access, existing.state.layout)
                            ..(claim.state.access, claim.state.layout),
                    };
                    log::trace!(
                        "Hazard on {} {:?}: {:?}",
                        R::NAME,
                        id,
                        barrier
                    );
                    emit(barrier, existing.state.stages..claim.state.stages);
                    claim.region = existing.region.bounds(&claim.region);
                }
                Overlap::Inclusive | Overlap::Merge => {
                    let existing = self.unlink(index, prev, slot);
                    log::trace!(
                        "Merge {} {:?}: {:?} into {:?}",
                        R::NAME,
                        id,
                        existing.region,
                        claim.region
                    );
                    claim.absorb(&existing);
                }
            }

            // Enlarged claim must be checked against whole chain again.
            absorbed = true;
            prev = None;
            cur = self.map.entry(index).head;
        }

        claim.next = None;
        let slot = self.pool.insert(claim);
        match prev {
            Some(prev) => self.pool.get_mut(prev).next = Some(slot),
            None => self.map.entry_mut(index).head = Some(slot),
        }

        syncline_slow_assert!(
            {
                let inserted = &self.pool.get(slot).region;
                self.chain(id).filter(|r| r.region.overlaps(inserted)).count() == 1
            },
            "Records of {} {:?} overlap",
            R::NAME,
            id
        );
    }

    fn link(&mut self, index: usize, mut record: AccessRecord<R>) {
        record.next = self.map.entry(index).head;
        let slot = self.pool.insert(record);
        self.map.entry_mut(index).head = Some(slot);
    }

    /// Put transfer placeholder over its region.
    ///
    /// Records overlapping the region are cut. Their parts inside the region
    /// become placeholders that keep their stages and access, parts outside
    /// are left as they were. The placeholder never grows past its region.
    ///
    /// `stamp` can only age the resource back to the time the source touched it.
    /// With `keep_layout` the cut parts keep their own layout instead of the placeholder's.
    pub(crate) fn place(&mut self, id: Id, placeholder: AccessRecord<R>, stamp: u64, keep_layout: bool) {
        let index = self.map.find_or_insert(id, stamp);
        {
            let entry = self.map.entry_mut(index);
            entry.stamp = max(entry.stamp, stamp);
        }

        let mut uncovered = vec![placeholder.region.clone()];
        let mut cut = Vec::new();
        let mut placed = Vec::new();
        let mut prev = None;
        let mut cur = self.map.entry(index).head;

        while let Some(slot) = cur {
            let (overlaps, next) = {
                let existing = self.pool.get(slot);
                (existing.region.overlaps(&placeholder.region), existing.next)
            };
            cur = next;
            if !overlaps {
                prev = Some(slot);
                continue;
            }

            let existing = self.unlink(index, prev, slot);
            let shared = existing.region.intersection(&placeholder.region);
            log::trace!(
                "Placeholder for {} {:?} cuts {:?} at {:?}",
                R::NAME,
                id,
                existing.region,
                shared
            );

            let mut state = placeholder.state;
            state.stages |= existing.state.stages;
            state.access |= existing.state.access;
            if keep_layout {
                state.layout = existing.state.layout;
            }

            let mut remainder = Vec::new();
            existing.region.subtract(&placeholder.region, &mut remainder);
            placed.extend(
                remainder
                    .into_iter()
                    .map(|region| AccessRecord::new(region, existing.state, existing.owner)),
            );

            cut.clear();
            for piece in &uncovered {
                piece.subtract(&shared, &mut cut);
            }
            std::mem::swap(&mut uncovered, &mut cut);

            placed.push(AccessRecord::new(shared, state, placeholder.owner));
        }

        placed.extend(
            uncovered
                .into_iter()
                .map(|region| AccessRecord::new(region, placeholder.state, placeholder.owner)),
        );
        for record in placed {
            self.link(index, record);
        }

        syncline_slow_assert!(
            {
                let records: Vec<_> = self.chain(id).map(|r| &r.region).collect();
                records.iter().enumerate().all(|(i, a)| {
                    records[i + 1..].iter().all(|b| !a.overlaps(b))
                })
            },
            "Records of {} {:?} overlap after transfer",
            R::NAME,
            id
        );
    }

    /// Evict resources not touched for `delay` generations.
    /// Returns number of evicted resources.
    pub(crate) fn prune(&mut self, generation: u64, delay: u64) -> usize {
        self.evicted.clear();
        self.evicted.extend(
            self.map
                .entries()
                .filter(|entry| generation - entry.stamp >= delay)
                .map(|entry| entry.id),
        );

        for &id in &self.evicted {
            if let Some(index) = self.map.find(id) {
                let entry = self.map.remove_at(index);
                let freed = self.pool.free_chain(entry.head);
                log::trace!("Evicted {} {:?} with {} records", R::NAME, id, freed);
            }
        }

        syncline_slow_assert_eq!(
            self.pool.len(),
            self.map
                .entries()
                .map(|entry| ChainIter { pool: &self.pool, cur: entry.head }.count())
                .sum::<usize>(),
            "Records leaked by eviction"
        );
        self.evicted.len()
    }
}
