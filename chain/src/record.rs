//!
//! Single tracked fact about part of one resource and the algebra
//! that decides what happens when a new access meets an existing one.
//!

use crate::{
    access::AccessFlags,
    region::Region,
    resource::{Image, Resource},
};
use std::ops::Range;
use syncline_core::hal::{self, pso::PipelineStage, queue::QueueFamilyId};

/// State in which resource is accessed.
#[derive(Clone, Copy, Debug)]
pub struct State<R: Resource> {
    /// Stages at which the access is performed.
    pub stages: PipelineStage,

    /// Access types performed.
    pub access: R::Access,

    /// Layout of the resource during the access.
    pub layout: R::Layout,
}

impl<R: Resource> PartialEq for State<R> {
    fn eq(&self, other: &Self) -> bool {
        self.stages == other.stages && self.access == other.access && self.layout == other.layout
    }
}

impl<R: Resource> Eq for State<R> {}

impl<R: Resource> State<R> {
    /// Create new state.
    pub fn new(stages: PipelineStage, access: R::Access, layout: R::Layout) -> Self {
        State {
            stages,
            access,
            layout,
        }
    }

    /// Check if state contains write access.
    pub fn exclusive(&self) -> bool {
        self.access.exclusive()
    }

    /// Combine two non-conflicting states.
    fn union(self, other: Self) -> Self {
        debug_assert_eq!(self.layout, other.layout);
        State {
            stages: self.stages | other.stages,
            access: self.access | other.access,
            layout: self.layout,
        }
    }
}

impl State<Image> {
    /// Image state with the layout picked by `Image::layout_for`.
    pub fn for_image_access(stages: PipelineStage, access: hal::image::Access) -> Self {
        State::new(stages, access, Image::layout_for(access))
    }
}

/// Queue family ownership of a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Owner {
    /// Resource is shared between families and requires no ownership transfer.
    Concurrent,

    /// Resource is owned by the family.
    Exclusive(QueueFamilyId),

    /// Placeholder left by a record transfer.
    /// Resource was last owned by the family and the owning queue is not this one.
    Foreign(QueueFamilyId),
}

impl Owner {
    /// Families for ownership transfer barrier when access moves from `self` to `next`.
    pub fn transfer_to(self, next: Owner) -> Option<Range<QueueFamilyId>> {
        match (self, next) {
            (Owner::Exclusive(src), Owner::Exclusive(dst))
            | (Owner::Foreign(src), Owner::Exclusive(dst))
                if src != dst =>
            {
                Some(src..dst)
            }
            _ => None,
        }
    }
}

/// Outstanding claim of some state over a region of one resource.
#[derive(Clone, Debug)]
pub struct AccessRecord<R: Resource> {
    /// Covered region.
    pub region: R::Region,

    /// Latest state of the region.
    pub state: State<R>,

    /// Family ownership.
    pub owner: Owner,

    /// Next record of the same resource.
    pub(crate) next: Option<u32>,
}

/// Relation between an existing record and a new claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Overlap {
    /// Existing record already covers the claim with identical read-only state.
    Inclusive,

    /// Regions overlap and accesses conflict. Barrier is required.
    Hazard,

    /// Regions overlap or touch and can be described by one record.
    Merge,

    /// Nothing in common.
    Disjoint,
}

impl<R: Resource> AccessRecord<R> {
    /// Create new unlinked record.
    pub fn new(region: R::Region, state: State<R>, owner: Owner) -> Self {
        AccessRecord {
            region,
            state,
            owner,
            next: None,
        }
    }

    /// Degenerate record that can never include a real access.
    /// Left in another queue's table by record transfer.
    pub fn placeholder(region: R::Region, layout: R::Layout, family: QueueFamilyId) -> Self {
        AccessRecord::new(
            region,
            State::new(PipelineStage::TOP_OF_PIPE, R::Access::empty(), layout),
            Owner::Foreign(family),
        )
    }

    /// Check if this record is a transfer placeholder.
    pub fn is_placeholder(&self) -> bool {
        match self.owner {
            Owner::Foreign(_) => true,
            _ => false,
        }
    }

    /// Check if accesses can't be reordered without synchronization.
    fn conflicts(&self, claim: &Self) -> bool {
        self.state.exclusive()
            || claim.state.exclusive()
            || self.state.layout != claim.state.layout
            || self.owner != claim.owner
    }

    /// Classify how `claim` relates to this record.
    pub fn overlap(&self, claim: &Self) -> Overlap {
        if self.region.overlaps(&claim.region) {
            if self.conflicts(claim) {
                Overlap::Hazard
            } else if self.state == claim.state && self.region.contains(&claim.region) {
                Overlap::Inclusive
            } else {
                Overlap::Merge
            }
        } else if self.state == claim.state
            && self.owner == claim.owner
            && self.region.adjacent(&claim.region)
        {
            Overlap::Merge
        } else {
            Overlap::Disjoint
        }
    }

    /// Absorb non-conflicting record into this claim.
    pub(crate) fn absorb(&mut self, other: &Self) {
        self.region = if self.region.overlaps(&other.region) {
            self.region.bounds(&other.region)
        } else {
            self.region.merge(&other.region)
        };
        self.state = self.state.union(other.state);
    }
}
