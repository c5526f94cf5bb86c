//!
//! Sub-ranges of a resource that a single access record can describe.
//!
//! Buffers are addressed by half-open byte intervals.
//! Images are addressed by a box of array layers and mip levels.
//!

use std::{cmp::{max, min}, fmt::Debug, ops::Range};
use syncline_core::hal::image::{Layer, Level};

/// Part of a resource covered by one record.
pub trait Region: Clone + Debug + PartialEq + 'static {
    /// Check if region covers nothing.
    fn is_empty(&self) -> bool;

    /// Check if regions share at least one element.
    fn overlaps(&self, other: &Self) -> bool;

    /// Check if `other` lies completely inside this region.
    fn contains(&self, other: &Self) -> bool;

    /// Check if regions touch without overlapping
    /// and their union can be described by a single region.
    fn adjacent(&self, other: &Self) -> bool;

    /// Exact union of two regions.
    ///
    /// # Panics
    ///
    /// In debug builds this function panics if the union is not representable,
    /// i.e. the regions are disjoint and not `adjacent`,
    /// or their union is not a single box.
    fn merge(&self, other: &Self) -> Self;

    /// Smallest region that covers both.
    fn bounds(&self, other: &Self) -> Self;

    /// Region a barrier must cover when `claim` conflicts with this earlier region.
    fn barrier_cover(&self, claim: &Self) -> Self;

    /// Common part of two overlapping regions.
    fn intersection(&self, other: &Self) -> Self;

    /// Push parts of this region not covered by `cut` into `rest`.
    /// Pushed regions are disjoint and non-empty.
    fn subtract(&self, cut: &Self, rest: &mut Vec<Self>);
}

fn span_overlaps<T: Ord>(left: &Range<T>, right: &Range<T>) -> bool {
    left.start < right.end && right.start < left.end
}

fn span_touches<T: Ord>(left: &Range<T>, right: &Range<T>) -> bool {
    left.end == right.start || right.end == left.start
}

fn span_contains<T: Ord>(outer: &Range<T>, inner: &Range<T>) -> bool {
    outer.start <= inner.start && inner.end <= outer.end
}

fn span_bounds<T: Ord + Copy>(left: &Range<T>, right: &Range<T>) -> Range<T> {
    min(left.start, right.start)..max(left.end, right.end)
}

fn span_intersection<T: Ord + Copy>(left: &Range<T>, right: &Range<T>) -> Range<T> {
    max(left.start, right.start)..min(left.end, right.end)
}

impl Region for Range<u64> {
    fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    fn overlaps(&self, other: &Self) -> bool {
        span_overlaps(self, other)
    }

    fn contains(&self, other: &Self) -> bool {
        span_contains(self, other)
    }

    fn adjacent(&self, other: &Self) -> bool {
        span_touches(self, other)
    }

    fn merge(&self, other: &Self) -> Self {
        debug_assert!(
            self.overlaps(other) || self.adjacent(other),
            "Byte ranges {:?} and {:?} are separated by a gap",
            self,
            other
        );
        span_bounds(self, other)
    }

    fn bounds(&self, other: &Self) -> Self {
        span_bounds(self, other)
    }

    fn barrier_cover(&self, claim: &Self) -> Self {
        span_bounds(self, claim)
    }

    fn intersection(&self, other: &Self) -> Self {
        span_intersection(self, other)
    }

    fn subtract(&self, cut: &Self, rest: &mut Vec<Self>) {
        if !self.overlaps(cut) {
            rest.push(self.clone());
            return;
        }
        if self.start < cut.start {
            rest.push(self.start..cut.start);
        }
        if cut.end < self.end {
            rest.push(cut.end..self.end);
        }
    }
}

/// Box of array layers and mip levels of an image.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageRegion {
    /// Array layers.
    pub layers: Range<Layer>,

    /// Mip levels.
    pub levels: Range<Level>,
}

impl ImageRegion {
    /// Create region from layer and level ranges.
    pub fn new(layers: Range<Layer>, levels: Range<Level>) -> Self {
        ImageRegion { layers, levels }
    }

    /// Region of a single layer and single level.
    pub fn single(layer: Layer, level: Level) -> Self {
        ImageRegion {
            layers: layer..layer + 1,
            levels: level..level + 1,
        }
    }

    /// Region covering `layers` layers and `levels` levels starting at zero.
    pub fn whole(layers: Layer, levels: Level) -> Self {
        ImageRegion {
            layers: 0..layers,
            levels: 0..levels,
        }
    }

    fn representable(&self, other: &Self) -> bool {
        let layers = self.layers == other.layers
            && (span_overlaps(&self.levels, &other.levels)
                || span_touches(&self.levels, &other.levels));
        let levels = self.levels == other.levels
            && (span_overlaps(&self.layers, &other.layers)
                || span_touches(&self.layers, &other.layers));
        layers || levels || self.contains(other) || other.contains(self)
    }
}

impl Region for ImageRegion {
    fn is_empty(&self) -> bool {
        self.layers.start >= self.layers.end || self.levels.start >= self.levels.end
    }

    fn overlaps(&self, other: &Self) -> bool {
        span_overlaps(&self.layers, &other.layers) && span_overlaps(&self.levels, &other.levels)
    }

    fn contains(&self, other: &Self) -> bool {
        span_contains(&self.layers, &other.layers) && span_contains(&self.levels, &other.levels)
    }

    fn adjacent(&self, other: &Self) -> bool {
        !self.overlaps(other) && self.representable(other)
    }

    fn merge(&self, other: &Self) -> Self {
        debug_assert!(
            self.representable(other),
            "Union of {:?} and {:?} is not a box",
            self,
            other
        );
        self.bounds(other)
    }

    fn bounds(&self, other: &Self) -> Self {
        ImageRegion {
            layers: span_bounds(&self.layers, &other.layers),
            levels: span_bounds(&self.levels, &other.levels),
        }
    }

    // Layout transition must name only subresources known to be in the old layout.
    fn barrier_cover(&self, _claim: &Self) -> Self {
        self.clone()
    }

    fn intersection(&self, other: &Self) -> Self {
        ImageRegion {
            layers: span_intersection(&self.layers, &other.layers),
            levels: span_intersection(&self.levels, &other.levels),
        }
    }

    // Whole layers outside the cut first, then levels outside the cut within shared layers.
    fn subtract(&self, cut: &Self, rest: &mut Vec<Self>) {
        if !self.overlaps(cut) {
            rest.push(self.clone());
            return;
        }
        let shared = span_intersection(&self.layers, &cut.layers);
        let pieces = [
            ImageRegion::new(self.layers.start..cut.layers.start, self.levels.clone()),
            ImageRegion::new(cut.layers.end..self.layers.end, self.levels.clone()),
            ImageRegion::new(shared.clone(), self.levels.start..cut.levels.start),
            ImageRegion::new(shared, cut.levels.end..self.levels.end),
        ];
        rest.extend(pieces.iter().filter(|piece| !piece.is_empty()).cloned());
    }
}
