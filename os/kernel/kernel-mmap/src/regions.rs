use crate::MemoryRegion;
use arrayvec::ArrayVec;
use kernel_info::memory::MAX_MEMORY_REGIONS;

/// Usable memory regions in boot map order, bounded by
/// [`MAX_MEMORY_REGIONS`].
///
/// Regions beyond the capacity are counted and dropped, not treated as an
/// error.
#[derive(Clone, Debug, Default)]
pub struct MemoryRegions {
    regions: ArrayVec<MemoryRegion, MAX_MEMORY_REGIONS>,
    dropped: usize,
}

impl MemoryRegions {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            regions: ArrayVec::new_const(),
            dropped: 0,
        }
    }

    /// Append `region`; returns `false` if the list is full and it was dropped.
    pub fn push(&mut self, region: MemoryRegion) -> bool {
        if self.regions.try_push(region).is_ok() {
            true
        } else {
            self.dropped += 1;
            false
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Number of usable regions that did not fit.
    #[must_use]
    pub const fn dropped(&self) -> usize {
        self.dropped
    }

    #[must_use]
    pub fn as_slice(&self) -> &[MemoryRegion] {
        &self.regions
    }

    pub fn iter(&self) -> core::slice::Iter<'_, MemoryRegion> {
        self.regions.iter()
    }

    /// Sum of all retained region lengths.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.regions
            .iter()
            .fold(0u64, |acc, r| acc.saturating_add(r.length))
    }

    /// Whether a single retained region fully contains `[start, end)`.
    #[must_use]
    pub fn covers(&self, start: u64, end: u64) -> bool {
        self.regions.iter().any(|r| r.contains_range(start, end))
    }
}

impl<'a> IntoIterator for &'a MemoryRegions {
    type Item = &'a MemoryRegion;
    type IntoIter = core::slice::Iter<'a, MemoryRegion>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryKind;

    fn ram(base: u64, length: u64) -> MemoryRegion {
        MemoryRegion {
            base,
            length,
            kind: MemoryKind::Available,
        }
    }

    #[test]
    fn excess_regions_are_dropped() {
        let mut regions = MemoryRegions::new();
        for i in 0..MAX_MEMORY_REGIONS as u64 {
            assert!(regions.push(ram(i * 0x1000, 0x1000)));
        }
        assert!(!regions.push(ram(0xFFFF_0000, 0x1000)));
        assert!(!regions.push(ram(0xFFFF_1000, 0x1000)));

        assert_eq!(regions.len(), MAX_MEMORY_REGIONS);
        assert_eq!(regions.dropped(), 2);
        assert_eq!(regions.as_slice().last().map(|r| r.base), Some(99 * 0x1000));
    }

    #[test]
    fn coverage_requires_a_single_region() {
        let mut regions = MemoryRegions::new();
        regions.push(ram(0x0000_0000, 0x9_F000));
        regions.push(ram(0x0010_0000, 0x0010_0000));
        regions.push(ram(0x0020_0000, 0x0010_0000));

        assert!(regions.covers(0x0010_0000, 0x0011_0000));
        assert!(regions.covers(0x0020_0000, 0x0030_0000));
        // Adjacent regions are not merged.
        assert!(!regions.covers(0x001F_F000, 0x0020_1000));
        assert!(!regions.covers(0x000A_0000, 0x000B_0000));
        assert_eq!(regions.total_bytes(), 0x9_F000 + 0x0020_0000);
    }
}
