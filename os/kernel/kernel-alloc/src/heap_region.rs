//! Bounds of the frame heap.

use kernel_info::memory::{FRAME_SIZE, MAX_HEAP_FRAMES};
use kernel_memory_addresses::{PhysicalAddress, PhysicalPage, Size4K};

#[derive(Debug, thiserror::Error, Copy, Clone, Eq, PartialEq)]
pub enum HeapError {
    #[error("heap bounds {start}..{end} are not frame aligned")]
    Misaligned {
        start: PhysicalAddress,
        end: PhysicalAddress,
    },
    #[error("heap bounds {start}..{end} do not contain a single frame")]
    Empty {
        start: PhysicalAddress,
        end: PhysicalAddress,
    },
    #[error("heap spans {frames} frames, bookkeeping covers at most one frame of entries")]
    TooLarge { frames: u32 },
}

/// A frame-aligned physical range `[start, end)` managed by the allocator.
///
/// Frame 0 holds the bookkeeping table; frames `1..frame_count()` are
/// handed out.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct HeapRegion {
    start: PhysicalAddress,
    end: PhysicalAddress,
}

impl HeapRegion {
    /// Validate the bounds of a heap.
    ///
    /// # Errors
    /// - [`HeapError::Misaligned`] unless both ends are frame aligned.
    /// - [`HeapError::Empty`] if the range holds no frame at all.
    /// - [`HeapError::TooLarge`] if one byte per frame would not fit in
    ///   frame 0.
    pub const fn new(start: PhysicalAddress, end: PhysicalAddress) -> Result<Self, HeapError> {
        if !start.is_aligned::<Size4K>() || !end.is_aligned::<Size4K>() {
            return Err(HeapError::Misaligned { start, end });
        }
        if end.as_u32() <= start.as_u32() {
            return Err(HeapError::Empty { start, end });
        }
        let frames = (end.as_u32() - start.as_u32()) / FRAME_SIZE;
        if frames > MAX_HEAP_FRAMES {
            return Err(HeapError::TooLarge { frames });
        }
        Ok(Self { start, end })
    }

    #[inline]
    #[must_use]
    pub const fn start(&self) -> PhysicalAddress {
        self.start
    }

    #[inline]
    #[must_use]
    pub const fn end(&self) -> PhysicalAddress {
        self.end
    }

    #[inline]
    #[must_use]
    pub const fn len_bytes(&self) -> usize {
        (self.end.as_u32() - self.start.as_u32()) as usize
    }

    /// Frames in the region, including the bookkeeping frame.
    #[inline]
    #[must_use]
    pub const fn frame_count(&self) -> usize {
        self.len_bytes() / FRAME_SIZE as usize
    }

    /// Frames that can be handed out.
    #[inline]
    #[must_use]
    pub const fn usable_frames(&self) -> usize {
        self.frame_count() - 1
    }

    #[inline]
    #[must_use]
    pub const fn contains(&self, addr: PhysicalAddress) -> bool {
        addr.as_u32() >= self.start.as_u32() && addr.as_u32() < self.end.as_u32()
    }

    /// The frame at `index`; `index` must be below [`frame_count`](Self::frame_count).
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn frame(&self, index: usize) -> PhysicalPage<Size4K> {
        debug_assert!(index < self.frame_count());
        PhysicalPage::from_addr(PhysicalAddress::new(
            self.start.as_u32() + index as u32 * FRAME_SIZE,
        ))
    }

    /// Index of the frame containing `addr`, if it lies in the region.
    #[inline]
    #[must_use]
    pub const fn index_of(&self, addr: PhysicalAddress) -> Option<usize> {
        if self.contains(addr) {
            Some(((addr.as_u32() - self.start.as_u32()) / FRAME_SIZE) as usize)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pa(v: u32) -> PhysicalAddress {
        PhysicalAddress::new(v)
    }

    #[test]
    fn counts_frames_and_reserves_one() {
        let heap = HeapRegion::new(pa(0x0020_0000), pa(0x0020_8000)).unwrap();
        assert_eq!(heap.frame_count(), 8);
        assert_eq!(heap.usable_frames(), 7);
        assert_eq!(heap.frame(1).base(), pa(0x0020_1000));
        assert_eq!(heap.index_of(pa(0x0020_7FFF)), Some(7));
        assert_eq!(heap.index_of(pa(0x0020_8000)), None);
        assert_eq!(heap.index_of(pa(0x001F_FFFF)), None);
    }

    #[test]
    fn rejects_misaligned_bounds() {
        assert!(matches!(
            HeapRegion::new(pa(0x0020_0010), pa(0x0020_8000)),
            Err(HeapError::Misaligned { .. })
        ));
        assert!(matches!(
            HeapRegion::new(pa(0x0020_0000), pa(0x0020_8001)),
            Err(HeapError::Misaligned { .. })
        ));
    }

    #[test]
    fn rejects_empty_and_inverted_ranges() {
        assert!(matches!(
            HeapRegion::new(pa(0x0020_0000), pa(0x0020_0000)),
            Err(HeapError::Empty { .. })
        ));
        assert!(matches!(
            HeapRegion::new(pa(0x0020_1000), pa(0x0020_0000)),
            Err(HeapError::Empty { .. })
        ));
    }

    #[test]
    fn bookkeeping_must_fit_in_one_frame() {
        let start = 0x0100_0000;
        assert!(HeapRegion::new(pa(start), pa(start + MAX_HEAP_FRAMES * FRAME_SIZE)).is_ok());
        assert_eq!(
            HeapRegion::new(pa(start), pa(start + (MAX_HEAP_FRAMES + 1) * FRAME_SIZE)),
            Err(HeapError::TooLarge {
                frames: MAX_HEAP_FRAMES + 1
            })
        );
    }
}
