//! First-fit frame allocator with one status byte per frame.
//!
//! The bookkeeping table lives in frame 0 of the heap itself, which is why
//! that frame is permanently [`FrameState::Reserved`]. A `Free → Taken`
//! transition only happens in [`FrameAllocator::allocate`], `Taken → Free`
//! only in [`FrameAllocator::free`].

use crate::heap_region::HeapRegion;
use kernel_info::memory::FRAME_SIZE;
use kernel_memory_addresses::{PhysicalAddress, PhysicalPage, Size4K};
use kernel_vmem::{FrameAlloc, PhysMapper};
use log::{debug, info, trace};

/// Status of one frame, as stored in the bookkeeping table.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FrameState {
    Free = 0,
    Taken = 1,
    Reserved = 2,
}

impl FrameState {
    /// Decode a table byte; anything unknown is treated as reserved.
    #[inline]
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            0 => Self::Free,
            1 => Self::Taken,
            _ => Self::Reserved,
        }
    }
}

/// Why a call to [`FrameAllocator::free`] did nothing.
///
/// None of these are fatal; the bookkeeping is left untouched.
#[derive(Debug, thiserror::Error, Copy, Clone, Eq, PartialEq)]
pub enum FreeRejected {
    #[error("{0} is not frame aligned")]
    Misaligned(PhysicalAddress),
    #[error("{0} is outside the heap")]
    OutOfRange(PhysicalAddress),
    #[error("frame {0} is already free")]
    AlreadyFree(PhysicalAddress),
    #[error("frame {0} is reserved")]
    Reserved(PhysicalAddress),
}

/// Physical frame allocator over a [`HeapRegion`].
///
/// All memory access goes through the [`PhysMapper`] `M`, so the same code
/// runs on the identity-mapped kernel heap and on a host test buffer.
pub struct FrameAllocator<M: PhysMapper> {
    mapper: M,
    heap: HeapRegion,
}

impl<M: PhysMapper> FrameAllocator<M> {
    /// Take ownership of `heap`: zero it entirely and reserve frame 0.
    ///
    /// # Safety
    /// The whole region must be RAM reachable through `mapper`, unused by
    /// anything else for as long as the allocator (or any frame it hands
    /// out) lives. Creating two allocators over overlapping regions is
    /// undefined behavior.
    pub unsafe fn initialize(mapper: M, heap: HeapRegion) -> Self {
        // SAFETY: the caller hands the whole region to us.
        unsafe { mapper.phys_to_bytes_mut(heap.start(), heap.len_bytes()) }.fill(0);

        let mut this = Self { mapper, heap };
        this.table_mut()[0] = FrameState::Reserved as u8;

        info!(
            "Frame heap {}..{}: {} frames, {} usable",
            heap.start(),
            heap.end(),
            heap.frame_count(),
            heap.usable_frames()
        );
        this
    }

    #[inline]
    #[must_use]
    pub const fn heap(&self) -> HeapRegion {
        self.heap
    }

    /// The mapper the allocator reaches its heap through.
    #[inline]
    #[must_use]
    pub const fn mapper(&self) -> &M {
        &self.mapper
    }

    #[inline]
    #[must_use]
    pub const fn heap_start(&self) -> PhysicalAddress {
        self.heap.start()
    }

    #[inline]
    #[must_use]
    pub const fn heap_end(&self) -> PhysicalAddress {
        self.heap.end()
    }

    #[inline]
    #[must_use]
    pub const fn total_frames(&self) -> usize {
        self.heap.frame_count()
    }

    #[inline]
    #[must_use]
    pub const fn usable_frames(&self) -> usize {
        self.heap.usable_frames()
    }

    /// Number of frames currently [`FrameState::Free`].
    #[must_use]
    pub fn free_frames(&self) -> usize {
        self.table()
            .iter()
            .filter(|&&b| FrameState::from_byte(b) == FrameState::Free)
            .count()
    }

    /// State of the frame containing `addr`, if it belongs to the heap.
    #[must_use]
    pub fn state_of(&self, addr: PhysicalAddress) -> Option<FrameState> {
        let index = self.heap.index_of(addr)?;
        Some(FrameState::from_byte(self.table()[index]))
    }

    /// Claim `count` contiguous free frames, first fit from frame 1.
    ///
    /// Every byte of the returned run is zero. Returns `None` for
    /// `count == 0` and when no run of the requested length is free; the
    /// allocator never panics on exhaustion.
    pub fn allocate(&mut self, count: usize) -> Option<PhysicalPage<Size4K>> {
        if count == 0 {
            return None;
        }

        let Some(first) = self.find_free_run(count) else {
            trace!("No run of {count} free frames left");
            return None;
        };

        self.table_mut()[first..first + count].fill(FrameState::Taken as u8);

        let page = self.heap.frame(first);
        // SAFETY: the run was free, so nobody else references it; it lies
        // past frame 0 and never overlaps the table.
        unsafe {
            self.mapper
                .phys_to_bytes_mut(page.base(), count * FRAME_SIZE as usize)
        }
        .fill(0);

        trace!("Allocated {count} frame(s) at {page}");
        Some(page)
    }

    /// Return the frame at `addr` to the pool.
    ///
    /// Only an aligned address of a [`FrameState::Taken`] frame inside the
    /// heap is freed. Frames of a multi-frame run are freed one by one.
    ///
    /// # Errors
    /// The reason the call was ignored; bookkeeping is unchanged in that case.
    pub fn free(&mut self, addr: PhysicalAddress) -> Result<(), FreeRejected> {
        let outcome = self.try_free(addr);
        match outcome {
            Ok(()) => trace!("Freed frame {addr}"),
            Err(reason) => debug!("Ignored free: {reason}"),
        }
        outcome
    }

    fn try_free(&mut self, addr: PhysicalAddress) -> Result<(), FreeRejected> {
        if !addr.is_aligned::<Size4K>() {
            return Err(FreeRejected::Misaligned(addr));
        }
        let index = self
            .heap
            .index_of(addr)
            .ok_or(FreeRejected::OutOfRange(addr))?;

        let entry = &mut self.table_mut()[index];
        match FrameState::from_byte(*entry) {
            FrameState::Taken => {
                *entry = FrameState::Free as u8;
                Ok(())
            }
            FrameState::Free => Err(FreeRejected::AlreadyFree(addr)),
            FrameState::Reserved => Err(FreeRejected::Reserved(addr)),
        }
    }

    fn find_free_run(&self, count: usize) -> Option<usize> {
        let table = self.table();
        let mut run_start = 1;
        let mut run_len = 0;
        for (index, &byte) in table.iter().enumerate().skip(1) {
            if FrameState::from_byte(byte) != FrameState::Free {
                run_len = 0;
                continue;
            }
            if run_len == 0 {
                run_start = index;
            }
            run_len += 1;
            if run_len == count {
                return Some(run_start);
            }
        }
        None
    }

    fn table(&self) -> &[u8] {
        // SAFETY: frame 0 belongs to the allocator; the borrow is tied to `self`.
        unsafe {
            self.mapper
                .phys_to_bytes(self.heap.start(), self.heap.frame_count())
        }
    }

    fn table_mut(&mut self) -> &mut [u8] {
        // SAFETY: as above, exclusive through `&mut self`.
        unsafe {
            self.mapper
                .phys_to_bytes_mut(self.heap.start(), self.heap.frame_count())
        }
    }
}

impl<M: PhysMapper> FrameAlloc for FrameAllocator<M> {
    fn alloc_4k(&mut self) -> Option<PhysicalPage<Size4K>> {
        self.allocate(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_vmem::testing::PhysArena;

    const BASE: u32 = 0x0020_0000;

    fn allocator(arena: &PhysArena) -> FrameAllocator<&PhysArena> {
        let heap = HeapRegion::new(arena.base(), arena.end()).unwrap();
        unsafe { FrameAllocator::initialize(arena, heap) }
    }

    #[test]
    fn initialize_clears_heap_and_reserves_table() {
        let arena = PhysArena::filled(BASE, 4, 0xCC);
        let alloc = allocator(&arena);

        assert_eq!(alloc.state_of(arena.base()), Some(FrameState::Reserved));
        assert_eq!(alloc.free_frames(), 3);
        assert!(arena.read(arena.base().checked_add(4).unwrap(), 3 * 4096 - 4).iter().all(|&b| b == 0));
    }

    #[test]
    fn first_allocation_is_frame_one() {
        let arena = PhysArena::new(BASE, 4);
        let mut alloc = allocator(&arena);

        let page = alloc.allocate(1).unwrap();
        assert_eq!(page.base(), PhysicalAddress::new(BASE + 0x1000));
        assert_eq!(alloc.state_of(page.base()), Some(FrameState::Taken));
    }

    #[test]
    fn zero_count_is_rejected() {
        let arena = PhysArena::new(BASE, 4);
        let mut alloc = allocator(&arena);
        assert_eq!(alloc.allocate(0), None);
        assert_eq!(alloc.free_frames(), 3);
    }

    #[test]
    fn free_reasons_are_distinguished() {
        let arena = PhysArena::new(BASE, 4);
        let mut alloc = allocator(&arena);
        let page = alloc.allocate(1).unwrap();

        let misaligned = page.base().checked_add(8).unwrap();
        assert_eq!(alloc.free(misaligned), Err(FreeRejected::Misaligned(misaligned)));
        assert_eq!(alloc.free(arena.base()), Err(FreeRejected::Reserved(arena.base())));
        assert_eq!(alloc.free(arena.end()), Err(FreeRejected::OutOfRange(arena.end())));
        let below = PhysicalAddress::new(BASE - 0x1000);
        assert_eq!(alloc.free(below), Err(FreeRejected::OutOfRange(below)));

        let untouched = alloc.heap().frame(2).base();
        assert_eq!(alloc.free(untouched), Err(FreeRejected::AlreadyFree(untouched)));

        assert_eq!(alloc.free(page.base()), Ok(()));
        assert_eq!(alloc.free(page.base()), Err(FreeRejected::AlreadyFree(page.base())));
    }

    #[test]
    fn unknown_table_bytes_decode_as_reserved() {
        assert_eq!(FrameState::from_byte(0), FrameState::Free);
        assert_eq!(FrameState::from_byte(1), FrameState::Taken);
        assert_eq!(FrameState::from_byte(2), FrameState::Reserved);
        assert_eq!(FrameState::from_byte(0x7F), FrameState::Reserved);
    }
}
