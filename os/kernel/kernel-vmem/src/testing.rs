//! Host-side stand-ins for physical memory.
//!
//! [`PhysArena`] owns a 4 KiB-aligned buffer and pretends it lives at a
//! chosen physical base address; any physical address outside of it is a
//! test bug and panics. [`BumpFrames`] hands out the arena's frames in
//! order and never takes them back.

use crate::{FrameAlloc, PhysMapper};
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::UnsafeCell;
use kernel_memory_addresses::{PhysicalAddress, PhysicalPage, Size4K};

const FRAME: usize = 4096;

#[repr(C, align(4096))]
struct Frame([u8; FRAME]);

/// A buffer of frames posing as physical memory at `base`.
pub struct PhysArena {
    frames: Box<[UnsafeCell<Frame>]>,
    base: u32,
}

impl PhysArena {
    /// `frames` zeroed frames starting at physical address `base`.
    #[must_use]
    pub fn new(base: u32, frames: usize) -> Self {
        Self::filled(base, frames, 0)
    }

    /// `frames` frames starting at `base`, every byte set to `byte`.
    ///
    /// # Panics
    /// If `base` is not frame aligned.
    #[must_use]
    pub fn filled(base: u32, frames: usize, byte: u8) -> Self {
        assert_eq!(base as usize % FRAME, 0, "arena base must be frame aligned");
        let frames = (0..frames)
            .map(|_| UnsafeCell::new(Frame([byte; FRAME])))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { frames, base }
    }

    #[must_use]
    pub const fn base(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.base)
    }

    /// One past the last byte backed by the arena.
    ///
    /// # Panics
    /// If the arena would extend past 4 GiB.
    #[must_use]
    pub fn end(&self) -> PhysicalAddress {
        let len = u32::try_from(self.len()).expect("arena too large");
        PhysicalAddress::new(self.base + len)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len() * FRAME
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Copy `bytes` into the arena at `pa`.
    pub fn write(&self, pa: PhysicalAddress, bytes: &[u8]) {
        let offset = self.offset_of(pa, bytes.len());
        // SAFETY: bounds checked; the storage is interior mutable.
        unsafe {
            core::ptr::copy_nonoverlapping(bytes.as_ptr(), self.storage().add(offset), bytes.len());
        }
    }

    /// Copy `len` bytes out of the arena at `pa`.
    #[must_use]
    pub fn read(&self, pa: PhysicalAddress, len: usize) -> Vec<u8> {
        let offset = self.offset_of(pa, len);
        // SAFETY: bounds checked.
        unsafe { core::slice::from_raw_parts(self.storage().add(offset), len).to_vec() }
    }

    /// Fill the frame at `page` with `byte`.
    pub fn fill_frame(&self, page: PhysicalPage<Size4K>, byte: u8) {
        self.write(page.base(), &[byte; FRAME]);
    }

    fn storage(&self) -> *mut u8 {
        UnsafeCell::raw_get(self.frames.as_ptr()).cast::<u8>()
    }

    fn offset_of(&self, pa: PhysicalAddress, len: usize) -> usize {
        let addr = pa.as_usize();
        let base = self.base as usize;
        assert!(
            addr >= base && addr + len <= base + self.len(),
            "physical range {pa}+{len:#x} is outside the arena"
        );
        addr - base
    }
}

impl PhysMapper for PhysArena {
    fn phys_to_ptr(&self, pa: PhysicalAddress) -> *mut u8 {
        let offset = self.offset_of(pa, 0);
        // SAFETY: offset is within (or one past) the allocation.
        unsafe { self.storage().add(offset) }
    }
}

/// Hands out the frames of a [`PhysArena`] in ascending order.
pub struct BumpFrames {
    next: u32,
    end: u32,
}

impl BumpFrames {
    #[must_use]
    pub fn new(arena: &PhysArena) -> Self {
        Self {
            next: arena.base().as_u32(),
            end: arena.end().as_u32(),
        }
    }
}

impl FrameAlloc for BumpFrames {
    #[allow(clippy::cast_possible_truncation)]
    fn alloc_4k(&mut self) -> Option<PhysicalPage<Size4K>> {
        if self.next >= self.end {
            return None;
        }
        let page = PhysicalPage::from_addr(PhysicalAddress::new(self.next));
        self.next += FRAME as u32;
        Some(page)
    }
}
