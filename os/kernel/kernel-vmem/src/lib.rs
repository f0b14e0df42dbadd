//! # Two-Level Paging for 32-bit x86
//!
//! Typed page directories and page tables for non-PAE paging, plus the
//! bootstrap that builds the first address space.
//!
//! - [`PageEntryBits`]: the 32-bit entry layout shared by both levels.
//! - [`PageDirectory`] / [`PageTable`]: 1024-entry, 4 KiB-aligned arrays.
//! - [`AddressSpace`]: identity maps the low 4 MiB with frames taken from a
//!   [`FrameAlloc`], then switches paging on through a [`PagingSwitch`].
//!
//! Physical frames are reached through a [`PhysMapper`]. Before paging is
//! enabled (and inside the identity window afterwards) that is a plain
//! cast; host tests substitute a buffer posing as physical memory
//! (`testing::PhysArena`, behind the `test-utils` feature).
//!
//! ```text
//!  31          22 21          12 11           0
//! ┌──────────────┬──────────────┬──────────────┐
//! │   PD index   │   PT index   │    offset    │
//! └──────────────┴──────────────┴──────────────┘
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code, clippy::inline_always)]

#[cfg(any(test, feature = "test-utils"))]
extern crate alloc;

pub mod address_space;
mod page_entry_bits;
pub mod page_table;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

#[cfg(target_arch = "x86")]
pub use crate::address_space::ControlRegisters;
pub use crate::address_space::{AddressSpace, IdentityMapError, PagingSwitch, TableKind};
pub use crate::page_entry_bits::PageEntryBits;
pub use crate::page_table::{PageDirectory, PageTable, PdEntry, PdIndex, PtEntry, PtIndex};

/// Re-export constants as info module.
pub use kernel_info::memory as info;

use kernel_memory_addresses::{PhysicalAddress, PhysicalPage, Size4K};

/// Source of **physical** 4 KiB frames for paging structures.
///
/// Returned frames **must** be 4 KiB aligned. Returns `None` on
/// out-of-memory.
pub trait FrameAlloc {
    fn alloc_4k(&mut self) -> Option<PhysicalPage<Size4K>>;
}

/// Converts physical addresses to pointers usable in the current address
/// space.
///
/// In the kernel this is the identity: paging is either off or maps the low
/// window 1:1. Tests translate into a host buffer instead.
pub trait PhysMapper {
    /// Pointer to the byte at physical address `pa`.
    fn phys_to_ptr(&self, pa: PhysicalAddress) -> *mut u8;

    /// Borrow the memory at `pa` as a `T`.
    ///
    /// # Safety
    /// - `pa` must be suitably aligned for `T` and backed by memory valid
    ///   for `size_of::<T>()` bytes.
    /// - The lifetime `'a` is unchecked; no other reference to the same
    ///   memory may be alive while the result is.
    #[inline]
    #[allow(clippy::cast_ptr_alignment)]
    unsafe fn phys_to_mut<'a, T>(&self, pa: PhysicalAddress) -> &'a mut T {
        unsafe { &mut *self.phys_to_ptr(pa).cast::<T>() }
    }

    /// Borrow `len` bytes starting at `pa`.
    ///
    /// # Safety
    /// The range must be backed by readable memory and must not be mutated
    /// while the slice is alive.
    #[inline]
    unsafe fn phys_to_bytes<'a>(&self, pa: PhysicalAddress, len: usize) -> &'a [u8] {
        unsafe { core::slice::from_raw_parts(self.phys_to_ptr(pa), len) }
    }

    /// Mutably borrow `len` bytes starting at `pa`.
    ///
    /// # Safety
    /// The range must be backed by writable memory with no other live
    /// reference into it.
    #[inline]
    unsafe fn phys_to_bytes_mut<'a>(&self, pa: PhysicalAddress, len: usize) -> &'a mut [u8] {
        unsafe { core::slice::from_raw_parts_mut(self.phys_to_ptr(pa), len) }
    }
}

impl<M: PhysMapper + ?Sized> PhysMapper for &M {
    #[inline]
    fn phys_to_ptr(&self, pa: PhysicalAddress) -> *mut u8 {
        (**self).phys_to_ptr(pa)
    }
}

/// Typed access to paging structures held in physical frames.
pub trait PhysMapperExt: PhysMapper {
    /// Borrow the [`PageDirectory`] held in `page`.
    ///
    /// # Safety
    /// `page` must be a frame reserved for a directory with no other live
    /// reference into it.
    #[inline]
    unsafe fn directory_mut<'a>(&self, page: PhysicalPage<Size4K>) -> &'a mut PageDirectory {
        unsafe { self.phys_to_mut::<PageDirectory>(page.base()) }
    }

    /// Borrow the [`PageTable`] held in `page`.
    ///
    /// # Safety
    /// `page` must be a frame reserved for a table with no other live
    /// reference into it.
    #[inline]
    unsafe fn table_mut<'a>(&self, page: PhysicalPage<Size4K>) -> &'a mut PageTable {
        unsafe { self.phys_to_mut::<PageTable>(page.base()) }
    }
}

impl<T: PhysMapper + ?Sized> PhysMapperExt for T {}
