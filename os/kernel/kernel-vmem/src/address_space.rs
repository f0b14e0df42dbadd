//! # Bootstrap Address Space
//!
//! Builds the first address space of the kernel: a page directory whose
//! entry 0 points to a single page table mapping virtual frame `i` to
//! physical frame `i` for `i in 0..1024`. The low 4 MiB stay reachable at
//! the same addresses once paging is on; everything above is unmapped.
//!
//! ## Lifecycle
//!
//! 1. [`AddressSpace::build_identity_map`] takes two frames from a
//!    [`FrameAlloc`], zeroes them, checks they lie inside the identity
//!    window and fills them in.
//! 2. [`AddressSpace::activate`] hands the directory to a [`PagingSwitch`],
//!    which loads CR3 and sets `CR0.PG`. There is no way back.
//!
//! The frames backing the directory and the table are never freed.

use crate::info::{FRAME_SIZE, IDENTITY_MAP_BYTES};
use crate::page_table::{PdEntry, PdIndex, PtEntry, PtIndex};
use crate::{FrameAlloc, PageEntryBits, PhysMapper, PhysMapperExt};
use kernel_memory_addresses::{PhysicalAddress, PhysicalPage, Size4K, VirtualAddress};
use log::debug;

/// Which paging structure a bootstrap error refers to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TableKind {
    Directory,
    Table,
}

#[derive(Debug, thiserror::Error, Eq, PartialEq)]
pub enum IdentityMapError {
    #[error("out of memory allocating the page {0:?}")]
    OutOfMemory(TableKind),
    #[error("page {kind:?} frame {frame} lies outside the identity window")]
    OutsideIdentityWindow {
        kind: TableKind,
        frame: PhysicalPage<Size4K>,
    },
}

/// Turns paging on for a given page directory.
pub trait PagingSwitch {
    /// # Safety
    /// The directory must map the currently executing code, the stack and
    /// every structure used afterwards, at their current addresses.
    unsafe fn enable_paging(&mut self, directory: PhysicalPage<Size4K>);
}

/// The hardware [`PagingSwitch`]: writes CR3, then sets `CR0.PG`.
#[cfg(target_arch = "x86")]
pub struct ControlRegisters;

#[cfg(target_arch = "x86")]
impl PagingSwitch for ControlRegisters {
    unsafe fn enable_paging(&mut self, directory: PhysicalPage<Size4K>) {
        use kernel_registers::{Cr0, Cr3, LoadRegisterUnsafe, StoreRegisterUnsafe};

        unsafe {
            Cr3::from_directory(directory, false, false).store_unsafe();
            let cr0 = Cr0::load_unsafe();
            cr0.with_pg_paging(true).store_unsafe();
        }
    }
}

/// Handle to the bootstrap address space.
#[derive(Debug)]
pub struct AddressSpace {
    directory: PhysicalPage<Size4K>,
    table: PhysicalPage<Size4K>,
}

impl AddressSpace {
    /// Build the identity map of the first 4 MiB.
    ///
    /// Frames are zeroed here even if the allocator already returns cleared
    /// memory.
    ///
    /// # Errors
    /// - [`IdentityMapError::OutOfMemory`] if the allocator is exhausted.
    /// - [`IdentityMapError::OutsideIdentityWindow`] if either frame would
    ///   be unreachable once paging is on.
    pub fn build_identity_map<A, M>(alloc: &mut A, mapper: &M) -> Result<Self, IdentityMapError>
    where
        A: FrameAlloc + ?Sized,
        M: PhysMapper + ?Sized,
    {
        let directory = Self::take_frame(alloc, TableKind::Directory)?;
        // SAFETY: the frame was just handed out by the allocator.
        let pd = unsafe { mapper.directory_mut(directory) };
        pd.zero();

        let table = Self::take_frame(alloc, TableKind::Table)?;
        // SAFETY: as above; distinct from the directory frame.
        let pt = unsafe { mapper.table_mut(table) };
        pt.zero();

        let flags = PageEntryBits::new_kernel_rw();
        for i in PtIndex::all() {
            #[allow(clippy::cast_possible_truncation)]
            let frame = PhysicalPage::<Size4K>::from_frame_number(i.as_usize() as u32);
            pt.set(i, PtEntry::make_4k(frame, flags));
        }
        pd.set(PdIndex::new(0), PdEntry::make_table(table, flags));

        debug!("Identity map built: directory {directory}, table {table}");
        Ok(Self { directory, table })
    }

    fn take_frame<A>(alloc: &mut A, kind: TableKind) -> Result<PhysicalPage<Size4K>, IdentityMapError>
    where
        A: FrameAlloc + ?Sized,
    {
        let frame = alloc
            .alloc_4k()
            .ok_or(IdentityMapError::OutOfMemory(kind))?;
        if frame.base().as_u32() > IDENTITY_MAP_BYTES - FRAME_SIZE {
            return Err(IdentityMapError::OutsideIdentityWindow { kind, frame });
        }
        Ok(frame)
    }

    /// Frame holding the page directory (the value for CR3).
    #[inline]
    #[must_use]
    pub const fn directory(&self) -> PhysicalPage<Size4K> {
        self.directory
    }

    /// Frame holding the single page table behind directory entry 0.
    #[inline]
    #[must_use]
    pub const fn table(&self) -> PhysicalPage<Size4K> {
        self.table
    }

    /// Switch paging on with this address space.
    ///
    /// # Safety
    /// Everything the kernel touches from here on (code, stack, the
    /// allocator's heap, these tables) must lie inside the identity window.
    pub unsafe fn activate<P: PagingSwitch + ?Sized>(&self, switch: &mut P) {
        unsafe { switch.enable_paging(self.directory) };
    }

    /// Translate `va` by walking the tables in software.
    pub fn translate<M: PhysMapper + ?Sized>(&self, mapper: &M, va: VirtualAddress) -> Option<PhysicalAddress> {
        // SAFETY: the directory frame belongs to this address space.
        let pd = unsafe { mapper.directory_mut(self.directory) };
        let table = pd.get(PdIndex::from(va)).table()?;
        // SAFETY: present, non-large directory entries point to page tables.
        let pt = unsafe { mapper.table_mut(table) };
        let page = pt.get(PtIndex::from(va)).page_4k()?;
        Some(page.join(va.offset::<Size4K>()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{BumpFrames, PhysArena};

    const ARENA_BASE: u32 = 0x0010_0000;

    #[test]
    fn directory_entry_zero_points_to_table() {
        let arena = PhysArena::new(ARENA_BASE, 4);
        let mut frames = BumpFrames::new(&arena);

        let space = AddressSpace::build_identity_map(&mut frames, &arena).unwrap();
        let pd = unsafe { arena.directory_mut(space.directory()) };
        let pde = pd.get(PdIndex::new(0));
        assert_eq!(pde.raw(), space.table().base().as_u32() | 0b11);
        assert_eq!(pde.table(), Some(space.table()));
    }

    #[test]
    fn every_table_entry_maps_its_own_frame() {
        let arena = PhysArena::new(ARENA_BASE, 4);
        let mut frames = BumpFrames::new(&arena);

        let space = AddressSpace::build_identity_map(&mut frames, &arena).unwrap();
        let pt = unsafe { arena.table_mut(space.table()) };
        for i in PtIndex::all() {
            let frame = u32::try_from(i.as_usize()).unwrap();
            let expected = (frame * FRAME_SIZE) | 0b11;
            assert_eq!(pt.get(i).raw(), expected, "entry {i:?}");
        }
    }

    #[test]
    fn other_directory_entries_are_zero_even_on_dirty_frames() {
        let arena = PhysArena::filled(ARENA_BASE, 4, 0xAA);
        let mut frames = BumpFrames::new(&arena);

        let space = AddressSpace::build_identity_map(&mut frames, &arena).unwrap();
        let pd = unsafe { arena.directory_mut(space.directory()) };
        assert!(PdIndex::all().skip(1).all(|i| pd.get(i).raw() == 0));
    }

    #[test]
    fn translate_is_identity_inside_window_only() {
        let arena = PhysArena::new(ARENA_BASE, 4);
        let mut frames = BumpFrames::new(&arena);
        let space = AddressSpace::build_identity_map(&mut frames, &arena).unwrap();

        for va in [0u32, 0x0000_0FFF, 0x000B_8000, ARENA_BASE + 0x123, 0x003F_FFFF] {
            assert_eq!(
                space.translate(&arena, VirtualAddress::new(va)),
                Some(PhysicalAddress::new(va))
            );
        }
        assert_eq!(space.translate(&arena, VirtualAddress::new(0x0040_0000)), None);
        assert_eq!(space.translate(&arena, VirtualAddress::new(0xC000_0000)), None);
    }

    #[test]
    fn exhausted_allocator_is_reported() {
        let arena = PhysArena::new(ARENA_BASE, 1);
        let mut frames = BumpFrames::new(&arena);

        let err = AddressSpace::build_identity_map(&mut frames, &arena).unwrap_err();
        assert_eq!(err, IdentityMapError::OutOfMemory(TableKind::Table));
    }

    #[test]
    fn frames_above_window_are_rejected() {
        let arena = PhysArena::new(0x0040_0000, 2);
        let mut frames = BumpFrames::new(&arena);

        let err = AddressSpace::build_identity_map(&mut frames, &arena).unwrap_err();
        assert_eq!(
            err,
            IdentityMapError::OutsideIdentityWindow {
                kind: TableKind::Directory,
                frame: PhysicalPage::from_frame_number(0x400),
            }
        );
    }

    #[test]
    fn table_frame_above_window_is_rejected() {
        let arena = PhysArena::new(IDENTITY_MAP_BYTES - FRAME_SIZE, 2);
        let mut frames = BumpFrames::new(&arena);

        let err = AddressSpace::build_identity_map(&mut frames, &arena).unwrap_err();
        assert_eq!(
            err,
            IdentityMapError::OutsideIdentityWindow {
                kind: TableKind::Table,
                frame: PhysicalPage::from_frame_number(0x400),
            }
        );
    }

    #[test]
    fn last_frame_below_window_is_accepted() {
        let arena = PhysArena::new(IDENTITY_MAP_BYTES - 2 * FRAME_SIZE, 2);
        let mut frames = BumpFrames::new(&arena);
        assert!(AddressSpace::build_identity_map(&mut frames, &arena).is_ok());
    }

    struct RecordingSwitch(Option<PhysicalPage<Size4K>>);

    impl PagingSwitch for RecordingSwitch {
        unsafe fn enable_paging(&mut self, directory: PhysicalPage<Size4K>) {
            self.0 = Some(directory);
        }
    }

    #[test]
    fn activate_hands_over_the_directory() {
        let arena = PhysArena::new(ARENA_BASE, 2);
        let mut frames = BumpFrames::new(&arena);
        let space = AddressSpace::build_identity_map(&mut frames, &arena).unwrap();

        let mut switch = RecordingSwitch(None);
        unsafe { space.activate(&mut switch) };
        assert_eq!(switch.0, Some(space.directory()));
    }
}
