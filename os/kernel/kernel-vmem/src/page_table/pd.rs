//! # Page Directory (PD / L2)
//!
//! The root of a 32-bit address space. Each present entry points to a
//! [`PageTable`](super::PageTable) covering 4 MiB.

use crate::PageEntryBits;
use crate::info::ENTRIES_PER_TABLE;
use kernel_memory_addresses::{PhysicalPage, Size4K, VirtualAddress};

/// Index into the Page Directory (derived from VA bits `[31:22]`).
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PdIndex(u16);

/// A single Page Directory entry (PDE).
#[doc(alias = "PDE")]
#[repr(transparent)]
#[derive(Copy, Clone)]
pub struct PdEntry(PageEntryBits);

/// The Page Directory: 1024 entries, 4 KiB-aligned.
#[doc(alias = "PD")]
#[repr(C, align(4096))]
pub struct PageDirectory {
    entries: [PdEntry; ENTRIES_PER_TABLE],
}

impl PdIndex {
    /// Build an index from a virtual address (extracts bits `[31:22]`).
    #[inline]
    #[must_use]
    pub const fn from(va: VirtualAddress) -> Self {
        Self((va.as_u32() >> 22) as u16)
    }

    #[inline]
    #[must_use]
    pub const fn new(v: u16) -> Self {
        debug_assert!((v as usize) < ENTRIES_PER_TABLE);
        Self(v)
    }

    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// All indices in ascending order.
    #[allow(clippy::cast_possible_truncation)]
    pub fn all() -> impl Iterator<Item = Self> {
        (0..ENTRIES_PER_TABLE as u16).map(Self)
    }
}

impl PdEntry {
    #[inline]
    #[must_use]
    pub const fn zero() -> Self {
        Self(PageEntryBits::new())
    }

    #[inline]
    #[must_use]
    pub const fn is_present(self) -> bool {
        self.0.present()
    }

    #[inline]
    #[must_use]
    pub const fn flags(self) -> PageEntryBits {
        self.0
    }

    /// Point this entry at a page table (`PS=0`).
    #[inline]
    #[must_use]
    pub const fn make_table(table: PhysicalPage<Size4K>, mut flags: PageEntryBits) -> Self {
        flags.set_large_page(false);
        flags.set_present(true);
        flags.set_frame(table);
        Self(flags)
    }

    /// If present, the frame of the referenced page table.
    #[inline]
    #[must_use]
    pub const fn table(self) -> Option<PhysicalPage<Size4K>> {
        if self.is_present() && !self.0.large_page() {
            Some(self.0.frame())
        } else {
            None
        }
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0.into_bits()
    }
}

impl PageDirectory {
    /// Mark every entry non-present.
    #[inline]
    pub fn zero(&mut self) {
        self.entries.fill(PdEntry::zero());
    }

    #[inline]
    #[must_use]
    pub const fn get(&self, i: PdIndex) -> PdEntry {
        self.entries[i.as_usize()]
    }

    #[inline]
    pub const fn set(&mut self, i: PdIndex, e: PdEntry) {
        self.entries[i.as_usize()] = e;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pde_points_to_table() {
        let table = PhysicalPage::<Size4K>::from_frame_number(0x101);
        let e = PdEntry::make_table(table, PageEntryBits::new_kernel_rw());
        assert_eq!(e.table(), Some(table));
        assert_eq!(e.raw(), 0x0010_1003);
    }

    #[test]
    fn large_page_entry_is_not_a_table() {
        let mut bits = PageEntryBits::new_kernel_rw();
        bits.set_large_page(true);
        assert!(PdEntry(bits).table().is_none());
        assert!(PdEntry::zero().table().is_none());
    }

    #[test]
    fn index_uses_top_ten_bits() {
        assert_eq!(PdIndex::from(VirtualAddress::new(0x003F_FFFF)), PdIndex::new(0));
        assert_eq!(PdIndex::from(VirtualAddress::new(0x0040_0000)), PdIndex::new(1));
        assert_eq!(PdIndex::from(VirtualAddress::new(0xFFFF_FFFF)), PdIndex::new(1023));
    }
}
