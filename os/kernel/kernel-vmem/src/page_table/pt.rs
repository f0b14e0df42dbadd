//! # Page Table (PT / L1)
//!
//! - [`PtIndex`]: index type for VA bits `[21:12]`.
//! - [`PtEntry`]: a PT entry (PTE) mapping exactly one 4 KiB page.
//! - [`PageTable`]: a 4 KiB-aligned array of 1024 PTEs.
//!
//! After modifying active mappings, the caller must perform any required
//! TLB maintenance.

use crate::PageEntryBits;
use crate::info::ENTRIES_PER_TABLE;
use kernel_memory_addresses::{PhysicalPage, Size4K, VirtualAddress};

/// Index into the Page Table (derived from VA bits `[21:12]`).
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PtIndex(u16);

/// A single Page Table entry (PTE).
#[doc(alias = "PTE")]
#[repr(transparent)]
#[derive(Copy, Clone)]
pub struct PtEntry(PageEntryBits);

/// The Page Table (L1): 1024 entries, 4 KiB-aligned.
#[doc(alias = "PT")]
#[repr(C, align(4096))]
pub struct PageTable {
    entries: [PtEntry; ENTRIES_PER_TABLE],
}

impl PtIndex {
    /// Build an index from a virtual address (extracts bits `[21:12]`).
    #[inline]
    #[must_use]
    pub const fn from(va: VirtualAddress) -> Self {
        Self(((va.as_u32() >> 12) & 0x3FF) as u16)
    }

    /// Construct from a raw `u16`.
    ///
    /// ### Debug assertions
    /// - Asserts `v < 1024` in debug builds.
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

impl PtEntry {
    /// Create a zero (non-present) entry.
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

    /// If present, return the mapped 4 KiB physical page.
    #[inline]
    #[must_use]
    pub const fn page_4k(self) -> Option<PhysicalPage<Size4K>> {
        if self.is_present() {
            Some(self.0.frame())
        } else {
            None
        }
    }

    /// Create a 4 KiB leaf PTE.
    ///
    /// Sets `present=1`, clears `PAT` and writes the frame number.
    #[inline]
    #[must_use]
    pub const fn make_4k(page: PhysicalPage<Size4K>, mut flags: PageEntryBits) -> Self {
        flags.set_large_page(false);
        flags.set_present(true);
        flags.set_frame(page);
        Self(flags)
    }

    /// Return the raw 32-bit value (flags + address).
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0.into_bits()
    }
}

impl PageTable {
    /// Mark every entry non-present.
    #[inline]
    pub fn zero(&mut self) {
        self.entries.fill(PtEntry::zero());
    }

    #[inline]
    #[must_use]
    pub const fn get(&self, i: PtIndex) -> PtEntry {
        self.entries[i.as_usize()]
    }

    #[inline]
    pub const fn set(&mut self, i: PtIndex, e: PtEntry) {
        self.entries[i.as_usize()] = e;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::PhysMapperExt;
    use crate::testing::PhysArena;

    #[test]
    fn pte_4k_leaf() {
        let page = PhysicalPage::<Size4K>::from_frame_number(0x5555);
        let e = PtEntry::make_4k(page, PageEntryBits::new_kernel_rw());
        assert_eq!(e.page_4k(), Some(page));
        assert_eq!(e.raw(), 0x0555_5003);
        assert!(e.flags().writable());
        assert!(!e.flags().user_access());
    }

    #[test]
    fn index_uses_bits_21_to_12() {
        let va = VirtualAddress::new(0x0040_3ABC);
        assert_eq!(PtIndex::from(va), PtIndex::new(3));
        let va = VirtualAddress::new(0x003F_F000);
        assert_eq!(PtIndex::from(va), PtIndex::new(1023));
    }

    #[test]
    fn zero_clears_a_dirty_table() {
        let arena = PhysArena::filled(0x0010_0000, 1, 0xFF);
        let page = PhysicalPage::from_addr(arena.base());
        let pt = unsafe { arena.table_mut(page) };
        assert!(pt.get(PtIndex::new(7)).is_present());

        pt.zero();
        assert!(PtIndex::all().all(|i| !pt.get(i).is_present()));
        assert_eq!(PtIndex::all().count(), ENTRIES_PER_TABLE);
    }
}
