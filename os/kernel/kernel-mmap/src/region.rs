use core::fmt;
use kernel_info::boot::MULTIBOOT_MEMORY_AVAILABLE;

/// Type tag of a memory map record.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MemoryKind {
    /// Usable RAM.
    Available,
    Reserved,
    /// ACPI tables; usable once they have been parsed.
    AcpiReclaimable,
    /// Must be preserved across sleep states.
    AcpiNvs,
    /// Defective RAM.
    BadMemory,
    Other(u32),
}

impl MemoryKind {
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            MULTIBOOT_MEMORY_AVAILABLE => Self::Available,
            2 => Self::Reserved,
            3 => Self::AcpiReclaimable,
            4 => Self::AcpiNvs,
            5 => Self::BadMemory,
            other => Self::Other(other),
        }
    }

    #[must_use]
    pub const fn as_raw(self) -> u32 {
        match self {
            Self::Available => MULTIBOOT_MEMORY_AVAILABLE,
            Self::Reserved => 2,
            Self::AcpiReclaimable => 3,
            Self::AcpiNvs => 4,
            Self::BadMemory => 5,
            Self::Other(other) => other,
        }
    }
}

/// A physical memory range reported by the bootloader.
///
/// Base and length are 64-bit even on a 32-bit kernel; the bootloader
/// reports RAM above 4 GiB as well.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MemoryRegion {
    pub base: u64,
    pub length: u64,
    pub kind: MemoryKind,
}

impl MemoryRegion {
    /// Exclusive end address, or `None` if `base + length` overflows.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> Option<u64> {
        self.base.checked_add(self.length)
    }

    /// Whether `[start, end)` lies completely inside this region.
    #[inline]
    #[must_use]
    pub const fn contains_range(&self, start: u64, end: u64) -> bool {
        match self.end() {
            Some(region_end) => start >= self.base && end <= region_end && start <= end,
            None => false,
        }
    }
}

impl fmt::Display for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:010X}..0x{:010X} ({} KiB, {:?})",
            self.base,
            self.base.saturating_add(self.length),
            self.length / 1024,
            self.kind
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_tags_roundtrip() {
        for raw in 0..8 {
            assert_eq!(MemoryKind::from_raw(raw).as_raw(), raw);
        }
        assert_eq!(MemoryKind::from_raw(1), MemoryKind::Available);
        assert_eq!(MemoryKind::from_raw(0xF00D), MemoryKind::Other(0xF00D));
    }

    #[test]
    fn range_containment_is_half_open() {
        let region = MemoryRegion {
            base: 0x10_0000,
            length: 0x10_0000,
            kind: MemoryKind::Available,
        };
        assert!(region.contains_range(0x10_0000, 0x20_0000));
        assert!(region.contains_range(0x18_0000, 0x18_1000));
        assert!(!region.contains_range(0x0F_F000, 0x10_1000));
        assert!(!region.contains_range(0x1F_F000, 0x20_1000));
    }

    #[test]
    fn overflowing_region_has_no_end() {
        let region = MemoryRegion {
            base: u64::MAX - 10,
            length: 11,
            kind: MemoryKind::Available,
        };
        assert_eq!(region.end(), None);
        assert!(!region.contains_range(u64::MAX - 10, u64::MAX - 5));
    }
}
