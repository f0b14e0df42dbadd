use kernel_info::boot::{
    BootContext, MULTIBOOT_BOOTLOADER_MAGIC, MULTIBOOT_INFO_MEM_MAP, MULTIBOOT2_BOOTLOADER_MAGIC,
};
use kernel_info::memory::MAX_MEMORY_REGIONS;
use kernel_memory_addresses::PhysicalAddress;
use kernel_mmap::{MemoryKind, MemoryMapError, MemoryRegion, read_memory_map};
use kernel_vmem::testing::PhysArena;

const ARENA_BASE: u32 = 0x0000_8000;
const INFO_AT: u32 = 0x0000_9000;
const MAP_AT: u32 = 0x0000_A000;

/// Raw memory map record, with room for trailing vendor bytes.
struct Entry {
    base: u64,
    length: u64,
    kind: u32,
    padding: usize,
}

const fn entry(base: u64, length: u64, kind: u32) -> Entry {
    Entry {
        base,
        length,
        kind,
        padding: 0,
    }
}

fn encode(entries: &[Entry]) -> Vec<u8> {
    let mut out = Vec::new();
    for e in entries {
        let size = 20 + u32::try_from(e.padding).unwrap();
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&e.base.to_le_bytes());
        out.extend_from_slice(&e.length.to_le_bytes());
        out.extend_from_slice(&e.kind.to_le_bytes());
        out.extend(std::iter::repeat_n(0xCC, e.padding));
    }
    out
}

fn write_info(arena: &PhysArena, flags: u32, mmap_length: u32, mmap_addr: u32) {
    let mut info = [0u8; 52];
    info[0..4].copy_from_slice(&flags.to_le_bytes());
    info[44..48].copy_from_slice(&mmap_length.to_le_bytes());
    info[48..52].copy_from_slice(&mmap_addr.to_le_bytes());
    arena.write(PhysicalAddress::new(INFO_AT), &info);
}

/// An arena holding a boot information block that points at `map`.
fn boot_arena(map: &[u8]) -> PhysArena {
    let arena = PhysArena::new(ARENA_BASE, 64);
    let length = u32::try_from(map.len()).unwrap();
    write_info(&arena, MULTIBOOT_INFO_MEM_MAP, length, MAP_AT);
    arena.write(PhysicalAddress::new(MAP_AT), map);
    arena
}

fn ctx() -> BootContext {
    BootContext::new(MULTIBOOT_BOOTLOADER_MAGIC, INFO_AT)
}

#[test]
fn usable_regions_are_kept_in_order() {
    let map = encode(&[
        entry(0x0000_0000, 0x0009_FC00, 1),
        entry(0x0009_FC00, 0x0000_0400, 2),
        entry(0x000F_0000, 0x0001_0000, 2),
        entry(0x0010_0000, 0x07EE_0000, 1),
        entry(0x07FE_0000, 0x0002_0000, 3),
        entry(0xFFFC_0000, 0x0004_0000, 2),
        entry(0x1_0000_0000, 0x4000_0000, 1),
    ]);
    let arena = boot_arena(&map);

    let regions = read_memory_map(&arena, &ctx()).unwrap();
    let got: Vec<MemoryRegion> = regions.iter().copied().collect();
    assert_eq!(
        got,
        [
            MemoryRegion {
                base: 0,
                length: 0x0009_FC00,
                kind: MemoryKind::Available
            },
            MemoryRegion {
                base: 0x0010_0000,
                length: 0x07EE_0000,
                kind: MemoryKind::Available
            },
            MemoryRegion {
                base: 0x1_0000_0000,
                length: 0x4000_0000,
                kind: MemoryKind::Available
            },
        ]
    );
    assert_eq!(regions.dropped(), 0);
}

#[test]
fn padded_entries_advance_by_their_declared_size() {
    let map = encode(&[
        Entry {
            padding: 8,
            ..entry(0x0000_0000, 0x0009_F000, 1)
        },
        entry(0x000F_0000, 0x0001_0000, 2),
        Entry {
            padding: 4,
            ..entry(0x0010_0000, 0x0010_0000, 1)
        },
    ]);
    let arena = boot_arena(&map);

    let regions = read_memory_map(&arena, &ctx()).unwrap();
    let bases: Vec<u64> = regions.iter().map(|r| r.base).collect();
    assert_eq!(bases, [0, 0x0010_0000]);
}

#[test]
fn map_without_usable_memory_is_empty_not_an_error() {
    let map = encode(&[entry(0, 0x1000, 2), entry(0x1000, 0x1000, 5)]);
    let arena = boot_arena(&map);

    let regions = read_memory_map(&arena, &ctx()).unwrap();
    assert!(regions.is_empty());
    assert_eq!(regions.total_bytes(), 0);
}

#[test]
fn trailing_bytes_after_last_entry_are_rejected() {
    let mut map = encode(&[entry(0x0010_0000, 0x0010_0000, 1)]);
    map.extend_from_slice(&[0, 0, 0]);
    let arena = boot_arena(&map);

    assert_eq!(
        read_memory_map(&arena, &ctx()).unwrap_err(),
        MemoryMapError::Truncated {
            offset: 24,
            remaining: 3
        }
    );
}

#[test]
fn entry_running_past_the_buffer_is_rejected() {
    let map = encode(&[
        entry(0x0000_0000, 0x0009_F000, 1),
        entry(0x0010_0000, 0x0010_0000, 1),
    ]);
    // Declare a buffer that ends in the middle of the second entry.
    let arena = boot_arena(&map);
    write_info(&arena, MULTIBOOT_INFO_MEM_MAP, 40, MAP_AT);

    assert_eq!(
        read_memory_map(&arena, &ctx()).unwrap_err(),
        MemoryMapError::Overshoot {
            offset: 24,
            next: 48,
            end: 40
        }
    );
}

#[test]
fn undersized_entry_is_rejected() {
    let mut map = encode(&[entry(0x0010_0000, 0x0010_0000, 1)]);
    map.extend_from_slice(&16u32.to_le_bytes());
    map.extend_from_slice(&[0; 16]);
    let arena = boot_arena(&map);

    assert_eq!(
        read_memory_map(&arena, &ctx()).unwrap_err(),
        MemoryMapError::EntryTooSmall {
            offset: 24,
            size: 16
        }
    );
}

#[test]
fn excess_usable_entries_are_dropped() {
    let entries: Vec<Entry> = (0..MAX_MEMORY_REGIONS as u64 + 5)
        .map(|i| entry(i * 0x10_0000, 0x1000, 1))
        .collect();
    let map = encode(&entries);
    let arena = boot_arena(&map);

    let regions = read_memory_map(&arena, &ctx()).unwrap();
    assert_eq!(regions.len(), MAX_MEMORY_REGIONS);
    assert_eq!(regions.dropped(), 5);
    assert_eq!(
        regions.as_slice().last().map(|r| r.base),
        Some((MAX_MEMORY_REGIONS as u64 - 1) * 0x10_0000)
    );
}

#[test]
fn foreign_magic_is_rejected_before_touching_memory() {
    // The arena does not even cover the claimed info address.
    let arena = PhysArena::new(ARENA_BASE, 1);
    let ctx = BootContext::new(MULTIBOOT2_BOOTLOADER_MAGIC, 0xDEAD_0000);

    assert_eq!(
        read_memory_map(&arena, &ctx).unwrap_err(),
        MemoryMapError::UnsupportedMagic(MULTIBOOT2_BOOTLOADER_MAGIC)
    );
}

#[test]
fn null_info_pointer_is_rejected() {
    let arena = PhysArena::new(ARENA_BASE, 1);
    let ctx = BootContext::new(MULTIBOOT_BOOTLOADER_MAGIC, 0);

    assert_eq!(
        read_memory_map(&arena, &ctx).unwrap_err(),
        MemoryMapError::NullBootInfo
    );
}

#[test]
fn missing_memory_map_flag_is_rejected() {
    let map = encode(&[entry(0x0010_0000, 0x0010_0000, 1)]);
    let arena = boot_arena(&map);
    let flags = 0b11;
    write_info(&arena, flags, u32::try_from(map.len()).unwrap(), MAP_AT);

    assert_eq!(
        read_memory_map(&arena, &ctx()).unwrap_err(),
        MemoryMapError::MissingMemoryMap { flags }
    );
}

#[test]
fn null_map_address_is_rejected() {
    let arena = PhysArena::new(ARENA_BASE, 64);
    write_info(&arena, MULTIBOOT_INFO_MEM_MAP, 24, 0);

    assert_eq!(
        read_memory_map(&arena, &ctx()).unwrap_err(),
        MemoryMapError::NullMemoryMap { length: 24 }
    );
}
