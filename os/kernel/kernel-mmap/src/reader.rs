use crate::{MemoryKind, MemoryRegion, MemoryRegions};
use kernel_info::boot::{BootContext, MultibootInfo, mmap_entry};
use kernel_memory_addresses::PhysicalAddress;
use kernel_vmem::PhysMapper;
use log::{debug, trace, warn};

#[derive(Debug, thiserror::Error, Copy, Clone, Eq, PartialEq)]
pub enum MemoryMapError {
    #[error("not loaded by a Multiboot1 bootloader (magic {0:#010x})")]
    UnsupportedMagic(u32),
    #[error("boot information pointer is null")]
    NullBootInfo,
    #[error("boot information carries no memory map (flags {flags:#010x})")]
    MissingMemoryMap { flags: u32 },
    #[error("memory map of {length} bytes at a null address")]
    NullMemoryMap { length: u32 },
    #[error("memory map entry at offset {offset} declares size {size}, below the minimum")]
    EntryTooSmall { offset: usize, size: u32 },
    #[error("memory map entry at offset {offset} ends at {next}, past the end at {end}")]
    Overshoot { offset: usize, next: u64, end: usize },
    #[error("memory map ends {remaining} bytes into an entry at offset {offset}")]
    Truncated { offset: usize, remaining: usize },
}

/// Locate and parse the memory map handed over by the bootloader.
///
/// # Errors
/// Any [`MemoryMapError`]; all of them mean the boot contract was broken.
pub fn read_memory_map<M>(mapper: &M, ctx: &BootContext) -> Result<MemoryRegions, MemoryMapError>
where
    M: PhysMapper + ?Sized,
{
    if !ctx.is_multiboot1() {
        return Err(MemoryMapError::UnsupportedMagic(ctx.magic));
    }
    if ctx.info_phys == 0 {
        return Err(MemoryMapError::NullBootInfo);
    }

    // SAFETY: the bootloader placed the block at `info_phys`; it is packed,
    // hence the unaligned read.
    let info = unsafe {
        mapper
            .phys_to_ptr(PhysicalAddress::new(ctx.info_phys))
            .cast::<MultibootInfo>()
            .read_unaligned()
    };

    let flags = info.flags;
    if !info.has_memory_map() {
        return Err(MemoryMapError::MissingMemoryMap { flags });
    }

    let (addr, length) = (info.mmap_addr, info.mmap_length);
    debug!("Memory map at {addr:#010x}, {length} bytes");
    if length == 0 {
        return Ok(MemoryRegions::new());
    }
    if addr == 0 {
        return Err(MemoryMapError::NullMemoryMap { length });
    }

    // SAFETY: the bootloader guarantees `length` readable bytes at `addr`.
    let bytes = unsafe { mapper.phys_to_bytes(PhysicalAddress::new(addr), length as usize) };
    parse_memory_map(bytes)
}

/// Walk a raw memory map buffer and keep its usable-RAM records.
///
/// The walk must end exactly at `bytes.len()`.
///
/// # Errors
/// [`MemoryMapError::EntryTooSmall`], [`MemoryMapError::Overshoot`] or
/// [`MemoryMapError::Truncated`] on malformed input.
pub fn parse_memory_map(bytes: &[u8]) -> Result<MemoryRegions, MemoryMapError> {
    let end = bytes.len();
    let mut regions = MemoryRegions::new();
    let mut cursor = 0;

    while cursor < end {
        let remaining = end - cursor;
        if remaining < mmap_entry::SIZE_FIELD_LEN {
            return Err(MemoryMapError::Truncated {
                offset: cursor,
                remaining,
            });
        }

        let size = read_u32(bytes, cursor + mmap_entry::SIZE_OFFSET);
        if size < mmap_entry::MIN_SIZE {
            return Err(MemoryMapError::EntryTooSmall {
                offset: cursor,
                size,
            });
        }

        let next = cursor as u64 + mmap_entry::SIZE_FIELD_LEN as u64 + u64::from(size);
        if next > end as u64 {
            return Err(MemoryMapError::Overshoot {
                offset: cursor,
                next,
                end,
            });
        }

        let region = MemoryRegion {
            base: read_u64(bytes, cursor + mmap_entry::BASE_OFFSET),
            length: read_u64(bytes, cursor + mmap_entry::LENGTH_OFFSET),
            kind: MemoryKind::from_raw(read_u32(bytes, cursor + mmap_entry::TYPE_OFFSET)),
        };
        keep_if_usable(&mut regions, region);

        #[allow(clippy::cast_possible_truncation)]
        {
            cursor = next as usize;
        }
    }

    if regions.dropped() > 0 {
        warn!(
            "Memory map lists more than {} usable regions, {} dropped",
            regions.len(),
            regions.dropped()
        );
    }
    Ok(regions)
}

fn keep_if_usable(regions: &mut MemoryRegions, region: MemoryRegion) {
    if region.kind != MemoryKind::Available {
        trace!("Skipping {region}");
        return;
    }
    if region.end().is_none() {
        warn!(
            "Skipping usable region at {:#x} with impossible length {:#x}",
            region.base, region.length
        );
        return;
    }
    if regions.push(region) {
        debug!("Usable {region}");
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(raw)
}

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(raw)
}
