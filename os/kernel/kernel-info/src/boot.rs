//! # Kernel Boot Information
//!
//! The Multiboot1 handoff: the bootloader enters the kernel in 32-bit
//! protected mode with the magic value in `eax` and the physical address of
//! a [`MultibootInfo`] block in `ebx`.

/// Magic value a Multiboot1 compliant bootloader leaves in `eax`.
pub const MULTIBOOT_BOOTLOADER_MAGIC: u32 = 0x2BAD_B002;

/// Magic value a Multiboot2 bootloader leaves in `eax`. Not supported.
pub const MULTIBOOT2_BOOTLOADER_MAGIC: u32 = 0x36D7_6289;

/// Magic value of the Multiboot1 header embedded in the kernel image.
pub const MULTIBOOT_HEADER_MAGIC: u32 = 0x1BAD_B002;

/// Header flags: page-align modules (bit 0) and provide memory info (bit 1).
pub const MULTIBOOT_HEADER_FLAGS: u32 = 0b11;

/// Header checksum; `magic + flags + checksum` must be zero.
pub const MULTIBOOT_HEADER_CHECKSUM: u32 =
    0u32.wrapping_sub(MULTIBOOT_HEADER_MAGIC.wrapping_add(MULTIBOOT_HEADER_FLAGS));

/// Bit in [`MultibootInfo::flags`] signalling valid `mmap_*` fields.
pub const MULTIBOOT_INFO_MEM_MAP: u32 = 1 << 6;

/// Memory map type tag of usable RAM.
pub const MULTIBOOT_MEMORY_AVAILABLE: u32 = 1;

/// Boot information block as laid out by the bootloader.
///
/// Only the fields up to the memory map are declared; the block continues
/// with drive, config table, loader name and video fields which the kernel
/// does not consume.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, Default)]
pub struct MultibootInfo {
    pub flags: u32,
    pub mem_lower: u32,
    pub mem_upper: u32,
    pub boot_device: u32,
    pub cmdline: u32,
    pub mods_count: u32,
    pub mods_addr: u32,
    /// a.out symbol table or ELF section header table.
    pub syms: [u32; 4],
    /// Total length of the memory map buffer, in bytes.
    pub mmap_length: u32,
    /// Physical address of the first memory map entry.
    pub mmap_addr: u32,
}

impl MultibootInfo {
    /// Whether the bootloader provided a memory map.
    #[inline]
    #[must_use]
    pub const fn has_memory_map(&self) -> bool {
        self.flags & MULTIBOOT_INFO_MEM_MAP != 0
    }
}

/// Byte layout of a single memory map entry.
///
/// Entries are variable sized: `size` excludes itself, so the next entry
/// starts `size + 4` bytes after the current one.
pub mod mmap_entry {
    /// Offset and width of the `size` field.
    pub const SIZE_OFFSET: usize = 0;
    /// Width of the `size` field, added to `size` to advance.
    pub const SIZE_FIELD_LEN: usize = 4;
    /// Offset of the 64-bit base address.
    pub const BASE_OFFSET: usize = 4;
    /// Offset of the 64-bit length.
    pub const LENGTH_OFFSET: usize = 12;
    /// Offset of the 32-bit type tag.
    pub const TYPE_OFFSET: usize = 20;
    /// Smallest acceptable value of `size` (base + length + type).
    pub const MIN_SIZE: u32 = 20;
    /// Bytes of a minimal entry including the `size` field.
    pub const MIN_ENTRY_LEN: usize = SIZE_FIELD_LEN + MIN_SIZE as usize;
}

/// The two boot parameters, captured once at entry and passed explicitly.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BootContext {
    /// The value found in `eax`.
    pub magic: u32,
    /// The value found in `ebx`: physical address of [`MultibootInfo`].
    pub info_phys: u32,
}

impl BootContext {
    #[inline]
    #[must_use]
    pub const fn new(magic: u32, info_phys: u32) -> Self {
        Self { magic, info_phys }
    }

    /// Whether the kernel was started by a Multiboot1 bootloader.
    #[inline]
    #[must_use]
    pub const fn is_multiboot1(&self) -> bool {
        self.magic == MULTIBOOT_BOOTLOADER_MAGIC
    }

    /// Accept the context only if it came from a Multiboot1 bootloader.
    ///
    /// # Errors
    /// [`BadMagic`] for the Multiboot2 magic or any other value.
    pub const fn validate(self) -> Result<Self, BadMagic> {
        if self.is_multiboot1() {
            Ok(self)
        } else {
            Err(BadMagic(self.magic))
        }
    }
}

/// The kernel was not entered by a Multiboot1 bootloader.
#[derive(Debug, thiserror::Error, Copy, Clone, Eq, PartialEq)]
#[error("unsupported bootloader magic {0:#010x}")]
pub struct BadMagic(pub u32);

const _: () = {
    assert!(size_of::<MultibootInfo>() == 52);
    assert!(core::mem::offset_of!(MultibootInfo, mmap_length) == 44);
    assert!(core::mem::offset_of!(MultibootInfo, mmap_addr) == 48);
    assert!(mmap_entry::TYPE_OFFSET + 4 == mmap_entry::MIN_ENTRY_LEN);
};
