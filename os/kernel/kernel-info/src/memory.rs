//! # Memory Layout

/// Size of a physical frame and of a small page, in bytes.
pub const FRAME_SIZE: u32 = 4096;

/// Number of entries in a page table or page directory (non-PAE).
pub const ENTRIES_PER_TABLE: usize = 1024;

/// Bytes covered by a single page table, and thus by one directory entry.
#[allow(clippy::cast_possible_truncation)]
pub const BYTES_PER_TABLE: u32 = FRAME_SIZE * ENTRIES_PER_TABLE as u32;

/// The low window identity mapped by the bootstrap address space.
///
/// Everything the kernel touches between enabling paging and building a
/// richer address space (code, stack, heap, page tables) must live below it.
pub const IDENTITY_MAP_BYTES: u32 = BYTES_PER_TABLE; // 4 MiB

/// Where the bootloader places the kernel image in physical memory.
///
/// # Kernel Build
/// This information is sourced in the kernel's `build.rs` to configure
/// the linker.
pub const PHYS_LOAD: u32 = 0x0010_0000; // 1 MiB

/// The size of the boot stack reserved in `.bss`.
pub const BOOT_STACK_SIZE: u32 = 32 * 1024;

/// Size of the frame heap carved out after the kernel image.
///
/// Frame 0 of the heap holds the bookkeeping table, one byte per frame.
///
/// # Kernel Build
/// This information is sourced in the kernel's `build.rs` to configure
/// the linker.
pub const HEAP_SIZE: u32 = 1024 * 1024; // 1 MiB, 256 frames

/// The most frames a heap may span so that its bookkeeping fits in frame 0.
pub const MAX_HEAP_FRAMES: u32 = FRAME_SIZE;

/// Upper bound on usable memory regions retained from the boot memory map.
pub const MAX_MEMORY_REGIONS: usize = 100;

const _: () = {
    assert!(FRAME_SIZE.is_power_of_two());
    assert!(PHYS_LOAD.is_multiple_of(FRAME_SIZE));
    assert!(IDENTITY_MAP_BYTES == 4 * 1024 * 1024);
    assert!(BOOT_STACK_SIZE.is_multiple_of(FRAME_SIZE));
    assert!(HEAP_SIZE.is_multiple_of(FRAME_SIZE));
    assert!(HEAP_SIZE / FRAME_SIZE >= 2);
    assert!(HEAP_SIZE / FRAME_SIZE <= MAX_HEAP_FRAMES);
    assert!(PHYS_LOAD + BOOT_STACK_SIZE + HEAP_SIZE < IDENTITY_MAP_BYTES);
};
