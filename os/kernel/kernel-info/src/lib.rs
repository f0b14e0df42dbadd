//! # Kernel Configuration and Boot Interface
//!
//! This crate defines the boot handoff contract and the memory layout
//! constants shared by the kernel binary, its build script and the memory
//! subsystem libraries. It is the single source of truth for anything that
//! has to agree between the linker script and Rust code.
//!
//! ## Architecture
//!
//! ### Boot Information ([`boot`])
//! Defines the bootloader-to-kernel handoff interface:
//! * **Multiboot1 Magic**: The value the bootloader leaves in `eax`
//! * **Boot Information Block**: The packed structure `ebx` points to
//! * **Memory Map Entries**: Byte offsets of the variable-sized records
//! * **Boot Context**: The immutable pair of boot parameters
//!
//! ### Memory Layout ([`memory`])
//! Establishes the early physical layout:
//! * **Frame Geometry**: 4 KiB frames, 1024-entry page tables
//! * **Identity Window**: The first 4 MiB mapped 1:1 during bootstrap
//! * **Kernel Placement**: Load address, boot stack and heap sizes
//!
//! ## Physical Memory Layout
//!
//! ```text
//! 0x0000_0000 ┌─────────────────────────────────┐
//!             │     Low Memory (< 1MiB)         │
//!             │  (BIOS, VGA, bootloader data)   │
//! PHYS_LOAD   ├─────────────────────────────────┤ 0x0010_0000 (1 MiB)
//!             │       Kernel Image              │
//!             │   (Multiboot header, Text,      │
//!             │    Data, BSS, boot stack)       │
//! _heap_start ├─────────────────────────────────┤ (frame aligned)
//!             │  Frame 0: bookkeeping table     │
//!             │  Frames 1..n: managed frames    │
//! _heap_end   ├─────────────────────────────────┤
//!             │    Remaining RAM                │
//! IDENTITY_   ├─────────────────────────────────┤ 0x0040_0000 (4 MiB)
//! MAP_BYTES   │    Unmapped once paging is on   │
//!             └─────────────────────────────────┘
//! ```
//!
//! ## Build Integration
//!
//! The constants are consumed by the kernel's `build.rs`:
//!
//! ```rust
//! use kernel_info::memory::{HEAP_SIZE, PHYS_LOAD};
//!
//! println!("cargo:rustc-link-arg=--defsym=PHYS_LOAD={PHYS_LOAD:#x}");
//! println!("cargo:rustc-link-arg=--defsym=HEAP_SIZE={HEAP_SIZE:#x}");
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod boot;
pub mod memory;
