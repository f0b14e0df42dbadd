//! # Boot Memory Map
//!
//! Discovers usable physical memory from the Multiboot1 memory map.
//!
//! The bootloader hands the kernel a packed, variable-sized list of
//! `(size, base, length, type)` records. [`read_memory_map`] locates the list
//! through the boot information block, walks it with strict bounds checking
//! and keeps every usable-RAM record in a fixed-capacity [`MemoryRegions`]
//! list, in the bootloader's order.
//!
//! ```text
//! mmap_addr                                               mmap_addr + mmap_length
//! ┌──────┬──────────┬──────────┬──────┬──────┬──────────┬─────┐
//! │ size │   base   │  length  │ type │ size │   base   │ ... │
//! │ u32  │   u64    │   u64    │ u32  │ u32  │   u64    │     │
//! └──────┴──────────┴──────────┴──────┴──────┴──────────┴─────┘
//!  ◄──── size + 4 ─────────────────────►
//! ```
//!
//! Any inconsistency in the list (a record smaller than 20 bytes, a record
//! running past the end, trailing bytes) is a [`MemoryMapError`]; the walk
//! never guesses its way past corrupt data.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod reader;
mod region;
mod regions;

pub use reader::{MemoryMapError, parse_memory_map, read_memory_map};
pub use region::{MemoryKind, MemoryRegion};
pub use regions::MemoryRegions;
