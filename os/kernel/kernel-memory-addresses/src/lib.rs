//! # Physical and Virtual Memory Address Types
//!
//! Strongly typed wrappers for 32-bit memory addresses and page bases used by
//! the frame allocator and the two-level (non-PAE) paging code.
//!
//! ## Overview
//!
//! All higher-level memory abstractions are built from a few principal types:
//!
//! | Concept | Generic | Description |
//! |----------|----------|-------------|
//! | [`MemoryAddress`] | – | A raw 32-bit address, either physical or virtual. |
//! | [`MemoryPage<S>`] | [`S: PageSize`](PageSize) | A page-aligned base address of a page of size `S`. |
//! | [`MemoryAddressOffset<S>`] | [`S: PageSize`](PageSize) | An offset within a page of size `S`. |
//!
//! These are wrapped to keep the two address spaces apart:
//!
//! | Wrapper | Meaning |
//! |----------|----------|
//! | [`VirtualAddress`] | Refers to page-table translated memory. |
//! | [`PhysicalAddress`] / [`PhysicalPage<S>`] | Refer to physical memory, e.g. allocator frames. |
//!
//! ## Page Sizes
//!
//! [`Size4K`] is the only size: 4 KiB frames, the allocation and mapping
//! granularity. [`PageSize`] is sealed.
//!
//! ## Typical Usage
//!
//! ```rust
//! # use kernel_memory_addresses::*;
//! let pa = PhysicalAddress::new(0x0012_3456);
//! let (frame, off) = pa.split::<Size4K>();
//! assert_eq!(frame.base().as_u32(), 0x0012_3000);
//! assert_eq!(off.as_u32(), 0x456);
//! assert_eq!(frame.join(off), pa);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(clippy::inline_always)]

mod memory_address;
mod memory_address_offset;
mod memory_page;
mod page_size;
mod physical_address;
mod physical_page;
mod virtual_address;

pub use memory_address::MemoryAddress;
pub use memory_address_offset::MemoryAddressOffset;
pub use memory_page::MemoryPage;
pub use page_size::{PageSize, Size4K};
pub use physical_address::PhysicalAddress;
pub use physical_page::PhysicalPage;
pub use virtual_address::VirtualAddress;
