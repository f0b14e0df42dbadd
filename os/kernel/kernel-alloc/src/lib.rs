//! # Physical Frame Allocation
//!
//! A byte-map allocator over a fixed, link-time heap region.
//!
//! ```text
//! heap_start                                                  heap_end
//! ┌──────────┬──────────┬──────────┬──────────┬─────┬──────────┐
//! │ frame 0  │ frame 1  │ frame 2  │ frame 3  │ ... │ frame n-1│
//! │ table    │          │          │          │     │          │
//! └──────────┴──────────┴──────────┴──────────┴─────┴──────────┘
//!   │
//!   └─► [R][T][F][T] ... one byte per frame: Free / Taken / Reserved
//! ```
//!
//! - [`HeapRegion`]: validated `[heap_start, heap_end)` bounds.
//! - [`FrameAllocator`]: owns the region and its bookkeeping table; hands
//!   out zero-filled runs of frames first-fit and takes single frames back.
//! - [`IdentityPhysMapper`]: the kernel's view of physical memory while the
//!   heap lives in the identity window.
//!
//! The allocator is an explicit value passed to whoever needs frames; there
//! is no global instance.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

pub mod frame_alloc;
pub mod heap_region;
pub mod phys_mapper;

pub use frame_alloc::{FrameAllocator, FrameState, FreeRejected};
pub use heap_region::{HeapError, HeapRegion};
pub use phys_mapper::IdentityPhysMapper;
