//! # Identity `PhysMapper`
//!
//! While the kernel runs with paging off, or inside the bootstrap identity
//! window, a physical address is usable as a pointer as-is.
//!
//! ## Example
//! ```rust,no_run
//! use kernel_alloc::phys_mapper::IdentityPhysMapper;
//! use kernel_memory_addresses::{PhysicalPage, Size4K};
//! use kernel_vmem::PhysMapperExt;
//!
//! let frame = PhysicalPage::<Size4K>::from_frame_number(0x200);
//! let table = unsafe { IdentityPhysMapper.table_mut(frame) };
//! table.zero();
//! ```

use kernel_memory_addresses::PhysicalAddress;
use kernel_vmem::PhysMapper;

/// [`PhysMapper`] for identity-mapped (or unpaged) physical memory.
///
/// # Safety
/// Only addresses below the identity window stay valid once paging is on.
#[derive(Copy, Clone, Debug, Default)]
pub struct IdentityPhysMapper;

impl PhysMapper for IdentityPhysMapper {
    #[inline]
    fn phys_to_ptr(&self, pa: PhysicalAddress) -> *mut u8 {
        core::ptr::with_exposed_provenance_mut(pa.as_usize())
    }
}
