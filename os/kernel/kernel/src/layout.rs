//! Physical placement of the kernel image and its frame heap.

use kernel_alloc::{HeapError, HeapRegion};
use kernel_info::memory::IDENTITY_MAP_BYTES;
use kernel_memory_addresses::PhysicalAddress;

/// Bounds exported by `linker.ld`. The kernel runs identity mapped, so
/// these addresses are physical.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct KernelLayout {
    pub image_start: PhysicalAddress,
    pub image_end: PhysicalAddress,
    pub heap_start: PhysicalAddress,
    pub heap_end: PhysicalAddress,
}

impl KernelLayout {
    /// Read the layout from the linker symbols.
    #[cfg(target_os = "none")]
    #[must_use]
    pub fn from_linker() -> Self {
        unsafe extern "C" {
            static _kernel_start: u8;
            static _kernel_end: u8;
            static _heap_start: u8;
            static _heap_end: u8;
        }

        // SAFETY: only the addresses of the symbols are taken.
        unsafe {
            Self {
                image_start: symbol_address(&raw const _kernel_start),
                image_end: symbol_address(&raw const _kernel_end),
                heap_start: symbol_address(&raw const _heap_start),
                heap_end: symbol_address(&raw const _heap_end),
            }
        }
    }

    /// The heap as a validated [`HeapRegion`].
    ///
    /// # Errors
    /// Whatever [`HeapRegion::new`] rejects.
    pub const fn heap(&self) -> Result<HeapRegion, HeapError> {
        HeapRegion::new(self.heap_start, self.heap_end)
    }

    /// Highest address the kernel needs reachable once paging is on.
    #[must_use]
    pub const fn end(&self) -> PhysicalAddress {
        if self.heap_end.as_u32() > self.image_end.as_u32() {
            self.heap_end
        } else {
            self.image_end
        }
    }

    /// Whether image and heap both end inside the identity window.
    #[must_use]
    pub const fn fits_identity_window(&self) -> bool {
        self.end().as_u32() <= IDENTITY_MAP_BYTES
    }
}

#[cfg(target_os = "none")]
#[allow(clippy::cast_possible_truncation)]
fn symbol_address(sym: *const u8) -> PhysicalAddress {
    PhysicalAddress::new(sym.addr() as u32)
}
