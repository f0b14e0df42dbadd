//! # Memory Bring-Up
//!
//! The early memory subsystem comes up in a fixed order:
//!
//! ```text
//! Uninitialized ──read_memory_map──► Discovered ──initialize_heap──► HeapReady
//!                                                                       │
//!                                                       activate_identity_map
//!                                                                       ▼
//!                                                                    Mapped
//! ```
//!
//! Each step consumes its token and returns the next one, so skipping or
//! repeating a step does not compile. Every failure is a [`FatalError`].

use crate::fatal::FatalError;
use crate::layout::KernelLayout;
use kernel_alloc::{FrameAllocator, FreeRejected};
use kernel_info::boot::BootContext;
use kernel_memory_addresses::{PhysicalAddress, PhysicalPage, Size4K};
use kernel_mmap::MemoryRegions;
use kernel_vmem::{AddressSpace, PagingSwitch, PhysMapper};
use log::info;

/// Boot parameters captured, nothing read yet.
pub struct Uninitialized {
    ctx: BootContext,
    layout: KernelLayout,
}

/// Usable memory is known.
pub struct Discovered {
    layout: KernelLayout,
    regions: MemoryRegions,
}

/// The frame allocator owns the heap.
pub struct HeapReady<M: PhysMapper> {
    layout: KernelLayout,
    regions: MemoryRegions,
    frames: FrameAllocator<M>,
}

/// Paging is on with the identity map of the low window.
pub struct Mapped<M: PhysMapper> {
    regions: MemoryRegions,
    frames: FrameAllocator<M>,
    address_space: AddressSpace,
}

impl Uninitialized {
    /// Validate the boot context.
    ///
    /// # Errors
    /// [`FatalError::BadMagic`] unless a Multiboot1 bootloader started us.
    pub fn new(ctx: BootContext, layout: KernelLayout) -> Result<Self, FatalError> {
        let ctx = ctx.validate()?;
        info!(
            "Kernel image {}..{}, frame heap {}..{}",
            layout.image_start, layout.image_end, layout.heap_start, layout.heap_end
        );
        Ok(Self { ctx, layout })
    }

    /// Parse the bootloader's memory map.
    ///
    /// # Errors
    /// [`FatalError::MemoryMap`] if the map is missing or malformed.
    pub fn read_memory_map<M: PhysMapper + ?Sized>(self, mapper: &M) -> Result<Discovered, FatalError> {
        let regions = kernel_mmap::read_memory_map(mapper, &self.ctx)?;
        info!(
            "Discovered {} usable regions, {} KiB",
            regions.len(),
            regions.total_bytes() / 1024
        );
        Ok(Discovered {
            layout: self.layout,
            regions,
        })
    }
}

impl Discovered {
    #[must_use]
    pub const fn regions(&self) -> &MemoryRegions {
        &self.regions
    }

    /// Hand the linker-reserved heap to a fresh [`FrameAllocator`].
    ///
    /// # Errors
    /// - [`FatalError::Heap`] if the heap bounds are unusable.
    /// - [`FatalError::HeapOutsideUsableMemory`] unless a single usable
    ///   region contains the whole heap.
    ///
    /// # Safety
    /// The heap must be reachable through `mapper` and owned by nothing else.
    pub unsafe fn initialize_heap<M: PhysMapper>(self, mapper: M) -> Result<HeapReady<M>, FatalError> {
        let heap = self.layout.heap()?;
        let (start, end) = (heap.start(), heap.end());
        if !self
            .regions
            .covers(u64::from(start.as_u32()), u64::from(end.as_u32()))
        {
            return Err(FatalError::HeapOutsideUsableMemory { start, end });
        }

        // SAFETY: forwarded to the caller.
        let frames = unsafe { FrameAllocator::initialize(mapper, heap) };
        Ok(HeapReady {
            layout: self.layout,
            regions: self.regions,
            frames,
        })
    }
}

impl<M: PhysMapper> HeapReady<M> {
    #[must_use]
    pub const fn regions(&self) -> &MemoryRegions {
        &self.regions
    }

    #[must_use]
    pub const fn frames(&self) -> &FrameAllocator<M> {
        &self.frames
    }

    /// Allocate `count` contiguous zeroed frames.
    pub fn allocate_frame(&mut self, count: usize) -> Option<PhysicalPage<Size4K>> {
        self.frames.allocate(count)
    }

    /// Return a single frame.
    ///
    /// # Errors
    /// The reason the address was ignored; ignoring it is harmless.
    pub fn free_frame(&mut self, address: PhysicalAddress) -> Result<(), FreeRejected> {
        self.frames.free(address)
    }
}

impl<M: PhysMapper + Clone> HeapReady<M> {
    /// Build the identity map of the low 4 MiB and turn paging on.
    ///
    /// # Errors
    /// - [`FatalError::KernelOutsideIdentityWindow`] if the image or heap
    ///   would become unreachable.
    /// - [`FatalError::IdentityMap`] if the tables cannot be placed.
    ///
    /// # Safety
    /// The stack and all code must lie inside the identity window, and the
    /// mapper must stay valid once paging is on.
    pub unsafe fn activate_identity_map<P>(self, switch: &mut P) -> Result<Mapped<M>, FatalError>
    where
        P: PagingSwitch + ?Sized,
    {
        if !self.layout.fits_identity_window() {
            return Err(FatalError::KernelOutsideIdentityWindow {
                end: self.layout.end(),
            });
        }

        let Self {
            regions,
            mut frames,
            ..
        } = self;

        let mapper = frames.mapper().clone();
        let address_space = AddressSpace::build_identity_map(&mut frames, &mapper)?;

        // SAFETY: forwarded to the caller.
        unsafe { address_space.activate(switch) };
        info!("Paging enabled, directory at {}", address_space.directory());

        Ok(Mapped {
            regions,
            frames,
            address_space,
        })
    }
}

impl<M: PhysMapper> Mapped<M> {
    #[must_use]
    pub const fn regions(&self) -> &MemoryRegions {
        &self.regions
    }

    #[must_use]
    pub const fn frames(&self) -> &FrameAllocator<M> {
        &self.frames
    }

    #[must_use]
    pub const fn address_space(&self) -> &AddressSpace {
        &self.address_space
    }

    /// Allocate `count` contiguous zeroed frames.
    pub fn allocate_frame(&mut self, count: usize) -> Option<PhysicalPage<Size4K>> {
        self.frames.allocate(count)
    }

    /// Return a single frame.
    ///
    /// # Errors
    /// The reason the address was ignored.
    pub fn free_frame(&mut self, address: PhysicalAddress) -> Result<(), FreeRejected> {
        self.frames.free(address)
    }
}
