//! # Fatal Boot Errors
//!
//! Everything that stops the boot sequence funnels into [`FatalError`]. Each
//! variant maps to a [`PanicCode`] so a QEMU harness can tell failures apart
//! by exit status alone; [`halt_with`] logs the error, emits the code and
//! halts for good.

use kernel_alloc::HeapError;
use kernel_info::boot::BadMagic;
use kernel_memory_addresses::PhysicalAddress;
use kernel_mmap::MemoryMapError;
use kernel_qemu::{ErrorKind, PanicCode, Stage, Subsystem, qemu_exit};
use kernel_vmem::{IdentityMapError, TableKind};
use log::error;

#[derive(Debug, thiserror::Error)]
pub enum FatalError {
    #[error(transparent)]
    BadMagic(#[from] BadMagic),
    #[error("memory map: {0}")]
    MemoryMap(#[from] MemoryMapError),
    #[error("frame heap: {0}")]
    Heap(#[from] HeapError),
    #[error("frame heap {start}..{end} is not inside usable memory")]
    HeapOutsideUsableMemory {
        start: PhysicalAddress,
        end: PhysicalAddress,
    },
    #[error("identity map: {0}")]
    IdentityMap(#[from] IdentityMapError),
    #[error("kernel memory ends at {end}, past the identity window")]
    KernelOutsideIdentityWindow { end: PhysicalAddress },
    #[cfg(feature = "selftest")]
    #[error("allocator self-test failed: {0}")]
    SelfTest(&'static str),
}

impl FatalError {
    /// The code reported to the debug-exit device.
    #[must_use]
    pub const fn panic_code(&self) -> PanicCode {
        use ErrorKind::{BadDescriptor, NullPtr, Unknown};
        use Stage::{Enable, Enter, Init, Load};
        use Subsystem::{Boot, Memory, Paging};

        match self {
            Self::BadMagic(_) => PanicCode::compose(Boot, Enter, BadDescriptor, 0),
            Self::MemoryMap(e) => {
                let (error, info) = match e {
                    MemoryMapError::UnsupportedMagic(_) => (BadDescriptor, 1),
                    MemoryMapError::NullBootInfo => (NullPtr, 2),
                    MemoryMapError::MissingMemoryMap { .. } => (BadDescriptor, 3),
                    MemoryMapError::NullMemoryMap { .. } => (NullPtr, 4),
                    MemoryMapError::EntryTooSmall { .. } => (BadDescriptor, 5),
                    MemoryMapError::Overshoot { .. } => (BadDescriptor, 6),
                    MemoryMapError::Truncated { .. } => (BadDescriptor, 7),
                };
                PanicCode::compose(Memory, Load, error, info)
            }
            Self::Heap(e) => {
                let info = match e {
                    HeapError::Misaligned { .. } => 1,
                    HeapError::Empty { .. } => 2,
                    HeapError::TooLarge { .. } => 3,
                };
                PanicCode::compose(Memory, Init, BadDescriptor, info)
            }
            Self::HeapOutsideUsableMemory { .. } => PanicCode::compose(Memory, Init, BadDescriptor, 4),
            Self::IdentityMap(e) => {
                let (error, info) = match e {
                    IdentityMapError::OutOfMemory(kind) => (Unknown, table_info(*kind)),
                    IdentityMapError::OutsideIdentityWindow { kind, .. } => {
                        (BadDescriptor, 0x10 | table_info(*kind))
                    }
                };
                PanicCode::compose(Paging, Init, error, info)
            }
            Self::KernelOutsideIdentityWindow { .. } => {
                PanicCode::compose(Paging, Enable, BadDescriptor, 0)
            }
            #[cfg(feature = "selftest")]
            Self::SelfTest(_) => PanicCode::compose(Memory, Stage::Handle, Unknown, 0),
        }
    }
}

const fn table_info(kind: TableKind) -> u8 {
    match kind {
        TableKind::Directory => 1,
        TableKind::Table => 2,
    }
}

/// Report `err` on the debug console and the exit device, then halt.
pub fn halt_with(err: &FatalError) -> ! {
    let code = err.panic_code();
    error!("{err} (code {:#010x})", code.into_bits());
    qemu_exit(code)
}

/// Code used by the panic handler.
pub const PANIC: PanicCode =
    PanicCode::compose(Subsystem::Boot, Stage::Handle, ErrorKind::Unknown, 0);

/// Reported after a successful boot with the `selftest` feature.
#[cfg(feature = "selftest")]
pub const SELFTEST_PASSED: PanicCode =
    PanicCode::compose(Subsystem::Memory, Stage::Handle, ErrorKind::None, 0);
