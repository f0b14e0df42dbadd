//! Machine-readable diagnostics through QEMU's ISA debug-exit device.
//!
//! QEMU terminates with status `(value << 1) | 1` when the guest writes
//! `value` to the device, so a harness sees every code as an odd exit status.

use bitfield_struct::bitfield;

/// I/O port of the `isa-debug-exit` device.
pub const QEMU_EXIT_PORT: u16 = 0xF4;

/// Subsystem that reported a fatal condition.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Subsystem {
    Boot = 1,
    Gdt = 2,
    Idt = 3,
    Paging = 4,
    Memory = 5,
    Interrupt = 6,
    Syscall = 7,
}

/// Phase of the subsystem in which the condition was detected.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Stage {
    Enter = 1,
    Init = 2,
    Load = 3,
    Enable = 4,
    Handle = 5,
}

/// Broad class of the failure.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    None = 0,
    NullPtr = 1,
    BadDescriptor = 2,
    PageFault = 3,
    GeneralProtection = 4,
    DoubleFault = 5,
    BadInterrupt = 6,
    Unknown = 0xFF,
}

/// `subsystem << 24 | stage << 16 | error << 8 | info`.
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct PanicCode {
    /// Auxiliary detail, e.g. which check inside the stage failed.
    pub info: u8,
    pub error: u8,
    pub stage: u8,
    pub subsystem: u8,
}

impl PanicCode {
    #[must_use]
    pub const fn compose(subsystem: Subsystem, stage: Stage, error: ErrorKind, info: u8) -> Self {
        Self::new()
            .with_subsystem(subsystem as u8)
            .with_stage(stage as u8)
            .with_error(error as u8)
            .with_info(info)
    }
}

/// Report `code` to the harness and stop the processor for good.
///
/// Without the `enabled` feature or outside of QEMU the port write is
/// ignored and the CPU simply halts.
pub fn qemu_exit(code: PanicCode) -> ! {
    #[cfg(all(feature = "enabled", any(target_arch = "x86", target_arch = "x86_64")))]
    unsafe {
        core::arch::asm!(
            "out dx, eax",
            in("dx") QEMU_EXIT_PORT,
            in("eax") code.into_bits(),
            options(nomem, nostack, preserves_flags)
        );
    }
    #[cfg(not(all(feature = "enabled", any(target_arch = "x86", target_arch = "x86_64"))))]
    let _ = code;

    halt_forever()
}

/// Disable interrupts and halt; never returns.
pub fn halt_forever() -> ! {
    loop {
        #[cfg(target_arch = "x86")]
        unsafe {
            core::arch::asm!("cli", "hlt", options(nomem, nostack));
        }
        #[cfg(not(target_arch = "x86"))]
        core::hint::spin_loop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_fields_most_significant_first() {
        let code = PanicCode::compose(Subsystem::Memory, Stage::Load, ErrorKind::BadDescriptor, 0x07);
        assert_eq!(code.into_bits(), 0x0503_0207);
    }

    #[test]
    fn unknown_error_fills_its_byte() {
        let code = PanicCode::compose(Subsystem::Boot, Stage::Handle, ErrorKind::Unknown, 0);
        assert_eq!(code.into_bits(), 0x0105_FF00);
        assert_eq!(code.error(), 0xFF);
        assert_eq!(code.subsystem(), Subsystem::Boot as u8);
    }
}
