//! # QEMU Development and Debug Support
//!
//! Debug sinks for a kernel running under QEMU. Two channels are provided:
//!
//! * **Text**: a `log::Log` implementation ([`QemuLogger`]) and the
//!   [`qemu_trace!`] macro, both writing bytes to QEMU's debug console port
//!   `0x402` (`-debugcon`).
//! * **Machine-readable**: a 32-bit [`PanicCode`] written to the ISA
//!   debug-exit device at port `0xF4` (`-device isa-debug-exit`), which ends
//!   the emulator with a status a test harness can check without parsing
//!   text. See [`qemu_exit`].
//!
//! ## Output Mechanism
//! ```text
//! log::info!() / qemu_trace!()
//!     ↓
//! QemuSink (fmt::Write)
//!     ↓
//! dbg_putc() → I/O port 0x402
//!     ↓
//! QEMU debug console → host terminal or file
//! ```
//!
//! ## Feature System
//!
//! With the `enabled` feature (default) the port writes are compiled in.
//! Without it, the text macros become no-ops; [`qemu_exit`] still halts the
//! processor but does not touch the exit port.
//!
//! ## Usage
//! ```rust,no_run
//! use kernel_qemu::QemuLogger;
//! use log::{LevelFilter, info};
//!
//! static LOGGER: QemuLogger = QemuLogger::new(LevelFilter::Debug);
//!
//! LOGGER.init().ok();
//! info!("Kernel subsystem initialized");
//! ```
//!
//! ## Host-Side Configuration
//! ```bash
//! qemu-system-i386 -kernel kernel.elf -debugcon stdio \
//!     -device isa-debug-exit,iobase=0xf4,iosize=0x04
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod exit;
mod logger;

pub use exit::{ErrorKind, PanicCode, Stage, Subsystem, halt_forever, qemu_exit};
pub use logger::QemuLogger;

#[cfg(all(feature = "enabled", any(target_arch = "x86", target_arch = "x86_64")))]
#[doc(hidden)]
pub mod qemu_fmt {
    use core::fmt::{self, Write};

    /// The port number for QEMU's debug console.
    const QEMU_DEBUG_PORT: u16 = 0x402;

    /// Write a single character to QEMU's debug port.
    #[allow(clippy::inline_always)]
    #[inline(always)]
    pub fn dbg_putc(c: u8) {
        unsafe { outb(QEMU_DEBUG_PORT, c) }
    }

    #[allow(clippy::inline_always)]
    #[inline(always)]
    unsafe fn outb(port: u16, val: u8) {
        unsafe {
            core::arch::asm!(
            "out dx, al",
            in("dx") port,
            in("al") val,
            options(nomem, nostack, preserves_flags)
            );
        }
    }

    pub struct QemuSink;

    impl Write for QemuSink {
        #[inline]
        fn write_str(&mut self, s: &str) -> fmt::Result {
            for b in s.bytes() {
                dbg_putc(b);
            }
            Ok(())
        }
    }

    #[doc(hidden)]
    #[inline(always)]
    #[allow(clippy::inline_always)]
    pub fn qemu_write(args: fmt::Arguments) {
        // Best-effort debug output.
        let _ = fmt::write(&mut QemuSink, args);
    }
}

#[cfg(not(all(feature = "enabled", any(target_arch = "x86", target_arch = "x86_64"))))]
#[doc(hidden)]
pub mod qemu_fmt {
    use core::fmt;

    #[doc(hidden)]
    #[inline(always)]
    #[allow(clippy::inline_always)]
    pub fn qemu_write(_: fmt::Arguments) {}
}

/// Write `format!`-style text straight to the QEMU debug console.
#[macro_export]
macro_rules! qemu_trace {
    ($($arg:tt)*) => {{
        $crate::qemu_fmt::qemu_write(core::format_args!($($arg)*));
    }};
}
