//! # Typed IA-32 Control Registers
//!
//! Bitfield models of the 32-bit protected-mode control registers involved
//! in turning on paging:
//!
//! * [`Cr0`]: `PE` and `PG` among the processor mode bits
//! * [`Cr3`]: physical base of the page directory
//!
//! Actual register access is implemented through [`LoadRegisterUnsafe`] and
//! [`StoreRegisterUnsafe`] and only exists with the `asm` feature on a
//! 32-bit x86 target. Elsewhere the types are plain values, which keeps
//! them usable in host tests.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod cr0;
mod cr3;

pub use cr0::Cr0;
pub use cr3::Cr3;

pub trait LoadRegisterUnsafe {
    /// # Safety
    /// The caller must uphold the implementation-specific safety requirements.
    /// Control register access is privileged and requires Ring 0.
    unsafe fn load_unsafe() -> Self;
}

pub trait StoreRegisterUnsafe {
    /// # Safety
    /// The caller must uphold the implementation-specific safety requirements.
    /// Writing a control register may change how every subsequent memory
    /// access is translated.
    unsafe fn store_unsafe(self);
}
