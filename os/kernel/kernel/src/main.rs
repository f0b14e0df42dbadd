//! # Kernel Entry Point
//!
//! A Multiboot1 bootloader loads the image at [`PHYS_LOAD`] and jumps to
//! `_start` in 32-bit protected mode, paging off, with the bootloader magic
//! in `eax` and the physical address of the boot information block in
//! `ebx`. The entry stub moves onto the boot stack and hands both values to
//! `kernel_entry`, which brings up early memory:
//!
//! 1. read the memory map,
//! 2. hand the frame heap to the allocator,
//! 3. identity map the low 4 MiB and enable paging.
//!
//! Any failure ends in [`fatal::halt_with`].
//!
//! On a hosted target the crate builds an empty `main` so its modules can be
//! unit tested.
//!
//! [`PHYS_LOAD`]: kernel_info::memory::PHYS_LOAD

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]
#![cfg_attr(not(target_os = "none"), allow(dead_code))]
#![allow(unsafe_code)]

mod fatal;
mod init;
mod layout;
#[cfg(feature = "selftest")]
mod selftest;

#[cfg(all(target_os = "none", target_arch = "x86"))]
mod entry {
    use crate::fatal::{self, FatalError};
    use crate::init::{Mapped, Uninitialized};
    use crate::layout::KernelLayout;
    use kernel_alloc::IdentityPhysMapper;
    use kernel_info::boot::{
        BootContext, MULTIBOOT_HEADER_CHECKSUM, MULTIBOOT_HEADER_FLAGS, MULTIBOOT_HEADER_MAGIC,
    };
    use kernel_info::memory::BOOT_STACK_SIZE;
    use kernel_qemu::{QemuLogger, qemu_trace};
    use kernel_vmem::ControlRegisters;
    use log::{LevelFilter, info, warn};

    /// Multiboot1 header; `linker.ld` places it at the very start of the image.
    #[used]
    #[unsafe(link_section = ".multiboot")]
    static MULTIBOOT_HEADER: [u32; 3] = [
        MULTIBOOT_HEADER_MAGIC,
        MULTIBOOT_HEADER_FLAGS,
        MULTIBOOT_HEADER_CHECKSUM,
    ];

    const STACK_SIZE: usize = BOOT_STACK_SIZE as usize;

    #[repr(C, align(16))]
    struct Aligned16<const N: usize>([u8; N]);

    /// The only stack the kernel runs on. Lives in the identity window.
    #[unsafe(link_section = ".bss.boot")]
    static mut BOOT_STACK: Aligned16<STACK_SIZE> = Aligned16([0; STACK_SIZE]);

    static LOGGER: QemuLogger = QemuLogger::new(LevelFilter::Debug);

    /// Bootloader entry.
    ///
    /// # Naked function & Stack
    /// The bootloader leaves `esp` undefined, so no Rust code may run before
    /// the stack is set up here. The two boot registers are pushed as the
    /// cdecl arguments of [`kernel_entry`].
    #[unsafe(no_mangle)]
    #[unsafe(naked)]
    #[unsafe(link_section = ".text._start")]
    pub unsafe extern "C" fn _start() -> ! {
        core::arch::naked_asm!(
            "cli",
            "lea esp, [{stack_sym} + {stack_size}]",
            "and esp, -16",
            "xor ebp, ebp",
            // Keep esp 16-byte aligned at the call.
            "sub esp, 8",
            "push ebx",
            "push eax",
            "call {rust_entry}",
            "2:",
            "cli",
            "hlt",
            "jmp 2b",
            stack_sym = sym BOOT_STACK,
            stack_size = const STACK_SIZE,
            rust_entry = sym kernel_entry,
        );
    }

    /// Kernel entry running on [`BOOT_STACK`].
    #[unsafe(no_mangle)]
    extern "C" fn kernel_entry(magic: u32, info_phys: u32) -> ! {
        if let Err(err) = LOGGER.init() {
            qemu_trace!("logger not installed: {err}\n");
        }
        info!("Kernel reporting to QEMU!");

        match bring_up_memory(BootContext::new(magic, info_phys)) {
            Ok(mapped) => kernel_main(&mapped),
            Err(err) => fatal::halt_with(&err),
        }
    }

    fn bring_up_memory(ctx: BootContext) -> Result<Mapped<IdentityPhysMapper>, FatalError> {
        let discovered = Uninitialized::new(ctx, KernelLayout::from_linker())?
            .read_memory_map(&IdentityPhysMapper)?;

        // SAFETY: the linker reserves the heap for the allocator alone.
        #[allow(unused_mut)]
        let mut ready = unsafe { discovered.initialize_heap(IdentityPhysMapper)? };

        #[cfg(feature = "selftest")]
        crate::selftest::run(&mut ready)?;

        // SAFETY: code, stack and heap were checked to lie below 4 MiB.
        unsafe { ready.activate_identity_map(&mut ControlRegisters) }
    }

    fn kernel_main(mapped: &Mapped<IdentityPhysMapper>) -> ! {
        let frames = mapped.frames();
        info!(
            "Early memory is up: {} of {} frames free",
            frames.free_frames(),
            frames.usable_frames()
        );
        if mapped.regions().dropped() > 0 {
            warn!("{} usable regions were not retained", mapped.regions().dropped());
        }

        #[cfg(feature = "selftest")]
        kernel_qemu::qemu_exit(fatal::SELFTEST_PASSED);

        #[cfg(not(feature = "selftest"))]
        kernel_qemu::halt_forever()
    }
}

#[cfg(target_os = "none")]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    log::error!("{info}");
    kernel_qemu::qemu_exit(fatal::PANIC)
}

#[cfg(not(target_os = "none"))]
fn main() {}
