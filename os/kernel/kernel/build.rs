use kernel_info::memory::{BOOT_STACK_SIZE, FRAME_SIZE, HEAP_SIZE, IDENTITY_MAP_BYTES, PHYS_LOAD};
use std::{env, path::PathBuf};

// Sanity checks (fail fast during build)
const _: () = {
    assert!(
        PHYS_LOAD.is_multiple_of(FRAME_SIZE),
        "PHYS_LOAD must be 4 KiB aligned"
    );
    assert!(
        PHYS_LOAD + BOOT_STACK_SIZE + HEAP_SIZE < IDENTITY_MAP_BYTES,
        "kernel, stack and heap must fit in the identity window"
    );
};

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let ld = manifest_dir.join("linker.ld");

    println!("cargo:rerun-if-changed={}", ld.display());
    println!("cargo:rerun-if-changed=i686-kernel.json");

    // Host builds (unit tests) link normally.
    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("none") {
        return;
    }

    // Linker script
    println!("cargo:rustc-link-arg-bins=-T{}", ld.display());

    // Provide symbols to the linker script
    println!("cargo:rustc-link-arg-bins=--defsym=PHYS_LOAD={PHYS_LOAD:#x}");
    println!("cargo:rustc-link-arg-bins=--defsym=HEAP_SIZE={HEAP_SIZE:#x}");
    println!("cargo:rustc-link-arg-bins=--defsym=BOOT_STACK_SIZE={BOOT_STACK_SIZE:#x}");
}
