//! Boot-time allocator checks, enabled by the `selftest` feature.
//!
//! Runs on the fresh heap before paging is turned on and leaves every frame
//! it touched free again.

use crate::fatal::FatalError;
use crate::init::HeapReady;
use kernel_alloc::FreeRejected;
use kernel_info::memory::FRAME_SIZE;
use kernel_memory_addresses::{PhysicalPage, Size4K};
use kernel_vmem::PhysMapper;
use log::info;

/// Run every check, failing on the first one that does not hold.
///
/// # Errors
/// [`FatalError::SelfTest`] naming the failed check.
pub fn run<M: PhysMapper>(ready: &mut HeapReady<M>) -> Result<(), FatalError> {
    let free_before = ready.frames().free_frames();

    reallocation_reuses_the_frame(ready)?;
    frames_do_not_overlap(ready)?;
    double_free_is_rejected(ready)?;

    check(
        ready.frames().free_frames() == free_before,
        "frames leaked by the self-test",
    )?;
    info!("Allocator self-test passed");
    Ok(())
}

fn reallocation_reuses_the_frame<M: PhysMapper>(ready: &mut HeapReady<M>) -> Result<(), FatalError> {
    let first = take(ready)?;
    check(ready.free_frame(first.base()).is_ok(), "free of a taken frame")?;
    let again = take(ready)?;
    check(again == first, "first fit after free")?;
    check(ready.free_frame(again.base()).is_ok(), "free after reallocation")
}

fn frames_do_not_overlap<M: PhysMapper>(ready: &mut HeapReady<M>) -> Result<(), FatalError> {
    let a = take(ready)?;
    let b = take(ready)?;
    check(a != b, "distinct frames")?;

    fill(ready, a, 0xAA);
    fill(ready, b, 0x55);
    check(holds(ready, a, 0xAA), "pattern of the first frame")?;
    check(holds(ready, b, 0x55), "pattern of the second frame")?;

    check(ready.free_frame(a.base()).is_ok(), "free of the first frame")?;
    check(ready.free_frame(b.base()).is_ok(), "free of the second frame")
}

fn double_free_is_rejected<M: PhysMapper>(ready: &mut HeapReady<M>) -> Result<(), FatalError> {
    let frame = take(ready)?;
    check(ready.free_frame(frame.base()).is_ok(), "first free")?;
    check(
        ready.free_frame(frame.base()) == Err(FreeRejected::AlreadyFree(frame.base())),
        "second free is rejected",
    )
}

fn take<M: PhysMapper>(ready: &mut HeapReady<M>) -> Result<PhysicalPage<Size4K>, FatalError> {
    ready
        .allocate_frame(1)
        .ok_or(FatalError::SelfTest("allocation from a fresh heap"))
}

fn fill<M: PhysMapper>(ready: &HeapReady<M>, page: PhysicalPage<Size4K>, byte: u8) {
    // SAFETY: the frame is taken by the self-test and referenced nowhere else.
    unsafe {
        ready
            .frames()
            .mapper()
            .phys_to_bytes_mut(page.base(), FRAME_SIZE as usize)
    }
    .fill(byte);
}

fn holds<M: PhysMapper>(ready: &HeapReady<M>, page: PhysicalPage<Size4K>, byte: u8) -> bool {
    // SAFETY: as in `fill`.
    unsafe {
        ready
            .frames()
            .mapper()
            .phys_to_bytes(page.base(), FRAME_SIZE as usize)
    }
    .iter()
    .all(|&b| b == byte)
}

const fn check(ok: bool, what: &'static str) -> Result<(), FatalError> {
    if ok { Ok(()) } else { Err(FatalError::SelfTest(what)) }
}
