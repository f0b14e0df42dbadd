use kernel_alloc::{FrameAllocator, FrameState, FreeRejected, HeapRegion};
use kernel_info::memory::FRAME_SIZE;
use kernel_memory_addresses::{PhysicalAddress, PhysicalPage, Size4K};
use kernel_vmem::FrameAlloc;
use kernel_vmem::testing::PhysArena;
use std::collections::HashSet;

const BASE: u32 = 0x0020_0000;
const FRAMES: usize = 16;

fn setup(arena: &PhysArena) -> FrameAllocator<&PhysArena> {
    let heap = HeapRegion::new(arena.base(), arena.end()).unwrap();
    unsafe { FrameAllocator::initialize(arena, heap) }
}

fn is_zeroed(arena: &PhysArena, page: PhysicalPage<Size4K>) -> bool {
    arena
        .read(page.base(), FRAME_SIZE as usize)
        .iter()
        .all(|&b| b == 0)
}

#[test]
fn allocations_are_aligned_and_inside_usable_range() {
    let arena = PhysArena::new(BASE, FRAMES);
    let mut alloc = setup(&arena);
    let first_usable = alloc.heap_start().as_u32() + FRAME_SIZE;

    while let Some(page) = alloc.allocate(1) {
        let addr = page.base().as_u32();
        assert_eq!(addr % FRAME_SIZE, 0);
        assert!(addr >= first_usable);
        assert!(addr < alloc.heap_end().as_u32());
    }
}

#[test]
fn reused_frames_come_back_zeroed() {
    let arena = PhysArena::new(BASE, FRAMES);
    let mut alloc = setup(&arena);

    let page = alloc.allocate(1).unwrap();
    arena.fill_frame(page, 0x5A);
    assert!(!is_zeroed(&arena, page));

    alloc.free(page.base()).unwrap();
    let again = alloc.allocate(1).unwrap();
    assert_eq!(again, page);
    assert!(is_zeroed(&arena, again));
}

#[test]
fn allocations_never_alias() {
    let arena = PhysArena::new(BASE, FRAMES);
    let mut alloc = setup(&arena);

    let a = alloc.allocate(1).unwrap();
    let b = alloc.allocate(1).unwrap();
    assert_ne!(a, b);

    arena.fill_frame(a, 0xAA);
    arena.fill_frame(b, 0x55);
    assert!(arena.read(a.base(), FRAME_SIZE as usize).iter().all(|&x| x == 0xAA));
    assert!(arena.read(b.base(), FRAME_SIZE as usize).iter().all(|&x| x == 0x55));

    let mut seen = HashSet::from([a, b]);
    while let Some(page) = alloc.allocate(1) {
        assert!(seen.insert(page), "{page} handed out twice");
    }
    assert_eq!(seen.len(), FRAMES - 1);
}

#[test]
fn exhaustion_and_recovery() {
    let arena = PhysArena::new(BASE, FRAMES);
    let mut alloc = setup(&arena);
    assert_eq!(alloc.usable_frames(), FRAMES - 1);

    let pages: Vec<_> = (0..alloc.usable_frames())
        .map(|_| alloc.allocate(1).expect("frame available"))
        .collect();
    assert_eq!(alloc.allocate(1), None);
    assert_eq!(alloc.free_frames(), 0);

    let victim = pages[FRAMES / 2];
    alloc.free(victim.base()).unwrap();
    assert_eq!(alloc.allocate(1), Some(victim));
    assert_eq!(alloc.allocate(1), None);
}

#[test]
fn last_frame_is_usable() {
    let arena = PhysArena::new(BASE, FRAMES);
    let mut alloc = setup(&arena);

    let mut last = None;
    while let Some(page) = alloc.allocate(1) {
        last = Some(page);
    }
    let last = last.unwrap();
    assert_eq!(last.base().as_u32(), alloc.heap_end().as_u32() - FRAME_SIZE);

    arena.fill_frame(last, 0xFF);
    alloc.free(last.base()).unwrap();
    assert_eq!(alloc.allocate(1), Some(last));
}

#[test]
fn double_free_keeps_bookkeeping_intact() {
    let arena = PhysArena::new(BASE, FRAMES);
    let mut alloc = setup(&arena);

    let a = alloc.allocate(1).unwrap();
    let b = alloc.allocate(1).unwrap();
    assert_eq!(alloc.free(a.base()), Ok(()));
    assert_eq!(alloc.free(a.base()), Err(FreeRejected::AlreadyFree(a.base())));

    assert_eq!(alloc.state_of(b.base()), Some(FrameState::Taken));
    assert_eq!(alloc.free_frames(), FRAMES - 2);

    let c = alloc.allocate(1).unwrap();
    assert_eq!(c, a);
    assert_ne!(c, b);
    assert!(is_zeroed(&arena, c));
}

#[test]
fn contiguous_runs_are_first_fit() {
    let arena = PhysArena::new(BASE, FRAMES);
    let mut alloc = setup(&arena);

    let frames: Vec<_> = (0..6).map(|_| alloc.allocate(1).unwrap()).collect();
    // Leave holes of one (frame 2) and two (frames 4, 5) frames.
    alloc.free(frames[1].base()).unwrap();
    alloc.free(frames[3].base()).unwrap();
    alloc.free(frames[4].base()).unwrap();

    let run = alloc.allocate(2).unwrap();
    assert_eq!(run, frames[3]);
    assert_eq!(alloc.state_of(frames[4].base()), Some(FrameState::Taken));

    let single = alloc.allocate(1).unwrap();
    assert_eq!(single, frames[1]);
}

#[test]
fn contiguous_run_is_zeroed_and_released_per_frame() {
    let arena = PhysArena::filled(BASE, FRAMES, 0xEE);
    let mut alloc = setup(&arena);

    let run = alloc.allocate(4).unwrap();
    assert!(
        arena
            .read(run.base(), 4 * FRAME_SIZE as usize)
            .iter()
            .all(|&b| b == 0)
    );

    let mut frame = run;
    for _ in 0..4 {
        assert_eq!(alloc.free(frame.base()), Ok(()));
        frame = frame.next().unwrap();
    }
    assert_eq!(alloc.free_frames(), FRAMES - 1);
}

#[test]
fn oversized_runs_fail_gracefully() {
    let arena = PhysArena::new(BASE, FRAMES);
    let mut alloc = setup(&arena);

    assert_eq!(alloc.allocate(FRAMES), None);
    assert!(alloc.allocate(FRAMES - 1).is_some());
    assert_eq!(alloc.allocate(1), None);
}

#[test]
fn frame_alloc_trait_hands_out_single_frames() {
    let arena = PhysArena::new(BASE, 3);
    let mut alloc = setup(&arena);

    let a = alloc.alloc_4k().unwrap();
    let b = alloc.alloc_4k().unwrap();
    assert_eq!(b.base(), PhysicalAddress::new(a.base().as_u32() + FRAME_SIZE));
    assert_eq!(alloc.alloc_4k(), None);
}
