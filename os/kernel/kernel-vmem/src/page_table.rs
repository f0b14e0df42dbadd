//! # Paging Structures
//!
//! | Level | Type | Index bits | Entry |
//! |-------|------|------------|-------|
//! | 2 | [`PageDirectory`] | VA `[31:22]` | [`PdEntry`] |
//! | 1 | [`PageTable`] | VA `[21:12]` | [`PtEntry`] |
//!
//! Both are 1024 entries of 4 bytes, i.e. exactly one 4 KiB frame.

pub mod pd;
pub mod pt;

pub use pd::{PageDirectory, PdEntry, PdIndex};
pub use pt::{PageTable, PtEntry, PtIndex};

const _: () = {
    assert!(size_of::<PageDirectory>() == crate::info::FRAME_SIZE as usize);
    assert!(size_of::<PageTable>() == crate::info::FRAME_SIZE as usize);
    assert!(align_of::<PageTable>() == crate::info::FRAME_SIZE as usize);
};
