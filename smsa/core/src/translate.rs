//! Virtual address translation over a block device.
//!
//! Every request seeks the device explicitly, then walks block by block. The
//! device advances its block cursor after each transfer, and the translator
//! keeps a local copy of that cursor so it knows when a drum boundary is
//! crossed.

use crate::device::{Block, Device};
use crate::geometry::{check_range, VirtualAddress, BLOCK_SIZE, LAST_BLOCK};
use crate::Result;
use std::ops::Range;

/// Bytes of a touched block that belong to the request.
///
/// `is_last` means the request ends strictly inside this block; a request
/// ending exactly on a block boundary never produces a last block.
pub fn block_byte_range(
    is_first: bool,
    is_last: bool,
    start_offset: usize,
    end_offset: usize,
) -> Range<usize> {
    match (is_first, is_last) {
        (true, true) => start_offset..end_offset,
        (true, false) => start_offset..BLOCK_SIZE,
        (false, true) => 0..end_offset,
        (false, false) => 0..BLOCK_SIZE,
    }
}

/// Name of the [`block_byte_range`] case, for per-block tracing.
fn block_case(is_first: bool, is_last: bool) -> &'static str {
    match (is_first, is_last) {
        (true, true) => "single",
        (true, false) => "head",
        (false, true) => "tail",
        (false, false) => "interior",
    }
}

/// Walk state shared by the read and write paths.
struct BlockWalk {
    drum: u8,
    block: u8,
    start_offset: usize,
    end_offset: usize,
    remaining: usize,
    first: bool,
}

impl BlockWalk {
    fn new(addr: u32, len: usize) -> Self {
        let start = VirtualAddress::new(addr);
        Self {
            drum: start.drum(),
            block: start.block(),
            start_offset: start.offset(),
            end_offset: (start.offset() + len) % BLOCK_SIZE,
            remaining: len,
            first: true,
        }
    }

    /// Whether the request ends strictly inside the current block.
    fn is_last(&self) -> bool {
        let lead = if self.first { self.start_offset } else { 0 };
        lead + self.remaining < BLOCK_SIZE
    }

    /// Range of the current block covered by the request, then consumes it.
    fn take(&mut self) -> Range<usize> {
        let is_last = self.is_last();
        let span = block_byte_range(self.first, is_last, self.start_offset, self.end_offset);
        log::debug!(
            "drum={} block=0x{:02X} remaining=0x{:X} case={} span={:?}",
            self.drum,
            self.block,
            self.remaining,
            block_case(self.first, is_last),
            span
        );
        self.first = false;
        self.remaining -= span.len();
        span
    }

    /// Moves the local cursor past the block just transferred. Returns true when
    /// the walk crossed into the next drum and still has bytes to move.
    fn step(&mut self) -> bool {
        let crossed = self.block == LAST_BLOCK;
        self.block = self.block.wrapping_add(1);
        if crossed {
            self.drum = self.drum.wrapping_add(1);
        }
        crossed && self.remaining != 0
    }
}

/// Flat byte-addressed view over a [`Device`].
///
/// Not reentrant: the device cursor is shared state, so callers must serialise
/// access to a single address space.
pub struct AddressSpace<D> {
    device: D,
}

impl<D: Device> AddressSpace<D> {
    pub fn new(device: D) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    fn seek_start(&mut self, walk: &BlockWalk) -> Result<()> {
        self.device.seek_drum(walk.drum)?;
        self.device.seek_block(walk.block)
    }

    fn seek_next_drum(&mut self, walk: &BlockWalk) -> Result<()> {
        log::debug!("rolling over to drum {}", walk.drum);
        self.device.seek_drum(walk.drum)?;
        self.device.seek_block(0)
    }

    /// Fills `buf` with the bytes at `[addr, addr + buf.len())`.
    ///
    /// A device failure aborts the transfer; bytes already copied into `buf`
    /// stay there.
    pub fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        check_range(addr, buf.len())?;
        let mut walk = BlockWalk::new(addr, buf.len());
        self.seek_start(&walk)?;

        let mut staged: Block = [0; BLOCK_SIZE];
        let mut copied = 0usize;
        while walk.remaining != 0 {
            self.device.read_block(&mut staged)?;
            let span = walk.take();
            let next = copied + span.len();
            buf[copied..next].copy_from_slice(&staged[span]);
            copied = next;

            if walk.step() {
                self.seek_next_drum(&walk)?;
            }
        }
        Ok(())
    }

    /// Stores `data` at `[addr, addr + data.len())`.
    ///
    /// Each touched block is read, patched and written back in place. Blocks
    /// written before a device failure are not rolled back.
    pub fn write(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        check_range(addr, data.len())?;
        let mut walk = BlockWalk::new(addr, data.len());
        self.seek_start(&walk)?;

        let mut staged: Block = [0; BLOCK_SIZE];
        let mut consumed = 0usize;
        while walk.remaining != 0 {
            self.device.read_block(&mut staged)?;
            let block = walk.block;
            let span = walk.take();
            let next = consumed + span.len();
            staged[span].copy_from_slice(&data[consumed..next]);
            consumed = next;

            // The read moved the cursor past this block.
            self.device.seek_block(block)?;
            self.device.write_block(&staged)?;

            if walk.step() {
                self.seek_next_drum(&walk)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // (first, last, start, end) -> expected range
    const CASES: &[(bool, bool, usize, usize, Range<usize>)] = &[
        // Whole request inside one block.
        (true, true, 10, 20, 10..20),
        (true, true, 0, 1, 0..1),
        (true, true, 255, 255, 255..255),
        // First block of a longer request.
        (true, false, 200, 44, 200..256),
        (true, false, 0, 0, 0..256),
        (true, false, 255, 0, 255..256),
        // Tail of a multi-block request.
        (false, true, 0, 1, 0..1),
        (false, true, 0, 255, 0..255),
        // Interior block.
        (false, false, 17, 33, 0..256),
    ];

    #[test]
    fn byte_range_cases() {
        for (first, last, start, end, expected) in CASES {
            assert_eq!(
                block_byte_range(*first, *last, *start, *end),
                expected.clone(),
                "first={first} last={last} start={start} end={end}"
            );
        }
    }

    #[test]
    fn case_names_follow_walk_position() {
        let mut walk = BlockWalk::new(200, 400);
        let mut names = Vec::new();
        while walk.remaining != 0 {
            names.push(block_case(walk.first, walk.is_last()));
            walk.take();
            walk.step();
        }
        assert_eq!(names, ["head", "interior", "tail"]);
        assert_eq!(block_case(true, true), "single");
    }

    fn spans(addr: u32, len: usize) -> Vec<(u8, u8, Range<usize>)> {
        let mut walk = BlockWalk::new(addr, len);
        let mut out = Vec::new();
        while walk.remaining != 0 {
            let (drum, block) = (walk.drum, walk.block);
            out.push((drum, block, walk.take()));
            walk.step();
        }
        out
    }

    #[test]
    fn walk_single_block() {
        assert_eq!(spans(0x1234, 8), vec![(0, 0x12, 0x34..0x3C)]);
    }

    #[test]
    fn walk_zero_length_touches_nothing() {
        assert!(spans(0x1234, 0).is_empty());
    }

    #[test]
    fn walk_end_aligned_has_no_empty_tail() {
        assert_eq!(spans(200, 56), vec![(0, 0, 200..256)]);
        assert_eq!(spans(0, 512), vec![(0, 0, 0..256), (0, 1, 0..256)]);
        assert_eq!(spans(200, 312), vec![(0, 0, 200..256), (0, 1, 0..256)]);
    }

    #[test]
    fn walk_partial_head_and_tail() {
        assert_eq!(
            spans(200, 300),
            vec![(0, 0, 200..256), (0, 1, 0..244)]
        );
    }

    #[test]
    fn walk_crosses_drum_boundary() {
        let addr = (0xFF * BLOCK_SIZE + 250) as u32;
        assert_eq!(
            spans(addr, 20),
            vec![(0, 0xFF, 250..256), (1, 0, 0..14)]
        );
    }

    #[test]
    fn step_reports_rollover_only_with_bytes_left() {
        let mut walk = BlockWalk::new((0xFF * BLOCK_SIZE) as u32, BLOCK_SIZE);
        walk.take();
        assert!(!walk.step());

        let mut walk = BlockWalk::new((0xFF * BLOCK_SIZE) as u32, BLOCK_SIZE + 1);
        walk.take();
        assert!(walk.step());
        assert_eq!((walk.drum, walk.block), (1, 0));
    }
}
