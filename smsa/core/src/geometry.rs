//! Drum array geometry and virtual address decomposition.
//!
//! A virtual address is `drum | block | offset`, high to low. The field widths
//! below fix the size of the whole address space.

use crate::{Result, SmsaError};
use serde::Serialize;

pub const OFFSET_BITS: u32 = 8;
pub const BLOCK_ID_BITS: u32 = 8;
pub const DRUM_BITS: u32 = 4;

pub const BLOCK_SIZE: usize = 1 << OFFSET_BITS;
pub const BLOCKS_PER_DRUM: usize = 1 << BLOCK_ID_BITS;
pub const DRUM_COUNT: usize = 1 << DRUM_BITS;
pub const DRUM_SIZE: usize = BLOCKS_PER_DRUM * BLOCK_SIZE;
pub const MAX_ADDRESS: usize = DRUM_COUNT * DRUM_SIZE;

/// Last block id within a drum.
pub const LAST_BLOCK: u8 = (BLOCKS_PER_DRUM - 1) as u8;

const BLOCK_SHIFT: u32 = OFFSET_BITS;
const DRUM_SHIFT: u32 = OFFSET_BITS + BLOCK_ID_BITS;

/// Mask with the low `bits` bits set.
pub const fn all_ones(bits: u32) -> u32 {
    if bits >= u32::BITS {
        u32::MAX
    } else {
        (1u32 << bits) - 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualAddress(u32);

impl VirtualAddress {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn drum(self) -> u8 {
        ((self.0 >> DRUM_SHIFT) & all_ones(DRUM_BITS)) as u8
    }

    pub const fn block(self) -> u8 {
        ((self.0 >> BLOCK_SHIFT) & all_ones(BLOCK_ID_BITS)) as u8
    }

    pub const fn offset(self) -> usize {
        (self.0 & all_ones(OFFSET_BITS)) as usize
    }
}

/// Rejects `[addr, addr + len)` when it does not fit in the address space.
pub fn check_range(addr: u32, len: usize) -> Result<()> {
    let end = (addr as u64).checked_add(len as u64);
    match end {
        Some(end) if end <= MAX_ADDRESS as u64 => Ok(()),
        _ => Err(SmsaError::Range { addr, len }),
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct GeometryInfo {
    pub drum_count: usize,
    pub blocks_per_drum: usize,
    pub block_size: usize,
    pub max_address: usize,
}

pub const GEOMETRY: GeometryInfo = GeometryInfo {
    drum_count: DRUM_COUNT,
    blocks_per_drum: BLOCKS_PER_DRUM,
    block_size: BLOCK_SIZE,
    max_address: MAX_ADDRESS,
};
