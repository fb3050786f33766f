use crate::geometry::all_ones;
use serde::Serialize;
use std::fmt;

// Command word layout, high to low:
//  bits 26-31: opcode
//  bits 22-25: drum id
//  bits  8-21: reserved (always zero)
//  bits  0-7 : block id
pub const OPCODE_BITS: u32 = 6;
pub const DRUM_ID_BITS: u32 = 4;
pub const RESERVED_BITS: u32 = 14;
pub const BLOCK_FIELD_BITS: u32 = 8;

pub const BLOCK_FIELD_SHIFT: u32 = 0;
pub const DRUM_FIELD_SHIFT: u32 = BLOCK_FIELD_BITS + RESERVED_BITS;
pub const OPCODE_FIELD_SHIFT: u32 = DRUM_FIELD_SHIFT + DRUM_ID_BITS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Opcode {
    Mount = 0,
    Unmount = 1,
    SeekDrum = 2,
    SeekBlock = 3,
    DiskRead = 4,
    DiskWrite = 5,
}

impl Opcode {
    pub const ALL: [Opcode; 6] = [
        Opcode::Mount,
        Opcode::Unmount,
        Opcode::SeekDrum,
        Opcode::SeekBlock,
        Opcode::DiskRead,
        Opcode::DiskWrite,
    ];

    pub fn from_bits(bits: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| *op as u32 == bits)
    }
}

/// One packed device operation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandWord(u32);

impl CommandWord {
    /// Packs the fields, keeping only the low bits of `drum` and `block` that
    /// fit their fields.
    pub fn encode(op: Opcode, drum: u8, block: u8) -> Self {
        let mut word = 0u32;
        word |= (op as u32 & all_ones(OPCODE_BITS)) << OPCODE_FIELD_SHIFT;
        word |= (drum as u32 & all_ones(DRUM_ID_BITS)) << DRUM_FIELD_SHIFT;
        word |= (block as u32 & all_ones(BLOCK_FIELD_BITS)) << BLOCK_FIELD_SHIFT;
        Self(word)
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub fn opcode_bits(self) -> u32 {
        (self.0 >> OPCODE_FIELD_SHIFT) & all_ones(OPCODE_BITS)
    }

    pub fn opcode(self) -> Option<Opcode> {
        Opcode::from_bits(self.opcode_bits())
    }

    pub fn drum(self) -> u8 {
        ((self.0 >> DRUM_FIELD_SHIFT) & all_ones(DRUM_ID_BITS)) as u8
    }

    pub fn block(self) -> u8 {
        ((self.0 >> BLOCK_FIELD_SHIFT) & all_ones(BLOCK_FIELD_BITS)) as u8
    }
}

impl fmt::Debug for CommandWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CommandWord(0x{:08X} op={} drum={} block={})",
            self.0,
            self.opcode_bits(),
            self.drum(),
            self.block()
        )
    }
}
