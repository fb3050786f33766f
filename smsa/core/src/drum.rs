//! In-memory drum array that executes packed command words.

use crate::command::{CommandWord, Opcode};
use crate::device::{BlockBuffer, CommandPort, DeviceFault};
use crate::geometry::{BLOCKS_PER_DRUM, BLOCK_SIZE, DRUM_SIZE, MAX_ADDRESS};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrumStats {
    pub mounts: u32,
    pub unmounts: u32,
    pub drum_seeks: u32,
    pub block_seeks: u32,
    pub block_reads: u32,
    pub block_writes: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub drum: u8,
    pub block: u8,
}

pub struct DrumArray {
    cells: Vec<u8>,
    cursor: Cursor,
    mounted: bool,
    stats: DrumStats,
}

impl Default for DrumArray {
    fn default() -> Self {
        Self::new()
    }
}

impl DrumArray {
    pub fn new() -> Self {
        Self {
            cells: vec![0; MAX_ADDRESS],
            cursor: Cursor::default(),
            mounted: false,
            stats: DrumStats::default(),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn stats(&self) -> DrumStats {
        self.stats
    }

    /// Raw view of every cell, indexed by virtual address.
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    fn block_range(&self) -> std::ops::Range<usize> {
        let start = self.cursor.drum as usize * DRUM_SIZE + self.cursor.block as usize * BLOCK_SIZE;
        start..start + BLOCK_SIZE
    }

    // The drum cursor stays put; callers seek the next drum themselves.
    fn advance_block(&mut self) {
        self.cursor.block = ((self.cursor.block as usize + 1) % BLOCKS_PER_DRUM) as u8;
    }
}

impl CommandPort for DrumArray {
    fn execute(
        &mut self,
        command: CommandWord,
        block: BlockBuffer<'_>,
    ) -> Result<(), DeviceFault> {
        let op = command
            .opcode()
            .ok_or(DeviceFault::InvalidOpcode(command.opcode_bits()))?;

        match op {
            Opcode::Mount => {
                if self.mounted {
                    return Err(DeviceFault::AlreadyMounted);
                }
                self.mounted = true;
                self.cursor = Cursor::default();
                self.stats.mounts = self.stats.mounts.wrapping_add(1);
            }
            _ if !self.mounted => return Err(DeviceFault::NotMounted),
            Opcode::Unmount => {
                self.mounted = false;
                self.stats.unmounts = self.stats.unmounts.wrapping_add(1);
            }
            Opcode::SeekDrum => {
                self.cursor.drum = command.drum();
                self.stats.drum_seeks = self.stats.drum_seeks.wrapping_add(1);
            }
            Opcode::SeekBlock => {
                self.cursor.block = command.block();
                self.stats.block_seeks = self.stats.block_seeks.wrapping_add(1);
            }
            Opcode::DiskRead => {
                let BlockBuffer::Fill(out) = block else {
                    return Err(DeviceFault::MissingBuffer);
                };
                let range = self.block_range();
                out.copy_from_slice(&self.cells[range]);
                self.advance_block();
                self.stats.block_reads = self.stats.block_reads.wrapping_add(1);
            }
            Opcode::DiskWrite => {
                let BlockBuffer::Source(data) = block else {
                    return Err(DeviceFault::MissingBuffer);
                };
                let range = self.block_range();
                self.cells[range].copy_from_slice(data);
                self.advance_block();
                self.stats.block_writes = self.stats.block_writes.wrapping_add(1);
            }
        }
        Ok(())
    }
}
