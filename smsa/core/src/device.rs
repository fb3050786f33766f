//! Device seams.
//!
//! [`CommandPort`] is the raw device contract: one packed command word, an
//! optional block buffer, success or failure. [`Device`] is the operation-level
//! view the address translator drives; [`CommandAdapter`] implements it over any
//! port by encoding each call into a [`CommandWord`].

use crate::command::{CommandWord, Opcode};
use crate::geometry::BLOCK_SIZE;
use crate::{Result, SmsaError};
use thiserror::Error;

pub type Block = [u8; BLOCK_SIZE];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceFault {
    #[error("device is not mounted")]
    NotMounted,
    #[error("device is already mounted")]
    AlreadyMounted,
    #[error("operation requires a block buffer")]
    MissingBuffer,
    #[error("invalid opcode bits 0x{0:02X}")]
    InvalidOpcode(u32),
}

/// Buffer handed to [`CommandPort::execute`]. Reads fill it, writes consume it.
pub enum BlockBuffer<'a> {
    None,
    Fill(&'a mut Block),
    Source(&'a Block),
}

pub trait CommandPort {
    /// Executes one command. Block reads and writes advance the port's own block
    /// cursor as a side effect.
    fn execute(
        &mut self,
        command: CommandWord,
        block: BlockBuffer<'_>,
    ) -> std::result::Result<(), DeviceFault>;
}

/// Operation-level device interface with an implicit drum/block cursor.
pub trait Device {
    fn mount(&mut self) -> Result<()>;
    fn unmount(&mut self) -> Result<()>;
    fn seek_drum(&mut self, drum: u8) -> Result<()>;
    fn seek_block(&mut self, block: u8) -> Result<()>;
    /// Reads the block under the cursor, then advances the block cursor.
    fn read_block(&mut self, out: &mut Block) -> Result<()>;
    /// Writes the block under the cursor, then advances the block cursor.
    fn write_block(&mut self, data: &Block) -> Result<()>;
}

pub struct CommandAdapter<P> {
    port: P,
}

impl<P: CommandPort> CommandAdapter<P> {
    pub fn new(port: P) -> Self {
        Self { port }
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    fn issue(&mut self, op: Opcode, drum: u8, block: u8, buffer: BlockBuffer<'_>) -> Result<()> {
        let command = CommandWord::encode(op, drum, block);
        log::trace!("issue {command:?}");
        self.port
            .execute(command, buffer)
            .map_err(|fault| SmsaError::Device { op, fault })
    }
}

impl<P: CommandPort> Device for CommandAdapter<P> {
    fn mount(&mut self) -> Result<()> {
        self.issue(Opcode::Mount, 0, 0, BlockBuffer::None)
    }

    fn unmount(&mut self) -> Result<()> {
        self.issue(Opcode::Unmount, 0, 0, BlockBuffer::None)
    }

    fn seek_drum(&mut self, drum: u8) -> Result<()> {
        self.issue(Opcode::SeekDrum, drum, 0, BlockBuffer::None)
    }

    fn seek_block(&mut self, block: u8) -> Result<()> {
        self.issue(Opcode::SeekBlock, 0, block, BlockBuffer::None)
    }

    fn read_block(&mut self, out: &mut Block) -> Result<()> {
        self.issue(Opcode::DiskRead, 0, 0, BlockBuffer::Fill(out))
    }

    fn write_block(&mut self, data: &Block) -> Result<()> {
        self.issue(Opcode::DiskWrite, 0, 0, BlockBuffer::Source(data))
    }
}
