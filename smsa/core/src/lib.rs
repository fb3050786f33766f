//! Flat virtual address space over a segmented drum array.
//!
//! The array is made of drums, each split into fixed-size blocks, and only
//! moves whole blocks under an auto-advancing cursor. [`AddressSpace`] turns
//! arbitrary byte ranges into seek/read/write sequences, and [`persist`] moves
//! the whole space to and from a flat backing file on mount and unmount.

use std::path::PathBuf;
use thiserror::Error;

pub mod command;
pub mod config;
pub mod device;
pub mod drum;
pub mod geometry;
pub mod persist;
pub mod translate;

pub use command::{CommandWord, Opcode};
pub use config::SmsaConfig;
pub use device::{Block, BlockBuffer, CommandAdapter, CommandPort, Device, DeviceFault};
pub use drum::{DrumArray, DrumStats};
pub use geometry::{
    VirtualAddress, BLOCKS_PER_DRUM, BLOCK_SIZE, DRUM_COUNT, GEOMETRY, MAX_ADDRESS,
};
pub use persist::{load_store, save_store, MountReport};
pub use translate::{block_byte_range, AddressSpace};

pub type Result<T> = std::result::Result<T, SmsaError>;

#[derive(Debug, Error)]
pub enum SmsaError {
    #[error("request 0x{addr:X}+0x{len:X} exceeds the 0x{:X}-byte address space", MAX_ADDRESS)]
    Range { addr: u32, len: usize },
    #[error("device {op:?} failed: {fault}")]
    Device {
        op: Opcode,
        #[source]
        fault: DeviceFault,
    },
    #[error("store {}: {source}", .path.display())]
    Store {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialize error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Address space plus the store it persists to.
pub struct SmsaRuntime<D> {
    config: SmsaConfig,
    space: AddressSpace<D>,
}

impl SmsaRuntime<CommandAdapter<DrumArray>> {
    /// Runtime over a fresh in-memory drum array.
    pub fn simulated(config: SmsaConfig) -> Self {
        Self::new(config, CommandAdapter::new(DrumArray::new()))
    }

    pub fn drum_stats(&self) -> DrumStats {
        self.space.device().port().stats()
    }
}

impl<D: Device> SmsaRuntime<D> {
    pub fn new(config: SmsaConfig, device: D) -> Self {
        Self {
            config,
            space: AddressSpace::new(device),
        }
    }

    pub fn config(&self) -> &SmsaConfig {
        &self.config
    }

    pub fn mount(&mut self) -> Result<MountReport> {
        persist::load_store(&mut self.space, &self.config.store_path)
    }

    /// Persists the space and unmounts; returns the bytes written to the store.
    pub fn unmount(&mut self) -> Result<usize> {
        persist::save_store(&mut self.space, &self.config.store_path)
    }

    pub fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        self.space.read(addr, buf)
    }

    pub fn write(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        self.space.write(addr, data)
    }
}
