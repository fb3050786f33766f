#![allow(dead_code)]

use smsa_core::{Block, CommandAdapter, Device, DeviceFault, DrumArray, Opcode, Result, SmsaError};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Mount,
    Unmount,
    SeekDrum(u8),
    SeekBlock(u8),
    Read,
    Write,
}

/// Wraps a simulated drum array, logging every device call and optionally
/// failing the N-th one (zero-based).
pub struct Recorder {
    inner: CommandAdapter<DrumArray>,
    pub ops: Vec<Op>,
    pub fail_at: Option<usize>,
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            inner: CommandAdapter::new(DrumArray::new()),
            ops: Vec::new(),
            fail_at: None,
        }
    }

    /// Already mounted, with an empty log.
    pub fn mounted() -> Self {
        let mut rec = Self::new();
        rec.inner.mount().unwrap();
        rec
    }

    pub fn array(&self) -> &DrumArray {
        self.inner.port()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    pub fn count(&self, op: Op) -> usize {
        self.ops.iter().filter(|o| **o == op).count()
    }

    fn record(&mut self, op: Op, opcode: Opcode) -> Result<()> {
        let index = self.ops.len();
        self.ops.push(op);
        if self.fail_at == Some(index) {
            return Err(SmsaError::Device {
                op: opcode,
                fault: DeviceFault::NotMounted,
            });
        }
        Ok(())
    }
}

impl Device for Recorder {
    fn mount(&mut self) -> Result<()> {
        self.record(Op::Mount, Opcode::Mount)?;
        self.inner.mount()
    }

    fn unmount(&mut self) -> Result<()> {
        self.record(Op::Unmount, Opcode::Unmount)?;
        self.inner.unmount()
    }

    fn seek_drum(&mut self, drum: u8) -> Result<()> {
        self.record(Op::SeekDrum(drum), Opcode::SeekDrum)?;
        self.inner.seek_drum(drum)
    }

    fn seek_block(&mut self, block: u8) -> Result<()> {
        self.record(Op::SeekBlock(block), Opcode::SeekBlock)?;
        self.inner.seek_block(block)
    }

    fn read_block(&mut self, out: &mut Block) -> Result<()> {
        self.record(Op::Read, Opcode::DiskRead)?;
        self.inner.read_block(out)
    }

    fn write_block(&mut self, data: &Block) -> Result<()> {
        self.record(Op::Write, Opcode::DiskWrite)?;
        self.inner.write_block(data)
    }
}

/// Per-test store path under the system temp dir; removed on creation.
pub fn temp_store(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("smsa-{}-{name}.bin", std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}

pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}
