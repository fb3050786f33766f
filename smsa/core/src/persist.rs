//! Backing store for the address space.
//!
//! The store is a flat image of exactly `MAX_ADDRESS` bytes, byte `i` holding
//! virtual address `i`. Anything else is treated as absent and reformatted.

use crate::device::Device;
use crate::geometry::MAX_ADDRESS;
use crate::translate::AddressSpace;
use crate::{Result, SmsaError};
use serde::Serialize;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MountReport {
    /// The store was missing or wrongly sized and has been zero-filled.
    pub reformatted: bool,
    /// Size of the store before mounting; zero when it had to be created.
    pub previous_len: u64,
}

fn store_error(path: &Path) -> impl FnOnce(io::Error) -> SmsaError + '_ {
    move |source| SmsaError::Store {
        path: path.to_path_buf(),
        source,
    }
}

fn open_or_create(path: &Path) -> Result<File> {
    match File::open(path) {
        Ok(file) => Ok(file),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            log::warn!("{} does not exist, creating a new store", path.display());
            File::create(path).map_err(store_error(path))
        }
        Err(err) => Err(store_error(path)(err)),
    }
}

/// Mounts the device and primes the whole address space from `path`.
pub fn load_store<D: Device>(space: &mut AddressSpace<D>, path: &Path) -> Result<MountReport> {
    log::info!("opening store {}", path.display());
    let mut file = open_or_create(path)?;

    space.device_mut().mount()?;

    let previous_len = file.metadata().map_err(store_error(path))?.len();
    let mut image = vec![0u8; MAX_ADDRESS];
    let reformatted = previous_len != MAX_ADDRESS as u64;
    if reformatted {
        if previous_len != 0 {
            log::warn!(
                "{} is not sized properly (size=0x{previous_len:X}), reformatting",
                path.display()
            );
        }
    } else {
        file.read_exact(&mut image).map_err(store_error(path))?;
    }
    drop(file);

    space.write(0, &image)?;
    log::info!(
        "mounted {} ({})",
        path.display(),
        if reformatted { "formatted" } else { "loaded" }
    );
    Ok(MountReport {
        reformatted,
        previous_len,
    })
}

/// Drains the whole address space, unmounts the device and overwrites `path`.
/// Returns the number of bytes written.
pub fn save_store<D: Device>(space: &mut AddressSpace<D>, path: &Path) -> Result<usize> {
    log::info!("saving store {}", path.display());
    let mut image = vec![0u8; MAX_ADDRESS];
    space.read(0, &mut image)?;
    space.device_mut().unmount()?;

    let mut file = File::create(path).map_err(store_error(path))?;
    file.write_all(&image).map_err(store_error(path))?;
    file.sync_all().map_err(store_error(path))?;
    log::info!("{} written (bytes=0x{:X})", path.display(), image.len());
    Ok(image.len())
}
