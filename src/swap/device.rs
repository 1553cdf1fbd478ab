//! File-backed swap device for arena regions.
//!
//! One device owns one backing file sized to a planned arena. Callers
//! bring planned regions into RAM with [`SwapDevice::acquire`], touch
//! the bytes through the returned handle, and push them back out with
//! [`SwapDevice::release`]. Training runs treat the file as scratch and
//! delete it at teardown; inference runs open a persisted artifact and
//! leave it intact.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::backing::{self, Backing, BackingKind};
use super::platform;
use super::preload::{WeightId, WeightPreloadTable};

/// Which engine phase the device serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Scratch lifecycle: the file is carved fresh at start and removed
    /// at finish.
    Train,
    /// Persisted lifecycle: the file outlives the device and may be
    /// preloaded by weight id.
    Inference,
}

/// Device tuning, normally loaded from the environment.
#[derive(Debug, Clone)]
pub struct SwapConfig {
    /// Byte-movement strategy for acquired buffers.
    pub backing: BackingKind,
    /// Pin preload windows into physical memory while copying.
    pub pin_preload: bool,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            backing: BackingKind::default(),
            pin_preload: true,
        }
    }
}

/// Opaque ticket for one outstanding buffer.
///
/// Handles are never reused within a device's lifetime, so a stale
/// handle fails to resolve instead of touching someone else's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(u64);

#[derive(Debug)]
struct OutstandingBuffer {
    backing: Backing,
    offset: u64,
    size: usize,
}

/// Swap device failures.
///
/// Usage errors (stale handles, overlapping ranges, unknown weight ids)
/// point at a caller bug and are kept apart from I/O failures, which
/// carry the OS error text.
#[derive(Debug, Error)]
pub enum SwapError {
    #[error("Device is not started")]
    NotStarted,

    #[error("Backing size must be non-zero in training mode")]
    EmptyArena,

    #[error("Zero-size buffer request")]
    ZeroSize,

    #[error("Range [{offset}, {offset} + {size}) exceeds device capacity {capacity}")]
    OutOfBounds {
        offset: u64,
        size: usize,
        capacity: u64,
    },

    #[error("Preload is only available in inference mode")]
    WrongMode,

    #[error("Preload destination holds {got} bytes, weight needs {needed}")]
    DestinationTooSmall { needed: usize, got: usize },

    #[error("No outstanding buffer for handle {0}")]
    UnknownHandle(u64),

    #[error("Range [{offset}, {offset} + {size}) overlaps an outstanding buffer")]
    OverlappingAcquire { offset: u64, size: usize },

    #[error("No preload entry for weight id {0}")]
    UnknownWeight(u32),

    #[error("Swap I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl SwapError {
    /// True for errors that indicate a caller bug rather than an
    /// environment fault.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownHandle(_) | Self::OverlappingAcquire { .. } | Self::UnknownWeight(_)
        )
    }
}

/// File-backed swap device.
///
/// Not internally synchronized; wrap it in a lock if shared across
/// threads.
#[derive(Debug)]
pub struct SwapDevice {
    path: PathBuf,
    config: SwapConfig,
    mode: ExecutionMode,
    file: Option<File>,
    capacity: u64,
    outstanding: HashMap<u64, OutstandingBuffer>,
    next_handle: u64,
    preload_table: WeightPreloadTable,
}

impl SwapDevice {
    /// Device over `path` with default tuning.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_config(path, SwapConfig::default())
    }

    pub fn with_config(path: impl Into<PathBuf>, config: SwapConfig) -> Self {
        Self {
            path: path.into(),
            config,
            mode: ExecutionMode::Train,
            file: None,
            capacity: 0,
            outstanding: HashMap::new(),
            next_handle: 1,
            preload_table: WeightPreloadTable::new(),
        }
    }

    /// Install the weight lookup table used by [`preload`](Self::preload).
    pub fn set_preload_table(&mut self, table: WeightPreloadTable) {
        self.preload_table = table;
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Backing file size in bytes; 0 while closed.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Number of buffers acquired but not yet released.
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    /// Open the backing file. Idempotent: a second call on an open
    /// device changes nothing.
    ///
    /// Training mode truncates the file and carves a sparse region of
    /// exactly `size` bytes so later random-offset writes never extend
    /// it mid-step. Inference mode opens the existing artifact and takes
    /// its current length as the capacity; `size` is ignored.
    pub fn start(&mut self, size: u64, mode: ExecutionMode) -> Result<(), SwapError> {
        if self.file.is_some() {
            return Ok(());
        }

        let file = match mode {
            ExecutionMode::Train => {
                if size == 0 {
                    return Err(SwapError::EmptyArena);
                }
                let mut file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(&self.path)?;
                file.seek(SeekFrom::Start(size - 1))?;
                file.write_all(&[0u8])?;
                file.seek(SeekFrom::Start(0))?;
                self.capacity = size;
                file
            }
            ExecutionMode::Inference => {
                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .open(&self.path)?;
                self.capacity = file.metadata()?.len();
                file
            }
        };

        self.mode = mode;
        self.file = Some(file);
        tracing::debug!(
            path = %self.path.display(),
            capacity = self.capacity,
            mode = ?self.mode,
            "swap device started"
        );
        Ok(())
    }

    /// Bring the region `[offset, offset + size)` into RAM and register
    /// it as outstanding.
    ///
    /// With `alloc_only` the region's current file content is not
    /// loaded; the caller gets scratch bytes it intends to overwrite.
    /// Ranges overlapping an outstanding buffer are rejected, as are
    /// ranges beyond the device capacity.
    pub fn acquire(
        &mut self,
        offset: u64,
        size: usize,
        alloc_only: bool,
    ) -> Result<BufferHandle, SwapError> {
        let file = self.file.as_mut().ok_or(SwapError::NotStarted)?;
        if size == 0 {
            return Err(SwapError::ZeroSize);
        }
        let end = offset
            .checked_add(size as u64)
            .filter(|&end| end <= self.capacity)
            .ok_or(SwapError::OutOfBounds {
                offset,
                size,
                capacity: self.capacity,
            })?;
        if self
            .outstanding
            .values()
            .any(|buf| ranges_intersect(buf.offset, buf.size, offset, size))
        {
            return Err(SwapError::OverlappingAcquire { offset, size });
        }

        let backing = match self.config.backing {
            BackingKind::Mapped => {
                // The mapping faults pages in lazily, so there is no
                // separate load to skip for alloc_only.
                let (map, pad) = backing::map_window(file, offset, size)?;
                Backing::Mapped { map, pad }
            }
            BackingKind::Buffered => {
                let mut data = vec![0u8; size];
                if !alloc_only {
                    backing::read_into(file, offset, &mut data)?;
                    metrics::counter!("swapcore_swap_in_bytes").increment(size as u64);
                }
                Backing::Buffered { data }
            }
        };

        let handle = BufferHandle(self.next_handle);
        self.next_handle += 1;
        self.outstanding.insert(
            handle.0,
            OutstandingBuffer {
                backing,
                offset,
                size,
            },
        );
        tracing::trace!(handle = handle.0, offset, size, end, "buffer acquired");
        Ok(handle)
    }

    /// Bytes of an outstanding buffer.
    pub fn buffer(&self, handle: BufferHandle) -> Result<&[u8], SwapError> {
        self.outstanding
            .get(&handle.0)
            .map(|buf| buf.backing.bytes(buf.size))
            .ok_or(SwapError::UnknownHandle(handle.0))
    }

    /// Mutable bytes of an outstanding buffer.
    pub fn buffer_mut(&mut self, handle: BufferHandle) -> Result<&mut [u8], SwapError> {
        self.outstanding
            .get_mut(&handle.0)
            .map(|buf| buf.backing.bytes_mut(buf.size))
            .ok_or(SwapError::UnknownHandle(handle.0))
    }

    /// Write an outstanding buffer back to its file range and drop its
    /// in-memory backing.
    ///
    /// With `dealloc_only` the write-back is skipped and the bytes are
    /// discarded. On a write-back failure the buffer stays registered so
    /// the caller can retry or abort cleanly.
    pub fn release(&mut self, handle: BufferHandle, dealloc_only: bool) -> Result<(), SwapError> {
        let file = self.file.as_mut().ok_or(SwapError::NotStarted)?;
        let buf = self
            .outstanding
            .remove(&handle.0)
            .ok_or(SwapError::UnknownHandle(handle.0))?;

        if !dealloc_only {
            if let Err(err) = backing::write_back(file, buf.offset, buf.backing.bytes(buf.size)) {
                self.outstanding.insert(handle.0, buf);
                return Err(err.into());
            }
            metrics::counter!("swapcore_swap_out_bytes").increment(buf.size as u64);
        }

        if let Backing::Mapped { map, .. } = &buf.backing {
            platform::advise_discardable(map);
        }
        tracing::trace!(handle = handle.0, offset = buf.offset, size = buf.size, dealloc_only, "buffer released");
        Ok(())
    }

    /// Stream a persisted weight region into `dest` in one shot.
    ///
    /// Inference mode only. The window is released before returning, so
    /// nothing stays outstanding; returns the number of bytes copied.
    pub fn preload(&mut self, id: WeightId, dest: &mut [u8]) -> Result<usize, SwapError> {
        let file = self.file.as_mut().ok_or(SwapError::NotStarted)?;
        if self.mode != ExecutionMode::Inference {
            return Err(SwapError::WrongMode);
        }
        let entry = self
            .preload_table
            .get(id)
            .ok_or(SwapError::UnknownWeight(id.0))?;
        if dest.len() < entry.len {
            return Err(SwapError::DestinationTooSmall {
                needed: entry.len,
                got: dest.len(),
            });
        }
        entry
            .offset
            .checked_add(entry.len as u64)
            .filter(|&end| end <= self.capacity)
            .ok_or(SwapError::OutOfBounds {
                offset: entry.offset,
                size: entry.len,
                capacity: self.capacity,
            })?;

        match self.config.backing {
            BackingKind::Mapped => {
                let (map, pad) = backing::map_window(file, entry.offset, entry.len)?;
                platform::advise_sequential(&map);
                if self.config.pin_preload {
                    platform::pin_resident(&map);
                }
                dest[..entry.len].copy_from_slice(&map[pad..pad + entry.len]);
                // The mapping unwinds here; the copy in dest is the only
                // thing that survives the call.
            }
            BackingKind::Buffered => {
                backing::read_into(file, entry.offset, &mut dest[..entry.len])?;
            }
        }

        metrics::counter!("swapcore_preload_bytes").increment(entry.len as u64);
        tracing::trace!(weight = id.0, offset = entry.offset, len = entry.len, "weight preloaded");
        Ok(entry.len)
    }

    /// Close the backing file. Idempotent: finishing a closed device is
    /// a no-op.
    ///
    /// Buffers still outstanding are dropped without write-back.
    /// Training mode removes the file; inference mode leaves it intact.
    pub fn finish(&mut self) -> Result<(), SwapError> {
        let Some(file) = self.file.take() else {
            return Ok(());
        };

        if !self.outstanding.is_empty() {
            tracing::warn!(
                leaked = self.outstanding.len(),
                "buffers still outstanding at teardown, dropping without write-back"
            );
        }
        self.outstanding.clear();
        self.capacity = 0;
        drop(file);

        if self.mode == ExecutionMode::Train {
            std::fs::remove_file(&self.path)?;
        }
        tracing::debug!(path = %self.path.display(), mode = ?self.mode, "swap device finished");
        Ok(())
    }
}

impl Drop for SwapDevice {
    fn drop(&mut self) {
        if self.file.is_some() {
            if let Err(err) = self.finish() {
                tracing::warn!(path = %self.path.display(), error = %err, "swap device teardown failed");
            }
        }
    }
}

fn ranges_intersect(a_off: u64, a_len: usize, b_off: u64, b_len: usize) -> bool {
    a_off < b_off + b_len as u64 && b_off < a_off + a_len as u64
}
