//! Byte-movement strategies between the backing file and RAM.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

use memmap2::{MmapMut, MmapOptions};

use super::platform;

/// How a device moves region bytes between disk and memory.
///
/// Chosen once at construction; callers and tests drive either path
/// through the same device interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackingKind {
    /// Page-aligned private copy-on-write windows over the file.
    Mapped,
    /// Heap buffers filled and flushed with explicit reads and writes.
    Buffered,
}

impl Default for BackingKind {
    fn default() -> Self {
        if cfg!(any(unix, windows)) {
            BackingKind::Mapped
        } else {
            BackingKind::Buffered
        }
    }
}

/// Live backing state for one outstanding buffer.
#[derive(Debug)]
pub(crate) enum Backing {
    /// Mapping over the aligned window; the caller's bytes start at
    /// `pad`, the alignment remainder of the logical offset.
    Mapped { map: MmapMut, pad: usize },
    /// Heap copy of the logical range.
    Buffered { data: Vec<u8> },
}

impl Backing {
    pub(crate) fn bytes(&self, size: usize) -> &[u8] {
        match self {
            Backing::Mapped { map, pad } => &map[*pad..*pad + size],
            Backing::Buffered { data } => &data[..size],
        }
    }

    pub(crate) fn bytes_mut(&mut self, size: usize) -> &mut [u8] {
        match self {
            Backing::Mapped { map, pad } => &mut map[*pad..*pad + size],
            Backing::Buffered { data } => &mut data[..size],
        }
    }
}

/// Map the page-aligned window covering `[offset, offset + len)` as a
/// private copy-on-write region. Returns the mapping and the remainder
/// at which the logical range starts inside it.
pub(crate) fn map_window(file: &File, offset: u64, len: usize) -> io::Result<(MmapMut, usize)> {
    let page = platform::page_size() as u64;
    let aligned = (offset / page) * page;
    let pad = (offset - aligned) as usize;
    // SAFETY: the mapping is private copy-on-write, so writes land in
    // anonymous pages and reach the file only through an explicit
    // write-back; no alias of the file can observe them early.
    let map = unsafe {
        MmapOptions::new()
            .offset(aligned)
            .len(len + pad)
            .map_copy(file)?
    };
    Ok((map, pad))
}

/// Fill `buf` from the file at `offset`. A short read is an error.
pub(crate) fn read_into(file: &mut File, offset: u64, buf: &mut [u8]) -> io::Result<()> {
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(buf)
}

/// Write `buf` to the file at `offset`. A short write is an error.
pub(crate) fn write_back(file: &mut File, offset: u64, buf: &[u8]) -> io::Result<()> {
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(buf)
}
