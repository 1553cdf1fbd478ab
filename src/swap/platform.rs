//! Platform page-size queries and memory-advice helpers.
//!
//! Mapped windows must start on an OS alignment boundary: the page size
//! on POSIX systems, the allocation granularity on Windows. The advisory
//! calls are best-effort hints and compile to no-ops on platforms that
//! cannot honor them.

use memmap2::MmapMut;

const FALLBACK_PAGE_SIZE: usize = 4096;

/// Alignment unit for mapped window offsets.
#[cfg(unix)]
pub fn page_size() -> usize {
    // SAFETY: sysconf is a pure query with no preconditions.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as usize
    } else {
        FALLBACK_PAGE_SIZE
    }
}

/// Alignment unit for mapped window offsets.
#[cfg(windows)]
pub fn page_size() -> usize {
    use windows_sys::Win32::System::SystemInformation::{GetSystemInfo, SYSTEM_INFO};

    // SAFETY: GetSystemInfo only writes into the struct it is handed.
    let mut info: SYSTEM_INFO = unsafe { std::mem::zeroed() };
    unsafe { GetSystemInfo(&mut info) };
    // File mappings must align to the allocation granularity, which is
    // coarser than the CPU page size.
    info.dwAllocationGranularity as usize
}

/// Alignment unit for mapped window offsets.
#[cfg(not(any(unix, windows)))]
pub fn page_size() -> usize {
    FALLBACK_PAGE_SIZE
}

/// Hint that the window will be read once, front to back.
#[cfg(unix)]
pub(crate) fn advise_sequential(map: &MmapMut) {
    map.advise(memmap2::Advice::Sequential).ok();
}

#[cfg(not(unix))]
pub(crate) fn advise_sequential(_map: &MmapMut) {}

/// Pin the window's pages into physical memory.
#[cfg(unix)]
pub(crate) fn pin_resident(map: &MmapMut) {
    map.lock().ok();
}

#[cfg(not(unix))]
pub(crate) fn pin_resident(_map: &MmapMut) {}

/// Tell the OS the window's pages will not be touched again.
#[cfg(unix)]
pub(crate) fn advise_discardable(map: &MmapMut) {
    // SAFETY: issued only right before the mapping is dropped; nothing
    // reads through it afterwards.
    unsafe { map.unchecked_advise(memmap2::UncheckedAdvice::DontNeed) }.ok();
}

#[cfg(not(unix))]
pub(crate) fn advise_discardable(_map: &MmapMut) {}
