//! Memory-mapped exchange region
//!
//! One fixed-size file mapped read-write, carrying the header, both
//! rings, and the market-data and price-level snapshot arrays. The
//! matching engine owns every byte except the order ring tail and the
//! order slots between head and tail, which belong to submitters.
//!
//! Header words are accessed through naturally aligned atomics; ring
//! indices are published with release stores and observed with acquire
//! loads so a consumer never reads a slot before its payload is
//! complete. Payload bytes themselves are plain little-endian copies.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use memmap2::{Mmap, MmapMut};
use thiserror::Error;
use tracing::info;

use super::layout::{self, header};

/// Region setup and teardown failures
#[derive(Error, Debug)]
pub enum RegionError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("mapped file too small: {actual} bytes, need {required}")]
    TooSmall { actual: u64, required: u64 },
}

/// The read-write mapping owned by the engine process.
pub struct MappedRegion {
    /// Keeps the mapping alive; all access goes through `base`.
    mmap: MmapMut,
    base: *mut u8,
    path: PathBuf,
}

// The mapping is shared with other processes by design; Rust-side
// synchronization is the header atomics plus the single-writer contract.
unsafe impl Send for MappedRegion {}
unsafe impl Sync for MappedRegion {}

impl MappedRegion {
    /// Open (or create) the region file and map it read-write.
    ///
    /// A file shorter than the full layout is grown; an existing header
    /// is adopted when its version word is non-zero, otherwise the
    /// header is populated from scratch.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RegionError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;

        let len = file.metadata()?.len();
        if len < layout::TOTAL_SIZE as u64 {
            file.set_len(layout::TOTAL_SIZE as u64)?;
            info!(path = %path.display(), bytes = layout::TOTAL_SIZE, "extended region file");
        }

        // SAFETY: the file stays open for the lifetime of the mapping and
        // is sized to the full layout above.
        let mut mmap = unsafe { MmapMut::map_mut(&file)? };
        let base = mmap.as_mut_ptr();

        let region = Self { mmap, base, path };
        region.initialize_header();
        Ok(region)
    }

    /// Populate the header on first open. A zero version word means the
    /// region has never been initialized (or was reset); adopting a
    /// populated header preserves ring positions across restarts.
    fn initialize_header(&self) {
        if self.version() > 0 {
            info!(path = %self.path.display(), "adopting existing region header");
            return;
        }

        self.header_word(header::ORDER_RING_HEAD).store(0, Ordering::Relaxed);
        self.header_word(header::ORDER_RING_TAIL).store(0, Ordering::Relaxed);
        self.header_word(header::TRADE_RING_HEAD).store(0, Ordering::Relaxed);
        self.header_word(header::TRADE_RING_TAIL).store(0, Ordering::Relaxed);
        self.header_word(header::NEXT_TRADE_ID).store(1, Ordering::Relaxed);
        self.header_word(header::LAST_UPDATE_TS)
            .store(crate::clock::monotonic_nanos(), Ordering::Relaxed);
        self.header_word(header::STATUS).store(layout::STATUS_IDLE, Ordering::Relaxed);
        self.header_word(header::VERSION).store(1, Ordering::Release);
        info!(path = %self.path.display(), "initialized region header");
    }

    #[inline]
    fn header_word(&self, offset: usize) -> &AtomicU64 {
        debug_assert!(offset % 8 == 0 && offset + 8 <= layout::HEADER_SIZE);
        // SAFETY: the offset is inside the mapping and 8-byte aligned
        // (the mapping itself is page aligned), so the cast target is a
        // valid, properly aligned AtomicU64.
        unsafe { &*(self.base.add(offset) as *const AtomicU64) }
    }

    // ── Order ring indices ──────────────────────────────────────────

    #[inline]
    pub fn order_ring_head(&self) -> u64 {
        self.header_word(header::ORDER_RING_HEAD).load(Ordering::Acquire)
    }

    #[inline]
    pub fn set_order_ring_head(&self, head: u64) {
        self.header_word(header::ORDER_RING_HEAD).store(head, Ordering::Release);
    }

    #[inline]
    pub fn order_ring_tail(&self) -> u64 {
        self.header_word(header::ORDER_RING_TAIL).load(Ordering::Acquire)
    }

    #[inline]
    pub fn set_order_ring_tail(&self, tail: u64) {
        self.header_word(header::ORDER_RING_TAIL).store(tail, Ordering::Release);
    }

    // ── Trade ring indices ──────────────────────────────────────────

    #[inline]
    pub fn trade_ring_head(&self) -> u64 {
        self.header_word(header::TRADE_RING_HEAD).load(Ordering::Acquire)
    }

    #[inline]
    pub fn set_trade_ring_head(&self, head: u64) {
        self.header_word(header::TRADE_RING_HEAD).store(head, Ordering::Release);
    }

    #[inline]
    pub fn trade_ring_tail(&self) -> u64 {
        self.header_word(header::TRADE_RING_TAIL).load(Ordering::Acquire)
    }

    #[inline]
    pub fn set_trade_ring_tail(&self, tail: u64) {
        self.header_word(header::TRADE_RING_TAIL).store(tail, Ordering::Release);
    }

    // ── Remaining header words ──────────────────────────────────────

    /// Assign the next trade id. Only the engine thread calls this.
    #[inline]
    pub fn assign_trade_id(&self) -> u64 {
        self.header_word(header::NEXT_TRADE_ID).fetch_add(1, Ordering::Relaxed)
    }

    pub fn next_trade_id(&self) -> u64 {
        self.header_word(header::NEXT_TRADE_ID).load(Ordering::Relaxed)
    }

    pub fn update_timestamp(&self, nanos: u64) {
        self.header_word(header::LAST_UPDATE_TS).store(nanos, Ordering::Relaxed);
    }

    pub fn timestamp(&self) -> u64 {
        self.header_word(header::LAST_UPDATE_TS).load(Ordering::Relaxed)
    }

    pub fn version(&self) -> u64 {
        self.header_word(header::VERSION).load(Ordering::Acquire)
    }

    pub fn is_active(&self) -> bool {
        self.header_word(header::STATUS).load(Ordering::Acquire) == layout::STATUS_ACTIVE
    }

    pub fn set_active(&self, active: bool) {
        let status = if active { layout::STATUS_ACTIVE } else { layout::STATUS_IDLE };
        self.header_word(header::STATUS).store(status, Ordering::Release);
    }

    // ── Payload access ──────────────────────────────────────────────

    /// Copy `data` into the region at `offset`.
    #[inline]
    pub fn write_bytes(&self, offset: usize, data: &[u8]) {
        debug_assert!(offset + data.len() <= layout::TOTAL_SIZE);
        // SAFETY: the range is inside the mapping; writers of any given
        // range are serialized by the ownership rules of the layout.
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), self.base.add(offset), data.len());
        }
    }

    /// Copy bytes out of the region at `offset`.
    #[inline]
    pub fn read_bytes(&self, offset: usize, buf: &mut [u8]) {
        debug_assert!(offset + buf.len() <= layout::TOTAL_SIZE);
        // SAFETY: the range is inside the mapping.
        unsafe {
            std::ptr::copy_nonoverlapping(self.base.add(offset), buf.as_mut_ptr(), buf.len());
        }
    }

    /// Flush dirty pages back to the file.
    pub fn flush(&self) -> Result<(), RegionError> {
        self.mmap.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A read-only mapping for market-data consumers.
///
/// Readers run without coordination with the engine and must tolerate
/// one-generation staleness of anything they read.
pub struct ReadRegion {
    mmap: Mmap,
    path: PathBuf,
}

impl ReadRegion {
    /// Map an existing region file read-only.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RegionError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).open(&path)?;

        let len = file.metadata()?.len();
        if len < layout::TOTAL_SIZE as u64 {
            return Err(RegionError::TooSmall {
                actual: len,
                required: layout::TOTAL_SIZE as u64,
            });
        }

        // SAFETY: the file stays open for the lifetime of the mapping.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self { mmap, path })
    }

    /// Copy bytes out of the region at `offset`.
    #[inline]
    pub fn read_bytes(&self, offset: usize, buf: &mut [u8]) {
        buf.copy_from_slice(&self.mmap[offset..offset + buf.len()]);
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn region_path(dir: &TempDir) -> PathBuf {
        dir.path().join("exchange.bin")
    }

    #[test]
    fn test_fresh_region_initializes_header() {
        let tmp = TempDir::new().unwrap();
        let region = MappedRegion::open(region_path(&tmp)).unwrap();

        assert_eq!(region.version(), 1);
        assert_eq!(region.order_ring_head(), 0);
        assert_eq!(region.order_ring_tail(), 0);
        assert_eq!(region.next_trade_id(), 1);
        assert!(!region.is_active());
    }

    #[test]
    fn test_reopen_adopts_header() {
        let tmp = TempDir::new().unwrap();
        let path = region_path(&tmp);

        {
            let region = MappedRegion::open(&path).unwrap();
            region.set_order_ring_tail(17);
            region.set_active(true);
            region.flush().unwrap();
        }

        let region = MappedRegion::open(&path).unwrap();
        assert_eq!(region.order_ring_tail(), 17);
        assert!(region.is_active());
    }

    #[test]
    fn test_zeroed_version_reinitializes() {
        let tmp = TempDir::new().unwrap();
        let path = region_path(&tmp);

        {
            let region = MappedRegion::open(&path).unwrap();
            region.set_order_ring_tail(99);
            // Wipe the version word: the next open must reset the header.
            region.header_word(header::VERSION).store(0, Ordering::Release);
            region.flush().unwrap();
        }

        let region = MappedRegion::open(&path).unwrap();
        assert_eq!(region.version(), 1);
        assert_eq!(region.order_ring_tail(), 0);
        assert_eq!(region.next_trade_id(), 1);
    }

    #[test]
    fn test_trade_id_assignment_is_monotonic() {
        let tmp = TempDir::new().unwrap();
        let region = MappedRegion::open(region_path(&tmp)).unwrap();

        assert_eq!(region.assign_trade_id(), 1);
        assert_eq!(region.assign_trade_id(), 2);
        assert_eq!(region.next_trade_id(), 3);
    }

    #[test]
    fn test_payload_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let region = MappedRegion::open(region_path(&tmp)).unwrap();

        let data = [0xA5u8; 52];
        region.write_bytes(layout::order_slot_offset(3), &data);

        let mut back = [0u8; 52];
        region.read_bytes(layout::order_slot_offset(3), &mut back);
        assert_eq!(data, back);
    }

    #[test]
    fn test_read_region_rejects_short_file() {
        let tmp = TempDir::new().unwrap();
        let path = region_path(&tmp);
        std::fs::write(&path, b"short").unwrap();

        match ReadRegion::open(&path) {
            Err(RegionError::TooSmall { actual, .. }) => assert_eq!(actual, 5),
            other => panic!("expected TooSmall, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_read_region_sees_engine_writes() {
        let tmp = TempDir::new().unwrap();
        let path = region_path(&tmp);

        let region = MappedRegion::open(&path).unwrap();
        let data = [7u8; 16];
        region.write_bytes(layout::MARKET_DATA_OFFSET, &data);
        region.flush().unwrap();

        let reader = ReadRegion::open(&path).unwrap();
        let mut back = [0u8; 16];
        reader.read_bytes(layout::MARKET_DATA_OFFSET, &mut back);
        assert_eq!(data, back);
    }
}
