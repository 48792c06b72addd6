//! Read-side market data queries
//!
//! Consumers map the region file read-only and read market-data and
//! price-level records without any coordination with the engine. Reads
//! may be one generation stale; the level array is additionally a lossy
//! projection (prices sharing `price % MAX_LEVELS` overwrite each
//! other), so authoritative depth comes from the engine's snapshots.

use std::path::Path;

use types::level::LevelRecord;
use types::market::MarketDataRecord;
use types::order::Side;
use types::symbol::symbol_fingerprint;

use crate::shm::layout;
use crate::shm::{ReadRegion, RegionError};

/// Read-only view over a mapped region file.
pub struct MarketDataReader {
    region: ReadRegion,
}

impl MarketDataReader {
    /// Map an existing region file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RegionError> {
        Ok(Self {
            region: ReadRegion::open(path)?,
        })
    }

    /// Market data record at a symbol index.
    pub fn market_data(&self, symbol_index: usize) -> Option<MarketDataRecord> {
        if symbol_index >= layout::MAX_SYMBOLS {
            return None;
        }
        let mut buf = [0u8; MarketDataRecord::ENCODED_SIZE];
        self.region.read_bytes(layout::market_data_offset(symbol_index), &mut buf);
        Some(MarketDataRecord::from_bytes(&buf))
    }

    /// Scan the market-data array for a symbol's entry.
    ///
    /// Returns the index and record of the first entry whose
    /// fingerprint matches; `None` when the symbol never traded into
    /// the array.
    pub fn find_market_data(&self, symbol: &str) -> Option<(usize, MarketDataRecord)> {
        let fingerprint = symbol_fingerprint(symbol);
        (0..layout::MAX_SYMBOLS).find_map(|index| {
            let record = self.market_data(index)?;
            (record.symbol_fp == fingerprint).then_some((index, record))
        })
    }

    /// Level snapshot slot for a price on one side of a symbol.
    pub fn level(&self, symbol_index: usize, side: Side, price: u64) -> Option<LevelRecord> {
        if symbol_index >= layout::MAX_SYMBOLS {
            return None;
        }
        let mut buf = [0u8; LevelRecord::ENCODED_SIZE];
        self.region
            .read_bytes(layout::level_slot_offset(symbol_index, side, price), &mut buf);
        Some(LevelRecord::from_bytes(&buf))
    }

    pub fn path(&self) -> &Path {
        self.region.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shm::MappedRegion;
    use tempfile::TempDir;

    #[test]
    fn test_reader_sees_market_data_writes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("exchange.bin");

        let region = MappedRegion::open(&path).unwrap();
        let mut record = MarketDataRecord::new(symbol_fingerprint("BTC-USD"));
        record.apply_trade(50_000, 3, 77);
        region.write_bytes(layout::market_data_offset(0), &record.to_bytes());
        region.flush().unwrap();

        let reader = MarketDataReader::open(&path).unwrap();
        assert_eq!(reader.market_data(0), Some(record));

        let (index, found) = reader.find_market_data("BTC-USD").unwrap();
        assert_eq!(index, 0);
        assert_eq!(found.last_price, 50_000);
    }

    #[test]
    fn test_reader_bounds() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("exchange.bin");
        let _region = MappedRegion::open(&path).unwrap();

        let reader = MarketDataReader::open(&path).unwrap();
        assert!(reader.market_data(layout::MAX_SYMBOLS).is_none());
        assert!(reader.level(layout::MAX_SYMBOLS, Side::BUY, 100).is_none());
    }

    #[test]
    fn test_reader_level_slot() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("exchange.bin");

        let region = MappedRegion::open(&path).unwrap();
        let level = LevelRecord::new(5_000, 9, 1);
        region.write_bytes(layout::level_slot_offset(2, Side::SELL, 5_000), &level.to_bytes());
        region.flush().unwrap();

        let reader = MarketDataReader::open(&path).unwrap();
        assert_eq!(reader.level(2, Side::SELL, 5_000), Some(level));
        // A colliding price lands in the same slot.
        assert_eq!(
            reader.level(2, Side::SELL, 5_000 + layout::MAX_LEVELS),
            Some(level)
        );
    }
}
