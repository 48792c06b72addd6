//! Symbol registry
//!
//! Maps symbol strings to their fingerprint and dense market-data index.
//! Shared between the engine (registration, dispatch) and the admission
//! layer (validation). A fingerprint collision between two distinct
//! symbols would make ring records ambiguous, so registration refuses
//! it outright.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use dashmap::DashMap;
use thiserror::Error;
use types::symbol::symbol_fingerprint;

use crate::shm::layout::MAX_SYMBOLS;

/// Registration failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("symbol limit reached ({max})")]
    SymbolLimitReached { max: usize },

    #[error("fingerprint collision: {symbol} hashes like already-registered {existing}")]
    FingerprintCollision { symbol: String, existing: String },
}

/// Identity of a registered symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolInfo {
    /// Dense index into the mapped market-data and level arrays
    pub index: usize,
    pub fingerprint: u32,
}

/// Concurrent symbol table
#[derive(Debug, Default)]
pub struct SymbolRegistry {
    by_symbol: DashMap<String, SymbolInfo>,
    by_fingerprint: DashMap<u32, String>,
    next_index: AtomicUsize,
    /// Serializes registration so index assignment and the collision
    /// check stay consistent.
    register_lock: Mutex<()>,
}

impl SymbolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a symbol, assigning the next dense index.
    ///
    /// Returns `Ok(None)` when the symbol is already registered.
    pub fn register(&self, symbol: &str) -> Result<Option<SymbolInfo>, RegistryError> {
        let _guard = match self.register_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if self.by_symbol.contains_key(symbol) {
            return Ok(None);
        }

        let fingerprint = symbol_fingerprint(symbol);
        if let Some(existing) = self.by_fingerprint.get(&fingerprint) {
            return Err(RegistryError::FingerprintCollision {
                symbol: symbol.to_string(),
                existing: existing.clone(),
            });
        }

        if self.next_index.load(Ordering::Relaxed) >= MAX_SYMBOLS {
            return Err(RegistryError::SymbolLimitReached { max: MAX_SYMBOLS });
        }

        let index = self.next_index.fetch_add(1, Ordering::Relaxed);
        let info = SymbolInfo { index, fingerprint };
        self.by_symbol.insert(symbol.to_string(), info);
        self.by_fingerprint.insert(fingerprint, symbol.to_string());
        Ok(Some(info))
    }

    pub fn info(&self, symbol: &str) -> Option<SymbolInfo> {
        self.by_symbol.get(symbol).map(|entry| *entry)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.by_symbol.contains_key(symbol)
    }

    pub fn symbol_of(&self, fingerprint: u32) -> Option<String> {
        self.by_fingerprint.get(&fingerprint).map(|entry| entry.clone())
    }

    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }

    pub fn symbols(&self) -> Vec<String> {
        self.by_symbol.iter().map(|entry| entry.key().clone()).collect()
    }
}
