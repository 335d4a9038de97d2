//! Kernel symbol resolution

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Name reported when no naming source resolves a symbol
pub const UNKNOWN_SYMBOL: &str = "unknown";

/// Kernel-symbol table row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelSymbolRow {
    pub id: u64,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, alias = "kernel_name")]
    pub mangled_name: Option<String>,
}

impl KernelSymbolRow {
    pub fn new(id: u64, display_name: Option<&str>, mangled_name: Option<&str>) -> Self {
        KernelSymbolRow {
            id,
            display_name: display_name.map(str::to_string),
            mangled_name: mangled_name.map(str::to_string),
        }
    }
}

/// Kernel symbol with its resolved display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelSymbol {
    pub id: u64,
    pub name: String,
}

impl KernelSymbol {
    /// Display name, then mangled name, then [`UNKNOWN_SYMBOL`]
    pub fn resolve(row: &KernelSymbolRow) -> Self {
        let name = [row.display_name.as_deref(), row.mangled_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|candidate| !candidate.is_empty())
            .unwrap_or(UNKNOWN_SYMBOL)
            .to_string();

        KernelSymbol { id: row.id, name }
    }
}

/// Lookup from symbol id to display name
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: HashMap<u64, KernelSymbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later rows with a repeated id replace earlier ones
    pub fn from_rows(rows: &[KernelSymbolRow]) -> Self {
        let symbols = rows
            .iter()
            .map(|row| (row.id, KernelSymbol::resolve(row)))
            .collect();
        SymbolTable { symbols }
    }

    /// Display name for `symbol_id`, or [`UNKNOWN_SYMBOL`]
    pub fn name_of(&self, symbol_id: u64) -> &str {
        self.symbols
            .get(&symbol_id)
            .map(|symbol| symbol.name.as_str())
            .unwrap_or(UNKNOWN_SYMBOL)
    }

    pub fn get(&self, symbol_id: u64) -> Option<&KernelSymbol> {
        self.symbols.get(&symbol_id)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
