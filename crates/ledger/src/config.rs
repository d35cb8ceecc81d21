//! Ledger-relevant configuration (§6). The full `EngineConfig` lives in the
//! `config` crate; this is the narrow slice the ledger itself needs so the
//! crate has no dependency on `config`.

/// Parameters the Ledger needs that are not part of its own state.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerConfig {
    /// Cost basis per unit for retail customer sales (§6 `BASE_DONUT_PRICE`).
    pub base_donut_price: f64,
    /// Baseline balance used to compute `netProfit` (§6 `INITIAL_OUTLET_BALANCE`).
    pub initial_outlet_balance: f64,
    /// Sentinel outlet id excluded from the leaderboard (§6 `SUPPLIER_OUTLET_ID`).
    pub supplier_outlet_id: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            base_donut_price: 2.0,
            initial_outlet_balance: 10_000.0,
            supplier_outlet_id: "supplier-factory".to_string(),
        }
    }
}
