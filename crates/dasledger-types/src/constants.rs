//! System-wide constants for the dasledger core.

/// Largest amount of any single asset that may ever exist.
pub const MAX_SHARE_SUPPLY: i64 = 1_000_000_000_000_000;

/// Denominator of `market_fee_percent`: 10000 = 100%, 100 = 1%.
pub const PERCENT_100: u16 = 10_000;

/// 1% expressed in `market_fee_percent` units.
pub const PERCENT_1: u16 = 100;

/// Default interval between maintenance boundaries, in seconds.
pub const DEFAULT_MAINTENANCE_INTERVAL_SECS: u64 = 86_400;

/// Default length of a vault-to-wallet balance-limit window, in seconds.
pub const DEFAULT_LIMIT_WINDOW_SECS: u64 = 86_400;

/// Upper bound on any configured interval: ten years.
pub const MAX_INTERVAL_SECS: u64 = 10 * 365 * 86_400;

/// Decimal places of the core (dascoin) asset.
pub const DASCOIN_PRECISION_DIGITS: u8 = 5;

/// Decimal places of the fiat-backed web asset.
pub const WEB_ASSET_PRECISION_DIGITS: u8 = 2;
