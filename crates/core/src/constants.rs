/// Default trailing window for the interior gap scan, in days.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 30;

/// Local hour at which next-day prices are published.
pub const DEFAULT_PUBLICATION_HOUR: u32 = 14;

/// Default bound for a single source fetch.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;

/// Default bound for a single store call.
pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 30;
