//! Archive addressing: remote URL and local cache path from an archive key.
//!
//! Both are pure functions of the key and configuration, so a key always
//! resolves to the same addresses.

use crate::config::DownloaderConfig;
use crate::klines::Period;
use std::fmt;
use std::path::PathBuf;

/// Uniquely identifies one monthly archive for a (symbol, period) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArchiveKey {
    pub symbol: String,
    pub period: Period,
    pub year: i32,
    pub month: u32,
}

impl ArchiveKey {
    pub fn new(symbol: impl Into<String>, period: Period, year: i32, month: u32) -> Self {
        Self {
            symbol: symbol.into(),
            period,
            year,
            month,
        }
    }

    /// Archive file name: `<symbol>-<period>-<YYYY>-<MM>.zip`.
    pub fn file_name(&self) -> String {
        format!(
            "{}-{}-{}-{:02}.zip",
            self.symbol, self.period, self.year, self.month
        )
    }

    /// USDT-quoted pairs are published under the spot tree; everything
    /// else under coin-margined futures.
    fn market_path(&self) -> &'static str {
        if self.symbol.ends_with("USDT") {
            "spot/monthly/klines"
        } else {
            "futures/cm/monthly/klines"
        }
    }

    pub fn remote_url(&self, config: &DownloaderConfig) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            config.base_url,
            self.market_path(),
            self.symbol,
            self.period,
            self.file_name()
        )
    }

    pub fn local_path(&self, config: &DownloaderConfig) -> PathBuf {
        config
            .data_dir
            .join(&self.symbol)
            .join(self.period.as_str())
            .join(self.file_name())
    }
}

impl fmt::Display for ArchiveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} {}-{:02}",
            self.symbol, self.period, self.year, self.month
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spot_symbols_route_to_spot_tree() {
        let config = DownloaderConfig::default();
        let key = ArchiveKey::new("ETHUSDT", Period::M5, 2017, 11);
        assert_eq!(
            key.remote_url(&config),
            "https://data.binance.vision/data/spot/monthly/klines/ETHUSDT/5m/ETHUSDT-5m-2017-11.zip"
        );
    }

    #[test]
    fn other_symbols_route_to_coin_margined_futures() {
        let config = DownloaderConfig::default();
        let key = ArchiveKey::new("BTCUSD_PERP", Period::H1, 2021, 3);
        assert_eq!(
            key.remote_url(&config),
            "https://data.binance.vision/data/futures/cm/monthly/klines/BTCUSD_PERP/1h/BTCUSD_PERP-1h-2021-03.zip"
        );
    }

    #[test]
    fn local_path_is_deterministic() {
        let config = DownloaderConfig {
            data_dir: PathBuf::from("/tmp/cache"),
            ..Default::default()
        };
        let key = ArchiveKey::new("BTCUSDT", Period::M1, 2020, 1);
        let expected = PathBuf::from("/tmp/cache/BTCUSDT/1m/BTCUSDT-1m-2020-01.zip");
        assert_eq!(key.local_path(&config), expected);
        // Same inputs, same path.
        assert_eq!(key.local_path(&config), expected);
    }

    #[test]
    fn month_is_zero_padded() {
        let key = ArchiveKey::new("ETHUSDT", Period::H1, 2021, 2);
        assert_eq!(key.file_name(), "ETHUSDT-1h-2021-02.zip");
    }
}
