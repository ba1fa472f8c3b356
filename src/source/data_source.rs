//! Where per-station, per-year daily files live.

use std::fmt;
use std::path::PathBuf;

/// Raw base URL of the public historical weather archive.
pub const DEFAULT_REMOTE_ROOT: &str =
    "https://raw.githubusercontent.com/Raingel/historical_weather/main/data";

/// Root of the daily archive. Files are laid out as
/// `{root}/{station}/{station}_{year}_daily.csv` in both cases.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataSource {
    /// A local checkout of the archive's `data` directory.
    Local(PathBuf),
    /// A base URL serving the same layout over HTTP.
    Remote(String),
}

impl DataSource {
    /// Interprets a command-line value: `http(s)://` prefixes are remote,
    /// everything else is a local path.
    pub fn parse(value: &str) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            DataSource::Remote(value.trim_end_matches('/').to_string())
        } else {
            DataSource::Local(PathBuf::from(value))
        }
    }

    pub(crate) fn file_name(station: &str, year: i32) -> String {
        format!("{station}_{year}_daily.csv")
    }

    /// The path or URL of one station-year file, for reading and for messages.
    pub fn location(&self, station: &str, year: i32) -> String {
        match self {
            DataSource::Local(root) => root
                .join(station)
                .join(Self::file_name(station, year))
                .display()
                .to_string(),
            DataSource::Remote(base) => {
                format!("{}/{}/{}", base, station, Self::file_name(station, year))
            }
        }
    }

    pub(crate) fn cache_file_name(station: &str, year: i32) -> String {
        format!("daily-{station}-{year}.parquet")
    }
}

impl Default for DataSource {
    fn default() -> Self {
        DataSource::Remote(DEFAULT_REMOTE_ROOT.to_string())
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Local(root) => write!(f, "{}", root.display()),
            DataSource::Remote(base) => write!(f, "{base}"),
        }
    }
}
