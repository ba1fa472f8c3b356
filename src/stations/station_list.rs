use crate::stations::error::StationListError;
use crate::types::station::Station;
use bincode::config::{Configuration, Fixint, LittleEndian};
use log::info;
use polars::prelude::*;
use reqwest::Client;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Public listing of Taiwanese weather stations.
pub const DEFAULT_STATION_LIST_URL: &str =
    "https://raw.githubusercontent.com/Raingel/weather_station_list/main/data/weather_sta_list.csv";
const BINCODE_CACHE_FILE_NAME: &str = "stations.bin";
const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

const COL_ID: &str = "站號";
const COL_NAME: &str = "站名";
const COL_LAT: &str = "緯度";
const COL_LON: &str = "經度";
const COL_DECOMMISSIONED: &str = "撤站日期";

/// The stations of a listing, in listing order.
#[derive(Debug, Clone, Default)]
pub struct StationList {
    stations: Vec<Station>,
}

impl StationList {
    pub fn new(stations: Vec<Station>) -> Self {
        Self { stations }
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.id == id)
    }

    /// Loads a listing from a local CSV path or an `http(s)://` URL.
    ///
    /// Remote listings are cached under `cache_dir` with bincode after the
    /// first download.
    pub async fn load(location: &str, cache_dir: &Path) -> Result<Self, StationListError> {
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::load_remote(location, cache_dir).await
        } else {
            Self::load_local(Path::new(location)).await
        }
    }

    async fn load_local(path: &Path) -> Result<Self, StationListError> {
        if tokio::fs::metadata(path).await.is_err() {
            return Err(StationListError::NotFound(path.to_path_buf()));
        }
        let path_buf = path.to_path_buf();
        let stations = tokio::task::spawn_blocking(move || {
            parse_station_csv(&path_buf, &path_buf.display().to_string())
        })
        .await??;
        info!("Loaded {} stations from {}", stations.len(), path.display());
        Ok(Self { stations })
    }

    async fn load_remote(url: &str, cache_dir: &Path) -> Result<Self, StationListError> {
        let cache_file = cache_dir.join(BINCODE_CACHE_FILE_NAME);

        if cache_file.exists() {
            let path_clone = cache_file.clone();
            let stations =
                tokio::task::spawn_blocking(move || Self::get_cached_stations(&path_clone))
                    .await??;
            info!(
                "Loaded {} stations from cache {}",
                stations.len(),
                cache_file.display()
            );
            return Ok(Self { stations });
        }

        info!("Station cache not found. Fetching from URL: {}", url);
        let stations = Self::fetch_stations(url).await?;
        tokio::fs::create_dir_all(cache_dir)
            .await
            .map_err(|e| StationListError::CacheDirCreation(cache_dir.to_path_buf(), e))?;
        Self::cache_stations(stations.clone(), &cache_file).await?;
        Ok(Self { stations })
    }

    fn get_cached_stations(cache_path: &Path) -> Result<Vec<Station>, StationListError> {
        let bytes = std::fs::read(cache_path)
            .map_err(|e| StationListError::CacheRead(cache_path.to_path_buf(), e))?;
        let (decoded, _) = bincode::serde::decode_from_slice::<Vec<Station>, _>(
            &bytes,
            BINCODE_CONFIG,
        )
        .map_err(|e| StationListError::CacheDecode(cache_path.to_path_buf(), Box::new(e)))?;
        Ok(decoded)
    }

    async fn fetch_stations(url: &str) -> Result<Vec<Station>, StationListError> {
        let response = Client::new()
            .get(url)
            .send()
            .await
            .map_err(|e| StationListError::NetworkRequest(url.to_string(), e))?;
        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                return Err(match e.status() {
                    Some(status) => StationListError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    },
                    None => StationListError::NetworkRequest(url.to_string(), e),
                });
            }
        };
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StationListError::NetworkRequest(url.to_string(), e))?;

        let location = url.to_string();
        let stations = tokio::task::spawn_blocking(move || -> Result<_, StationListError> {
            let mut temp_file = NamedTempFile::new()?;
            temp_file.write_all(&bytes)?;
            temp_file.flush()?;
            parse_station_csv(temp_file.path(), &location)
        })
        .await??;
        info!("Parsed {} stations from {}", stations.len(), url);
        Ok(stations)
    }

    async fn cache_stations(
        stations: Vec<Station>,
        cache_path: &Path,
    ) -> Result<(), StationListError> {
        let bincode_data = tokio::task::spawn_blocking(move || {
            bincode::serde::encode_to_vec(stations, BINCODE_CONFIG)
                .map_err(|e| StationListError::CacheEncode(Box::new(e)))
        })
        .await??;
        tokio::fs::write(cache_path, &bincode_data)
            .await
            .map_err(|e| StationListError::CacheWrite(cache_path.to_path_buf(), e))?;
        info!(
            "Wrote station cache ({} bytes) to {}",
            bincode_data.len(),
            cache_path.display()
        );
        Ok(())
    }
}

fn string_column<'a>(
    df: &'a DataFrame,
    name: &str,
    location: &str,
) -> Result<&'a StringChunked, StationListError> {
    let missing = || StationListError::MissingColumn {
        location: location.to_string(),
        column: name.to_string(),
    };
    df.column(name)
        .map_err(|_| missing())?
        .str()
        .map_err(|_| missing())
}

fn parse_coordinate(value: Option<&str>) -> Option<f64> {
    value.and_then(|v| v.trim().parse::<f64>().ok())
}

/// Parses a listing CSV. Every column is read as text; `站號` and `站名` are
/// required, coordinates and the decommission date are optional.
pub(crate) fn parse_station_csv(
    path: &Path,
    location: &str,
) -> Result<Vec<Station>, StationListError> {
    let csv_error = |e: PolarsError| StationListError::CsvParse {
        location: location.to_string(),
        source: e,
    };
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))
        .map_err(csv_error)?
        .finish()
        .map_err(csv_error)?;

    let ids = string_column(&df, COL_ID, location)?;
    let names = string_column(&df, COL_NAME, location)?;
    let lats = string_column(&df, COL_LAT, location).ok();
    let lons = string_column(&df, COL_LON, location).ok();
    let decommissioned = string_column(&df, COL_DECOMMISSIONED, location).ok();

    let stations = (0..df.height())
        .filter_map(|row| {
            let id = ids.get(row)?.trim();
            if id.is_empty() {
                return None;
            }
            Some(Station {
                id: id.to_string(),
                name: names.get(row).unwrap_or_default().trim().to_string(),
                latitude: parse_coordinate(lats.and_then(|c| c.get(row))),
                longitude: parse_coordinate(lons.and_then(|c| c.get(row))),
                decommissioned: decommissioned
                    .and_then(|c| c.get(row))
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(str::to_string),
            })
        })
        .collect();
    Ok(stations)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "站號,站名,海拔高度(m),經度,緯度,城市,地址,資料起始日期,撤站日期,備註\n\
        466940,基隆,26.7,121.7405,25.1333,基隆市,仁愛區,1946/09/01,,\n\
        C0A560,福山,405,121.5,24.7,新北市,烏來區,1990/01/01,,\n\
        C1A730,公館,50,120.8,24.5,苗栗縣,公館鄉,1990/01/01,,\n\
        467990,馬祖,97.8,119.9,26.1,連江縣,南竿鄉,1950/01/01,2001/01/01,\n";

    #[tokio::test]
    async fn test_load_local_listing() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("weather_sta_list.csv");
        std::fs::write(&path, LISTING)?;

        let list = StationList::load(path.to_str().unwrap(), dir.path()).await?;
        assert_eq!(list.len(), 4);

        let keelung = list.get("466940").unwrap();
        assert_eq!(keelung.name, "基隆");
        assert_eq!(keelung.latitude, Some(25.1333));
        assert_eq!(keelung.longitude, Some(121.7405));
        assert!(keelung.is_active());

        let matsu = list.get("467990").unwrap();
        assert_eq!(matsu.decommissioned.as_deref(), Some("2001/01/01"));
        assert!(!matsu.is_active());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_listing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = StationList::load("does/not/exist.csv", dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, StationListError::NotFound(_)));
    }

    #[test]
    fn test_missing_id_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "name,lat\nfoo,1.0\n").unwrap();
        let err = parse_station_csv(&path, "bad.csv").unwrap_err();
        assert!(matches!(err, StationListError::MissingColumn { ref column, .. } if column == "站號"));
    }

    #[test]
    fn test_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(BINCODE_CACHE_FILE_NAME);
        let stations = vec![Station::new("466940", "基隆").with_location(25.1333, 121.7405)];
        let bytes = bincode::serde::encode_to_vec(&stations, BINCODE_CONFIG).unwrap();
        std::fs::write(&path, bytes).unwrap();
        assert_eq!(StationList::get_cached_stations(&path).unwrap(), stations);
    }
}
