use chrono::NaiveDate;
use log::info;
use std::io;
use std::path::{Path, PathBuf};

const CACHE_DIR_NAME: &str = "blastdt_cache";

pub fn get_cache_dir() -> io::Result<PathBuf> {
    dirs::cache_dir()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "Could not determine system cache directory",
            )
        })
        .map(|p| p.join(CACHE_DIR_NAME))
}

pub async fn ensure_cache_dir_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("Cache path exists but is not a directory: {}", path.display()),
                ));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating cache directory: {}", path.display());
            tokio::fs::create_dir_all(path).await
        }
        Err(e) => Err(e),
    }
}

/// Parses the date column of a source or output file.
///
/// Accepts `YYYY-MM-DD` and `YYYY/MM/DD`, optionally followed by a time part
/// (`2021-08-16 00:00:00`, `2021-08-16T00:00:00`) which is ignored.
pub fn parse_source_date(text: &str) -> Option<NaiveDate> {
    let day_part = text.trim().split([' ', 'T']).next()?;
    ["%Y-%m-%d", "%Y/%m/%d"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(day_part, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source_date_variants() {
        let expected = NaiveDate::from_ymd_opt(2021, 8, 16);
        assert_eq!(parse_source_date("2021-08-16"), expected);
        assert_eq!(parse_source_date(" 2021-08-16 00:00:00"), expected);
        assert_eq!(parse_source_date("2021-08-16T00:00:00"), expected);
        assert_eq!(parse_source_date("2021/08/16"), expected);
    }

    #[test]
    fn test_parse_source_date_rejects_garbage() {
        assert_eq!(parse_source_date(""), None);
        assert_eq!(parse_source_date("16-08-2021x"), None);
        assert_eq!(parse_source_date("2021-02-30"), None);
        assert_eq!(parse_source_date("NaT"), None);
    }

    #[tokio::test]
    async fn test_ensure_cache_dir_exists_creates_nested() -> io::Result<()> {
        let root = tempfile::tempdir()?;
        let nested = root.path().join("a").join("b");
        ensure_cache_dir_exists(&nested).await?;
        assert!(nested.is_dir());
        // Second call is a no-op.
        ensure_cache_dir_exists(&nested).await?;
        Ok(())
    }
}
