//! Directory of assay CSV exports.
//!
//! Layout:
//!
//! ```text
//! <dir>/MGS_2020-06-10.csv   assay published on a given day
//! <dir>/MGS.csv              undated assay (used for `recent` if nothing dated exists)
//! ```
//!
//! Each file is the assay table as displayed: the first record holds the column
//! headers (its first field is the row-label column's header), and the first
//! field of every following record is that row's label.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::debug;

use crate::data::ProfileProvider;
use crate::domain::{AssayDate, RawRow, RawTable};
use crate::error::DistillError;

#[derive(Debug, Clone)]
pub struct CsvDirProvider {
    dir: PathBuf,
}

impl CsvDirProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve the file for a request, with the publication date encoded in its name.
    fn locate(&self, crude: &str, date: &AssayDate) -> Result<Option<(PathBuf, Option<NaiveDate>)>, DistillError> {
        match date {
            AssayDate::On(day) => {
                let path = self.dir.join(format!("{crude}_{}.csv", day.format("%Y-%m-%d")));
                Ok(path.is_file().then_some((path, Some(*day))))
            }
            AssayDate::Recent => {
                let entries = std::fs::read_dir(&self.dir).map_err(|e| DistillError::Provider {
                    crude: crude.to_string(),
                    date: date.clone(),
                    message: format!("Failed to list '{}': {e}", self.dir.display()),
                })?;

                let prefix = format!("{crude}_");
                let latest = entries
                    .filter_map(Result::ok)
                    .filter_map(|entry| {
                        let name = entry.file_name().to_string_lossy().into_owned();
                        let stem = name.strip_suffix(".csv")?;
                        let day = stem.strip_prefix(&prefix)?;
                        let day = NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()?;
                        Some((entry.path(), day))
                    })
                    .max_by_key(|(_, day)| *day);

                if let Some((path, day)) = latest {
                    return Ok(Some((path, Some(day))));
                }
                let undated = self.dir.join(format!("{crude}.csv"));
                Ok(undated.is_file().then_some((undated, None)))
            }
        }
    }
}

impl ProfileProvider for CsvDirProvider {
    fn get_profile(&self, crude: &str, date: &AssayDate) -> Result<Option<RawTable>, DistillError> {
        let Some((path, published)) = self.locate(crude, date)? else {
            debug!("no assay file for {crude} ({date}) in {}", self.dir.display());
            return Ok(None);
        };
        debug!("reading assay table {}", path.display());

        let provider_err = |message: String| DistillError::Provider {
            crude: crude.to_string(),
            date: date.clone(),
            message,
        };

        let file = File::open(&path).map_err(|e| provider_err(format!("Failed to open '{}': {e}", path.display())))?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let mut records = reader.records();
        let Some(header) = records.next() else {
            return Ok(None);
        };
        let header = header.map_err(|e| provider_err(format!("Failed to read CSV header: {e}")))?;

        let mut table = RawTable::new(crude, published, header.iter().skip(1).map(str::to_string).collect());
        for record in records {
            let record = record.map_err(|e| provider_err(format!("CSV parse error: {e}")))?;
            let mut fields = record.iter();
            let Some(label) = fields.next() else {
                continue;
            };
            table.rows.push(RawRow {
                label: label.to_string(),
                cells: fields.map(str::to_string).collect(),
            });
        }

        if table.is_empty() {
            return Ok(None);
        }
        Ok(Some(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(dir: &Path, name: &str, body: &str) {
        let mut f = File::create(dir.join(name)).unwrap();
        f.write_all(body.as_bytes()).unwrap();
    }

    const BODY: &str = "Mass % Recovered,Temperature( oC ),Average( oC )\nIBP,35.2,34.0\n5,62.0,-\n10,\"1,090.4\",88.0\n";

    #[test]
    fn reads_dated_and_recent_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "RA_2020-06-10.csv", BODY);
        write(dir.path(), "RA_2021-01-05.csv", BODY);
        let provider = CsvDirProvider::new(dir.path());

        let recent = provider.get_profile("RA", &AssayDate::Recent).unwrap().unwrap();
        assert_eq!(recent.published, NaiveDate::from_ymd_opt(2021, 1, 5));
        assert_eq!(recent.columns, vec!["Temperature( oC )", "Average( oC )"]);
        assert_eq!(recent.rows.len(), 3);
        assert_eq!(recent.rows[2].cells[0], "1,090.4");

        let dated: AssayDate = "2020-06-10".parse().unwrap();
        let t = provider.get_profile("RA", &dated).unwrap().unwrap();
        assert_eq!(t.published, NaiveDate::from_ymd_opt(2020, 6, 10));
    }

    #[test]
    fn undated_file_serves_recent() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "MGS.csv", BODY);
        let provider = CsvDirProvider::new(dir.path());
        let t = provider.get_profile("MGS", &AssayDate::Recent).unwrap().unwrap();
        assert_eq!(t.published, None);
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let provider = CsvDirProvider::new(dir.path());
        assert!(provider.get_profile("ABC", &AssayDate::Recent).unwrap().is_none());
        let dated: AssayDate = "2020-06-10".parse().unwrap();
        assert!(provider.get_profile("ABC", &dated).unwrap().is_none());
    }

    #[test]
    fn missing_directory_is_provider_error() {
        let provider = CsvDirProvider::new("/definitely/not/here");
        let err = provider.get_profile("RA", &AssayDate::Recent).unwrap_err();
        assert!(matches!(err, DistillError::Provider { .. }));
    }
}
