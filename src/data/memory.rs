//! In-memory provider.

use std::collections::HashMap;

use crate::data::ProfileProvider;
use crate::domain::{AssayDate, RawTable};
use crate::error::DistillError;

/// Tables held in memory, keyed by crude code.
///
/// `recent` resolves to the table with the latest publication date (undated
/// tables count as oldest).
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    tables: HashMap<String, Vec<RawTable>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: RawTable) {
        self.tables
            .entry(table.crude.to_ascii_uppercase())
            .or_default()
            .push(table);
    }

    #[must_use]
    pub fn with_table(mut self, table: RawTable) -> Self {
        self.insert(table);
        self
    }
}

impl ProfileProvider for MemoryProvider {
    fn get_profile(&self, crude: &str, date: &AssayDate) -> Result<Option<RawTable>, DistillError> {
        let Some(tables) = self.tables.get(&crude.to_ascii_uppercase()) else {
            return Ok(None);
        };
        let found = match date {
            AssayDate::Recent => tables.iter().max_by_key(|t| t.published),
            AssayDate::On(day) => tables.iter().find(|t| t.published == Some(*day)),
        };
        Ok(found.cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn recent_picks_latest_publication() {
        let d1 = NaiveDate::from_ymd_opt(2020, 6, 10).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2021, 1, 5).unwrap();
        let provider = MemoryProvider::new()
            .with_table(RawTable::new("RA", Some(d1), vec!["a".into()]))
            .with_table(RawTable::new("RA", Some(d2), vec!["b".into()]));

        let recent = provider.get_profile("ra", &AssayDate::Recent).unwrap().unwrap();
        assert_eq!(recent.published, Some(d2));
        let dated = provider.get_profile("RA", &AssayDate::On(d1)).unwrap().unwrap();
        assert_eq!(dated.columns, vec!["a".to_string()]);
    }

    #[test]
    fn unknown_crude_or_date_is_none() {
        let provider = MemoryProvider::new().with_table(RawTable::new("RA", None, vec![]));
        assert!(provider.get_profile("ABC", &AssayDate::Recent).unwrap().is_none());
        let day = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();
        assert!(provider.get_profile("RA", &AssayDate::On(day)).unwrap().is_none());
    }
}
