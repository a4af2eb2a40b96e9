//! HTTP client for the public crude assay site.
//!
//! `GET {base}?acr={CODE}&time={recent|YYYY-MM-DD}` returns an HTML page with
//! one striped table: a header row (`id="tableHeadRow"`) and one row per
//! percent-evaporated label (`IBP`, `5`, `10`, ...). When the crude or date has
//! no published assay the page ends with a fixed message instead.

use std::time::Duration;

use log::{debug, info};
use reqwest::blocking::Client;

use crate::config::SourceConfig;
use crate::data::ProfileProvider;
use crate::data::html::{HtmlTable, extract_tables, visible_text};
use crate::domain::{AssayDate, RawRow, RawTable};
use crate::error::DistillError;

/// Page messages meaning "nothing published".
const NO_DATA_MESSAGES: &[&str] = &[
    "No crudes match the given acronym.",
    "No distillation samples available.",
];

const TABLE_CLASSES: &[&str] = &["table", "table-sm", "table-striped"];
const HEADER_ROW_ID: &str = "tableHeadRow";

pub struct CrudeMonitorClient {
    client: Client,
    base_url: String,
}

impl CrudeMonitorClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DistillError> {
        let base_url = base_url.into();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DistillError::Provider {
                crude: String::new(),
                date: AssayDate::Recent,
                message: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &SourceConfig) -> Result<Self, DistillError> {
        Self::new(config.base_url.clone(), config.timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn fetch_page(&self, crude: &str, date: &AssayDate) -> Result<String, DistillError> {
        let provider_err = |message: String| DistillError::Provider {
            crude: crude.to_string(),
            date: date.clone(),
            message,
        };

        info!("fetching distillation assay for {crude} ({date})");
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("acr", crude), ("time", date.as_query().as_str())])
            .send()
            .map_err(|e| provider_err(format!("Request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(provider_err(format!("Request failed with status {}.", resp.status())));
        }

        resp.text()
            .map_err(|e| provider_err(format!("Failed to read response body: {e}")))
    }
}

impl ProfileProvider for CrudeMonitorClient {
    fn get_profile(&self, crude: &str, date: &AssayDate) -> Result<Option<RawTable>, DistillError> {
        let page = self.fetch_page(crude, date)?;
        parse_assay_page(crude, date, &page)
    }
}

/// Turn an assay page into a raw table (`Ok(None)` for the "no data" pages).
pub fn parse_assay_page(crude: &str, date: &AssayDate, page: &str) -> Result<Option<RawTable>, DistillError> {
    if is_no_data_page(page) {
        debug!("assay source reports no data for {crude} ({date})");
        return Ok(None);
    }

    let tables = extract_tables(page);
    let Some(table) = tables.iter().find(|t| t.has_classes(TABLE_CLASSES)) else {
        return Err(DistillError::Provider {
            crude: crude.to_string(),
            date: date.clone(),
            message: "Assay table not found in page.".to_string(),
        });
    };

    let published = match date {
        AssayDate::On(day) => Some(*day),
        AssayDate::Recent => None,
    };
    let raw = to_raw_table(crude, published, table);
    Ok((!raw.is_empty()).then_some(raw))
}

fn is_no_data_page(page: &str) -> bool {
    let squashed: String = visible_text(page).chars().filter(|c| !c.is_whitespace()).collect();
    NO_DATA_MESSAGES.iter().any(|msg| {
        let msg: String = msg.chars().filter(|c| !c.is_whitespace()).collect();
        squashed.contains(&msg)
    })
}

fn to_raw_table(crude: &str, published: Option<chrono::NaiveDate>, table: &HtmlTable) -> RawTable {
    let header_row = table
        .rows
        .iter()
        .find(|r| r.id.as_deref() == Some(HEADER_ROW_ID))
        .or_else(|| table.rows.first());

    // The first header names the row-label column.
    let columns: Vec<String> = header_row
        .map(|r| r.header_texts().skip(1).map(str::to_string).collect())
        .unwrap_or_default();

    let mut raw = RawTable::new(crude, published, columns);
    for row in &table.rows {
        if header_row.is_some_and(|h| std::ptr::eq(h, row)) {
            continue;
        }
        let label = row.header_texts().next().unwrap_or_default().to_string();
        let cells: Vec<String> = row.data_texts().map(|c| c.replace(',', "")).collect();
        if label.is_empty() && cells.is_empty() {
            continue;
        }
        raw.rows.push(RawRow { label, cells });
    }
    raw
}
