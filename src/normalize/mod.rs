//! Raw assay table normalization.
//!
//! Turns a provider's [`RawTable`] into a clean, temperature-ordered list of
//! [`Sample`]s that is safe to fit:
//!
//! - detect which axis carries temperatures and which carries percent evaporated
//! - parse cells, dropping missing/non-numeric entries (no imputation)
//! - sort by temperature, collapse duplicate temperatures, drop non-monotone points
//!
//! Every dropped cell is recorded so callers can report what happened.

use chrono::NaiveDate;
use log::{debug, warn};

use crate::domain::{RawTable, Sample};
use crate::error::DistillError;

pub mod labels;

use labels::{is_percent_label, is_temperature_label, parse_cell, parse_percent_label, parse_temperature_label};

/// Minimum number of samples needed to identify the 3-parameter model.
pub const MIN_SAMPLES: usize = 3;

/// Where temperatures and percents live in the raw table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// One column of temperatures and one column of percents; row labels unused.
    PairedColumns { temperature: usize, percent: usize },
    /// One row of temperatures and one row of percents; column headers unused.
    PairedRows { temperature: usize, percent: usize },
    /// Row labels are percent labels (`IBP`, `5`, `10`, ...); a column holds temperatures.
    PercentRowLabels { temperature_column: usize },
    /// Column headers are percent labels; a row holds temperatures.
    PercentColumnHeaders { temperature_row: usize },
    /// Row labels are temperatures; a column holds percents.
    TemperatureRowLabels { percent_column: usize },
    /// Column headers are temperatures; a row holds percents.
    TemperatureColumnHeaders { percent_row: usize },
}

/// Why a cell did not make it into the sample list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Missing,
    NotNumeric,
    BadLabel,
    PercentOutOfRange,
    DuplicateTemperature,
    NonMonotone,
}

/// A cell excluded during normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedCell {
    pub label: String,
    pub raw: String,
    pub reason: DropReason,
}

/// Normalizer output: cleaned samples + what was dropped.
#[derive(Debug, Clone)]
pub struct NormalizedProfile {
    pub crude: String,
    pub published: Option<NaiveDate>,
    pub orientation: Orientation,
    /// Sorted by temperature ascending; temperatures unique; fractions non-decreasing.
    pub samples: Vec<Sample>,
    pub dropped: Vec<DroppedCell>,
    pub cells_read: usize,
}

/// Normalize a raw assay table.
pub fn normalize(table: &RawTable) -> Result<NormalizedProfile, DistillError> {
    let orientation = detect_orientation(table)?;
    debug!("{}: detected table orientation {orientation:?}", table.crude);

    let pairs = extract_pairs(table, orientation);
    let cells_read = pairs.len();

    let mut dropped = Vec::new();
    let mut parsed: Vec<Sample> = Vec::with_capacity(pairs.len());
    for pair in pairs {
        match parse_pair(&pair) {
            Ok(sample) => parsed.push(sample),
            Err(reason) => dropped.push(DroppedCell {
                label: pair.label,
                raw: pair.raw,
                reason,
            }),
        }
    }

    let samples = order_samples(parsed, &mut dropped);

    for d in &dropped {
        debug!("{}: dropped '{}' = '{}' ({:?})", table.crude, d.label, d.raw, d.reason);
    }
    if !dropped.is_empty() {
        warn!(
            "{}: dropped {} of {} assay cells during normalization",
            table.crude,
            dropped.len(),
            cells_read
        );
    }

    if samples.len() < MIN_SAMPLES {
        return Err(DistillError::InsufficientData {
            found: samples.len(),
            required: MIN_SAMPLES,
        });
    }

    Ok(NormalizedProfile {
        crude: table.crude.clone(),
        published: table.published,
        orientation,
        samples,
        dropped,
        cells_read,
    })
}

/// Decide which axis carries temperatures and which carries percents.
pub fn detect_orientation(table: &RawTable) -> Result<Orientation, DistillError> {
    let temp_col = best_match(table.columns.iter().map(String::as_str), is_temperature_label);
    let temp_row = best_match(table.rows.iter().map(|r| r.label.as_str()), is_temperature_label);
    let pct_col = best_match(table.columns.iter().map(String::as_str), is_percent_label);
    let pct_row = best_match(table.rows.iter().map(|r| r.label.as_str()), is_percent_label);

    // Numbers carrying a temperature unit ("100 °C") are temperature values,
    // which pins the temperature axis before any axis-name matching.
    let temp_valued_cols = mostly(table.columns.iter().map(String::as_str), is_temperature_value);
    let temp_valued_rows = mostly(table.rows.iter().map(|r| r.label.as_str()), is_temperature_value);
    match (temp_valued_cols, temp_valued_rows) {
        (true, false) if !table.rows.is_empty() => {
            return Ok(Orientation::TemperatureColumnHeaders {
                percent_row: pct_row.unwrap_or(0),
            });
        }
        (false, true) => {
            return Ok(Orientation::TemperatureRowLabels {
                percent_column: pct_col.unwrap_or(0),
            });
        }
        _ => {}
    }

    let orientation = match (temp_col, temp_row, pct_col, pct_row) {
        (Some(t), _, Some(p), _) if t != p => Orientation::PairedColumns {
            temperature: t,
            percent: p,
        },
        (_, Some(t), _, Some(p)) if t != p => Orientation::PairedRows {
            temperature: t,
            percent: p,
        },
        (Some(c), _, _, _) => Orientation::PercentRowLabels { temperature_column: c },
        (None, Some(r), _, _) => Orientation::PercentColumnHeaders { temperature_row: r },
        (None, None, Some(c), _) => Orientation::TemperatureRowLabels { percent_column: c },
        (None, None, None, Some(r)) => Orientation::TemperatureColumnHeaders { percent_row: r },
        (None, None, None, None) => {
            return Err(DistillError::MalformedTable {
                reason: format!(
                    "no temperature or percent-evaporated axis found for crude '{}'",
                    table.crude
                ),
            });
        }
    };

    Ok(orientation)
}

/// A label such as `100 °C` or `212.5 degC`: a number followed by a temperature unit.
fn is_temperature_value(label: &str) -> bool {
    parse_temperature_label(label).is_some() && is_temperature_label(label) > 0
}

/// At least two labels, and at least half of the non-empty ones, satisfy `pred`.
fn mostly<'a>(labels: impl Iterator<Item = &'a str>, pred: impl Fn(&str) -> bool) -> bool {
    let (hits, total) = labels
        .filter(|l| !l.trim().is_empty())
        .fold((0usize, 0usize), |(hits, total), l| (hits + usize::from(pred(l)), total + 1));
    hits >= 2 && 2 * hits >= total
}

/// Index of the highest-scoring label (ties → first).
fn best_match<'a>(labels: impl Iterator<Item = &'a str>, score: impl Fn(&str) -> u8) -> Option<usize> {
    let mut best: Option<(usize, u8)> = None;
    for (idx, label) in labels.enumerate() {
        let s = score(label);
        if s > 0 && best.is_none_or(|(_, b)| s > b) {
            best = Some((idx, s));
        }
    }
    best.map(|(idx, _)| idx)
}

/// A (percent-ish, temperature-ish) pair of raw strings.
#[derive(Debug, Clone)]
struct RawPair {
    /// Human-readable location, for drop reports.
    label: String,
    percent: String,
    temperature: String,
    /// The value cell (as read), for drop reports.
    raw: String,
    /// Whether `percent` is a label (`IBP`, `5`) rather than a numeric cell.
    percent_is_label: bool,
    temperature_is_label: bool,
}

fn cell(row: &[String], idx: usize) -> String {
    row.get(idx).cloned().unwrap_or_default()
}

fn extract_pairs(table: &RawTable, orientation: Orientation) -> Vec<RawPair> {
    match orientation {
        Orientation::PairedColumns { temperature, percent } => table
            .rows
            .iter()
            .map(|row| {
                let t = cell(&row.cells, temperature);
                let p = cell(&row.cells, percent);
                RawPair {
                    label: row.label.clone(),
                    raw: format!("{p} @ {t}"),
                    percent: p,
                    temperature: t,
                    percent_is_label: false,
                    temperature_is_label: false,
                }
            })
            .collect(),
        Orientation::PairedRows { temperature, percent } => {
            let t_row = &table.rows[temperature].cells;
            let p_row = &table.rows[percent].cells;
            (0..t_row.len().max(p_row.len()))
                .map(|j| {
                    let t = cell(t_row, j);
                    let p = cell(p_row, j);
                    RawPair {
                        label: table.columns.get(j).cloned().unwrap_or_else(|| format!("#{j}")),
                        raw: format!("{p} @ {t}"),
                        percent: p,
                        temperature: t,
                        percent_is_label: false,
                        temperature_is_label: false,
                    }
                })
                .collect()
        }
        Orientation::PercentRowLabels { temperature_column } => table
            .rows
            .iter()
            .map(|row| {
                let t = cell(&row.cells, temperature_column);
                RawPair {
                    label: row.label.clone(),
                    raw: t.clone(),
                    percent: row.label.clone(),
                    temperature: t,
                    percent_is_label: true,
                    temperature_is_label: false,
                }
            })
            .collect(),
        Orientation::PercentColumnHeaders { temperature_row } => {
            let t_row = &table.rows[temperature_row].cells;
            table
                .columns
                .iter()
                .enumerate()
                .map(|(j, header)| {
                    let t = cell(t_row, j);
                    RawPair {
                        label: header.clone(),
                        raw: t.clone(),
                        percent: header.clone(),
                        temperature: t,
                        percent_is_label: true,
                        temperature_is_label: false,
                    }
                })
                .collect()
        }
        Orientation::TemperatureRowLabels { percent_column } => table
            .rows
            .iter()
            .map(|row| {
                let p = cell(&row.cells, percent_column);
                RawPair {
                    label: row.label.clone(),
                    raw: p.clone(),
                    percent: p,
                    temperature: row.label.clone(),
                    percent_is_label: false,
                    temperature_is_label: true,
                }
            })
            .collect(),
        Orientation::TemperatureColumnHeaders { percent_row } => {
            let p_row = &table.rows[percent_row].cells;
            table
                .columns
                .iter()
                .enumerate()
                .map(|(j, header)| {
                    let p = cell(p_row, j);
                    RawPair {
                        label: header.clone(),
                        raw: p.clone(),
                        percent: p,
                        temperature: header.clone(),
                        percent_is_label: false,
                        temperature_is_label: true,
                    }
                })
                .collect()
        }
    }
}

fn parse_pair(pair: &RawPair) -> Result<Sample, DropReason> {
    let percent = if pair.percent_is_label {
        parse_percent_label(&pair.percent).ok_or(DropReason::BadLabel)?
    } else {
        parse_cell(pair.percent.trim_end_matches('%'))?
    };
    let temperature = if pair.temperature_is_label {
        parse_temperature_label(&pair.temperature).ok_or(DropReason::BadLabel)?
    } else {
        parse_cell(&pair.temperature)?
    };

    if !(0.0..=100.0).contains(&percent) {
        return Err(DropReason::PercentOutOfRange);
    }
    Ok(Sample::new(temperature, percent / 100.0))
}

/// Sort by temperature, keep the highest fraction per temperature, and drop
/// points that would make the cumulative curve decrease.
fn order_samples(mut samples: Vec<Sample>, dropped: &mut Vec<DroppedCell>) -> Vec<Sample> {
    samples.sort_by(|a, b| {
        a.temperature
            .total_cmp(&b.temperature)
            .then(a.fraction.total_cmp(&b.fraction))
    });

    let mut deduped: Vec<Sample> = Vec::with_capacity(samples.len());
    for s in samples {
        match deduped.last_mut() {
            Some(last) if last.temperature == s.temperature => {
                // Sorted by fraction within a temperature: the newcomer wins.
                dropped.push(dropped_sample(last, DropReason::DuplicateTemperature));
                *last = s;
            }
            _ => deduped.push(s),
        }
    }

    let keep = longest_non_decreasing(&deduped);
    let mut out: Vec<Sample> = Vec::with_capacity(keep.len());
    for (i, s) in deduped.into_iter().enumerate() {
        if keep.binary_search(&i).is_ok() {
            out.push(s);
        } else {
            dropped.push(dropped_sample(&s, DropReason::NonMonotone));
        }
    }
    out
}

/// Indices (ascending) of the longest run of samples whose fractions never
/// decrease. Among equally long runs the one using cooler samples wins.
fn longest_non_decreasing(samples: &[Sample]) -> Vec<usize> {
    let n = samples.len();
    let mut len = vec![1usize; n];
    let mut prev: Vec<Option<usize>> = vec![None; n];

    for i in 0..n {
        for j in 0..i {
            if samples[j].fraction <= samples[i].fraction && len[j] + 1 > len[i] {
                len[i] = len[j] + 1;
                prev[i] = Some(j);
            }
        }
    }

    let Some(best) = (0..n).max_by(|&a, &b| len[a].cmp(&len[b]).then(b.cmp(&a))) else {
        return Vec::new();
    };
    let mut keep = vec![best];
    let mut cursor = best;
    while let Some(j) = prev[cursor] {
        keep.push(j);
        cursor = j;
    }
    keep.reverse();
    keep
}

fn dropped_sample(s: &Sample, reason: DropReason) -> DroppedCell {
    DroppedCell {
        label: format!("{:.1}%", s.fraction * 100.0),
        raw: format!("{}", s.temperature),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn published_layout() -> RawTable {
        // Layout of the published assay page: percent labels down the side,
        // temperature and summary statistics across the top.
        RawTable::new(
            "RA",
            None,
            vec![
                "Temperature( oC )".to_string(),
                "Average( oC )".to_string(),
                "Standard Deviation( oC )".to_string(),
            ],
        )
        .with_row("IBP", ["35.2", "34.0", "2.1"])
        .with_row("5", ["62.0", "60.1", "3.0"])
        .with_row("10", ["90.4", "88.0", "3.3"])
        .with_row("20", ["-", "140.0", "4.0"])
        .with_row("30", ["190.7", "188.5", "4.4"])
        .with_row("50", ["1,284.0", "280.0", "5.0"])
    }

    #[test]
    fn published_layout_uses_temperature_column() {
        let out = normalize(&published_layout()).unwrap();
        assert_eq!(out.orientation, Orientation::PercentRowLabels { temperature_column: 0 });
        let temps: Vec<f64> = out.samples.iter().map(|s| s.temperature).collect();
        assert_eq!(temps, vec![35.2, 62.0, 90.4, 190.7, 1284.0]);
        assert_eq!(out.samples[0].fraction, 0.0);
        assert_eq!(out.samples[4].fraction, 0.5);
        assert_eq!(out.cells_read, 6);
        assert_eq!(out.dropped.len(), 1);
        assert_eq!(out.dropped[0].reason, DropReason::Missing);
    }

    #[test]
    fn transposed_layout_is_detected() {
        let table = RawTable::new(
            "MGS",
            None,
            vec!["IBP".into(), "10%".into(), "50%".into(), "90%".into()],
        )
        .with_row("Temperature (°C)", ["150", "200", "300", "420"]);

        let out = normalize(&table).unwrap();
        assert_eq!(out.orientation, Orientation::PercentColumnHeaders { temperature_row: 0 });
        assert_eq!(out.samples.len(), 4);
        assert_eq!(out.samples[3], Sample::new(420.0, 0.9));
    }

    #[test]
    fn temperature_headers_with_percent_row() {
        let table = RawTable::new("X", None, vec!["300".into(), "100".into(), "200".into()])
            .with_row("Evaporated (%)", ["80", "10", "45"]);

        let out = normalize(&table).unwrap();
        assert_eq!(out.orientation, Orientation::TemperatureColumnHeaders { percent_row: 0 });
        let temps: Vec<f64> = out.samples.iter().map(|s| s.temperature).collect();
        assert_eq!(temps, vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn temperature_row_labels_with_percent_column() {
        let table = RawTable::new("X", None, vec!["Mass % Recovered".into()])
            .with_row("100", ["5"])
            .with_row("200", ["n/a"])
            .with_row("250", ["40"])
            .with_row("350", ["85"]);

        let out = normalize(&table).unwrap();
        assert_eq!(out.orientation, Orientation::TemperatureRowLabels { percent_column: 0 });
        assert_eq!(out.samples.len(), 3);
    }

    #[test]
    fn paired_columns_ignore_row_labels() {
        let table = RawTable::new("X", None, vec!["Percent evaporated".into(), "Temperature".into()])
            .with_row("0", ["0", "40"])
            .with_row("1", ["30", "150"])
            .with_row("2", ["70", "280"])
            .with_row("3", ["95", "450"]);

        let out = normalize(&table).unwrap();
        assert_eq!(
            out.orientation,
            Orientation::PairedColumns {
                temperature: 1,
                percent: 0
            }
        );
        assert_eq!(out.samples[1], Sample::new(150.0, 0.3));
    }

    #[test]
    fn duplicate_temperatures_keep_highest_fraction() {
        let table = RawTable::new("X", None, vec!["Temperature".into()])
            .with_row("IBP", ["40"])
            .with_row("5", ["60"])
            .with_row("10", ["60"])
            .with_row("50", ["200"]);

        let out = normalize(&table).unwrap();
        assert_eq!(out.samples.len(), 3);
        assert_eq!(out.samples[1], Sample::new(60.0, 0.10));
        assert!(out.dropped.iter().any(|d| d.reason == DropReason::DuplicateTemperature));
    }

    #[test]
    fn non_monotone_points_are_dropped() {
        let table = RawTable::new("X", None, vec!["Temperature".into()])
            .with_row("IBP", ["40"])
            .with_row("10", ["100"])
            .with_row("20", ["90"])
            .with_row("30", ["150"])
            .with_row("40", ["200"]);

        let out = normalize(&table).unwrap();
        let fractions: Vec<f64> = out.samples.iter().map(|s| s.fraction).collect();
        assert!(fractions.windows(2).all(|w| w[0] <= w[1]), "{fractions:?}");
        assert!(out.dropped.iter().any(|d| d.reason == DropReason::NonMonotone));
    }

    #[test]
    fn single_cold_outlier_does_not_discard_later_points() {
        // 50 % at 28 °C is a typo for 280 °C.
        let table = RawTable::new("X", None, vec!["Temperature".into()])
            .with_row("IBP", ["35"])
            .with_row("10", ["90"])
            .with_row("30", ["190"])
            .with_row("50", ["28"])
            .with_row("70", ["250"]);

        let out = normalize(&table).unwrap();
        let temps: Vec<f64> = out.samples.iter().map(|s| s.temperature).collect();
        assert_eq!(temps, vec![35.0, 90.0, 190.0, 250.0]);
        assert_eq!(out.dropped.len(), 1);
        assert_eq!(out.dropped[0].reason, DropReason::NonMonotone);
        assert_eq!(out.dropped[0].raw, "28");
    }

    #[test]
    fn equally_long_runs_keep_cooler_samples() {
        let samples = vec![
            Sample::new(40.0, 0.0),
            Sample::new(90.0, 0.2),
            Sample::new(100.0, 0.1),
            Sample::new(150.0, 0.3),
        ];
        assert_eq!(longest_non_decreasing(&samples), vec![0, 1, 3]);
        assert!(longest_non_decreasing(&[]).is_empty());
    }

    #[test]
    fn unit_bearing_temperature_headers() {
        let table = RawTable::new(
            "X",
            None,
            vec!["100 °C".into(), "200 °C".into(), "300 °C".into(), "400 °C".into()],
        )
        .with_row("Evaporated (%)", ["5", "40", "80", "95"]);

        let out = normalize(&table).unwrap();
        assert_eq!(out.orientation, Orientation::TemperatureColumnHeaders { percent_row: 0 });
        assert_eq!(out.samples.len(), 4);
        assert_eq!(out.samples[0], Sample::new(100.0, 0.05));
        assert_eq!(out.samples[3], Sample::new(400.0, 0.95));
    }

    #[test]
    fn unit_bearing_temperature_row_labels() {
        let table = RawTable::new("X", None, vec!["Evaporated (%)".into()])
            .with_row("100 °C", ["5"])
            .with_row("200 °C", ["40"])
            .with_row("300 oC", ["80"])
            .with_row("400 degC", ["95"]);

        let out = normalize(&table).unwrap();
        assert_eq!(out.orientation, Orientation::TemperatureRowLabels { percent_column: 0 });
        let temps: Vec<f64> = out.samples.iter().map(|s| s.temperature).collect();
        assert_eq!(temps, vec![100.0, 200.0, 300.0, 400.0]);
        assert_eq!(out.samples[2].fraction, 0.8);
    }

    #[test]
    fn too_few_samples_is_insufficient_data() {
        let table = RawTable::new("X", None, vec!["Temperature".into()])
            .with_row("IBP", ["40"])
            .with_row("10", ["-"])
            .with_row("20", ["abc"])
            .with_row("30", ["150"]);

        let err = normalize(&table).unwrap_err();
        assert!(matches!(
            err,
            DistillError::InsufficientData {
                found: 2,
                required: 3
            }
        ));
    }

    #[test]
    fn unlabelled_table_is_malformed() {
        let table = RawTable::new("X", None, vec!["a".into(), "b".into()]).with_row("c", ["1", "2"]);
        let err = normalize(&table).unwrap_err();
        assert!(matches!(err, DistillError::MalformedTable { .. }));
    }
}
