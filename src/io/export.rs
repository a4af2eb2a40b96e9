//! Export distillation cut tables to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::AppError;
use crate::mixture::CutPoint;

/// Write a cut table as `fraction,temperature_c`.
///
/// Cuts the curve never reaches are written with an empty temperature.
pub fn write_cut_table_csv(path: &Path, cuts: &[CutPoint]) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create cut table CSV '{}': {e}", path.display())))?;
    write_cut_table(&mut file, cuts)
}

/// Write a cut table to any writer.
pub fn write_cut_table<W: Write>(out: &mut W, cuts: &[CutPoint]) -> Result<(), AppError> {
    writeln!(out, "fraction,temperature_c")
        .map_err(|e| AppError::new(2, format!("Failed to write cut table header: {e}")))?;

    for cut in cuts {
        writeln!(
            out,
            "{:.2},{}",
            cut.fraction,
            cut.temperature.map(|t| format!("{t:.4}")).unwrap_or_default(),
        )
        .map_err(|e| AppError::new(2, format!("Failed to write cut table row: {e}")))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_and_rows() {
        let cuts = [
            CutPoint {
                fraction: 0.05,
                temperature: Some(101.25),
            },
            CutPoint {
                fraction: 0.95,
                temperature: None,
            },
        ];
        let mut buf = Vec::new();
        write_cut_table(&mut buf, &cuts).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "fraction,temperature_c\n0.05,101.2500\n0.95,\n"
        );
    }

    #[test]
    fn writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cuts.csv");
        let cuts = [CutPoint {
            fraction: 0.5,
            temperature: Some(300.0),
        }];
        write_cut_table_csv(&path, &cuts).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.ends_with("0.50,300.0000\n"));
    }
}
