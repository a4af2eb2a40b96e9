//! Fitting from a directory of assay CSV exports.

use std::fs;

use distill_blend::{AssayDate, CsvDirProvider, ErrorKind, fit_profile, mixture_profile};

const MGS_OLD: &str = "\
Mass % Recovered,Temperature ( oC )
IBP,160.0
10,220.0
30,280.0
50,330.0
70,380.0
90,440.0
";

const MGS_NEW: &str = "\
Mass % Recovered,Temperature ( oC )
IBP,150.0
10,210.0
30,270.0
50,320.0
70,370.0
95,450.0
";

const RA: &str = "\
Mass % Recovered,Temperature ( oC )
IBP,35.0
10,95.0
30,170.0
50,240.0
70,310.0
90,\"1,005.0\"
";

fn data_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("MGS_2019-03-01.csv"), MGS_OLD).unwrap();
    fs::write(dir.path().join("MGS_2020-06-10.csv"), MGS_NEW).unwrap();
    fs::write(dir.path().join("RA.csv"), RA).unwrap();
    dir
}

#[test]
fn recent_uses_latest_dated_file() {
    let dir = data_dir();
    let provider = CsvDirProvider::new(dir.path());
    let fit = fit_profile(&provider, "mgs", &AssayDate::Recent, None).unwrap();
    assert_eq!(fit.span().min, 150.0);
    assert_eq!(fit.span().max, 450.0);
    assert!(fit.r_squared() > 0.98);
}

#[test]
fn explicit_date_selects_that_file() {
    let dir = data_dir();
    let provider = CsvDirProvider::new(dir.path());
    let date: AssayDate = "2019-03-01".parse().unwrap();
    let fit = fit_profile(&provider, "MGS", &date, None).unwrap();
    assert_eq!(fit.span().min, 160.0);

    let missing: AssayDate = "2021-01-01".parse().unwrap();
    let err = fit_profile(&provider, "MGS", &missing, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataUnavailable);
}

#[test]
fn thousands_separators_are_read() {
    let dir = data_dir();
    let provider = CsvDirProvider::new(dir.path());
    let fit = fit_profile(&provider, "RA", &AssayDate::Recent, None).unwrap();
    assert_eq!(fit.span().max, 1005.0);
}

#[test]
fn blends_from_disk() {
    let dir = data_dir();
    let provider = CsvDirProvider::new(dir.path());
    let blend = mixture_profile(&provider, "MGS", "RA", 3.0, 1.0, &AssayDate::Recent).unwrap();
    assert_eq!(blend.components()[0].crude, "MGS");
    assert_eq!(blend.components()[1].crude, "RA");
    assert!((blend.weights().0 - 0.75).abs() < 1e-12);
}
