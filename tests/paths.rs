use litchi_xlsx::sheet::Workbook;
use litchi_xlsx::{OpenOptions, SaveOptions};

#[test]
fn test_save_and_open_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("book.xlsx");

    let mut wb = Workbook::new();
    wb.worksheet_mut("Sheet1").unwrap().set_value("C3", "on disk").unwrap();
    wb.save_path(&path, &SaveOptions::new()).unwrap();

    let back = Workbook::open_path(&path, &OpenOptions::new()).unwrap();
    assert_eq!(back.worksheet("Sheet1").unwrap().cell_count(), 1);
}

#[test]
fn test_open_missing_path() {
    let dir = tempfile::tempdir().unwrap();
    let err = Workbook::open_path(dir.path().join("missing.xlsx"), &OpenOptions::new()).unwrap_err();
    assert!(matches!(err, litchi_xlsx::Error::Io(_)));
}

#[cfg(feature = "encryption")]
#[test]
fn test_encrypted_file_on_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let wb = Workbook::new();
    let options = SaveOptions::new()
        .with_password("pw")
        .with_encryption(litchi_xlsx::AgileParams {
            spin_count: 100,
            ..Default::default()
        });
    std::io::Write::write_all(&mut file, &wb.save_with(&options).unwrap()).unwrap();

    let back = Workbook::open_path(file.path(), &OpenOptions::new().with_password("pw")).unwrap();
    assert_eq!(back.sheet_names().collect::<Vec<_>>(), ["Sheet1"]);
}
