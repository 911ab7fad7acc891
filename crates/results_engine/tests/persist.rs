use std::fs;

use results_core::ResultRecord;
use results_engine::{ensure_output_dir, save_pdf, AtomicFileWriter, PdfDocument};
use tempfile::TempDir;

fn record() -> ResultRecord {
    ResultRecord {
        order: "000123".to_string(),
        license: "LAB01".to_string(),
        transmitted: "2024-01-05 10:00".to_string(),
        pdf_url: "https://www.misresultados.com/pdf/abc.pdf".to_string(),
    }
}

fn document(bytes: &[u8]) -> PdfDocument {
    PdfDocument {
        url: record().pdf_url,
        content_type: Some("application/pdf".to_string()),
        bytes: bytes.to_vec(),
    }
}

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("descargas");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn saved_pdf_uses_download_name_and_replaces_existing() {
    let temp = TempDir::new().unwrap();

    let first = save_pdf(temp.path(), &record(), &document(b"%PDF-1 first")).unwrap();
    assert_eq!(
        first.file_name().unwrap(),
        "resultado_000123_2024-01-05-10-00.pdf"
    );
    assert_eq!(fs::read(&first).unwrap(), b"%PDF-1 first");

    let second = save_pdf(temp.path(), &record(), &document(b"%PDF-1 second")).unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read(&second).unwrap(), b"%PDF-1 second");
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    let result = writer.write("doc.pdf", b"data");
    assert!(result.is_err());
    assert!(!file_path.with_file_name("doc.pdf").exists());
}
