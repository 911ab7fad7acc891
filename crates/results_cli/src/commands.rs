use std::path::{Path, PathBuf};

use portal_logging::{portal_error, portal_warn};
use results_core::{CycleState, LookupKey, PatientInfo, ResultRecord};
use results_engine::{
    save_pdf, CycleObserver, CycleUpdate, FailureKind, FetchError, LogObserver, PersistError,
    ResultsPortal,
};

use crate::i18n::{Catalog, Language, Message};
use crate::profile::{ProfileError, ProfileStore};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("patient information is incomplete")]
    PatientIncomplete,
    #[error("no patient information saved")]
    NoPatientInfo,
    #[error("no control number and license in link")]
    InvalidLink,
    #[error("control number or license missing")]
    MissingLookupKey,
    #[error("unsupported language {0:?}")]
    UnknownLanguage(String),
    #[error("fetching results failed: {0}")]
    Fetch(#[source] FetchError),
    #[error("{failed} of {total} pdf downloads failed; last error: {last}")]
    Pdf {
        failed: usize,
        total: usize,
        last: FetchError,
    },
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("failed to render results: {0}")]
    Output(#[from] serde_json::Error),
}

/// Translated, actionable text for a failure.
pub fn user_message(catalog: &Catalog, err: &CliError) -> String {
    let message = match err {
        CliError::PatientIncomplete => Message::PatientIncomplete,
        CliError::NoPatientInfo => Message::NoPatientInfo,
        CliError::InvalidLink => Message::InvalidLink,
        CliError::MissingLookupKey => Message::MissingLookupKey,
        CliError::UnknownLanguage(_) => Message::UnknownLanguage,
        CliError::Fetch(fetch) => match fetch.kind {
            FailureKind::HttpStatus(_) => Message::PortalRejected,
            FailureKind::Timeout => Message::PortalTimeout,
            _ => Message::FetchFailed,
        },
        CliError::Pdf { last, .. } => match last.kind {
            FailureKind::ContentMismatch { .. } => Message::NotAPdf,
            _ => Message::PdfFailed,
        },
        CliError::Profile(_) | CliError::Persist(_) => Message::SaveFailed,
        CliError::Output(_) => Message::Generic,
    };
    catalog.text(message).to_string()
}

/// Flags shared by the lookup commands.
#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    pub json: bool,
    pub download_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupSummary {
    pub records: usize,
    pub saved: Vec<PathBuf>,
}

/// Prints progress for the slow steps of a fetch cycle.
struct ProgressObserver {
    catalog: Catalog,
}

impl CycleObserver for ProgressObserver {
    fn emit(&self, update: CycleUpdate) {
        LogObserver.emit(update);
        match update.to {
            CycleState::AwaitingSessionPage => {
                eprintln!("{}", self.catalog.text(Message::FetchingResults))
            }
            CycleState::SubmittingForm => {
                eprintln!("{}", self.catalog.text(Message::SubmittingForm))
            }
            _ => {}
        }
    }
}

pub fn set_patient(
    store: &ProfileStore,
    catalog: &Catalog,
    patient: PatientInfo,
) -> Result<(), CliError> {
    let complete = [&patient.name, &patient.year, &patient.month, &patient.day]
        .iter()
        .all(|field| !field.is_empty());
    if !complete {
        return Err(CliError::PatientIncomplete);
    }
    store.set_patient(&patient)?;
    println!("{}", catalog.text(Message::PatientSaved));
    Ok(())
}

pub fn show_patient(store: &ProfileStore) -> Result<(), CliError> {
    let patient = store.patient().ok_or(CliError::NoPatientInfo)?;
    println!("{} ({})", patient.name, patient.birth_date());
    Ok(())
}

pub fn clear_patient(store: &ProfileStore, catalog: &Catalog) -> Result<(), CliError> {
    store.clear_patient()?;
    println!("{}", catalog.text(Message::PatientCleared));
    Ok(())
}

pub fn set_language(store: &ProfileStore, code: &str) -> Result<Language, CliError> {
    let language =
        Language::from_code(code).ok_or_else(|| CliError::UnknownLanguage(code.to_string()))?;
    store.set_language(language.code())?;
    println!("{}", Catalog::new(language).text(Message::LanguageSaved));
    Ok(language)
}

pub fn manual_key(control: &str, license: &str) -> Result<LookupKey, CliError> {
    let (control, license) = (control.trim(), license.trim());
    if control.is_empty() || license.is_empty() {
        return Err(CliError::MissingLookupKey);
    }
    Ok(LookupKey::new(control, license))
}

pub fn link_key(link: &str) -> Result<LookupKey, CliError> {
    results_core::parse_lookup_key(link).ok_or(CliError::InvalidLink)
}

/// Fetches, prints and optionally downloads the results for one lookup key.
///
/// A failed PDF download does not stop the others; it is reported once all
/// records have been tried.
pub async fn run_lookup<P: ResultsPortal>(
    portal: &mut P,
    catalog: &Catalog,
    patient: &PatientInfo,
    key: &LookupKey,
    options: &OutputOptions,
) -> Result<LookupSummary, CliError> {
    let observer = ProgressObserver { catalog: *catalog };
    let results = portal
        .fetch_results(patient, key, &observer)
        .await
        .map_err(CliError::Fetch)?;

    let mut summary = LookupSummary {
        records: results.records.len(),
        saved: Vec::new(),
    };
    if results.records.is_empty() {
        println!("{}", catalog.text(Message::NoResults));
        return Ok(summary);
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&results.records)?);
    } else {
        print_records(catalog, &results.records);
    }

    let Some(dir) = options.download_dir.as_deref() else {
        return Ok(summary);
    };
    let mut last_failure = None;
    let mut failed = 0;
    for record in &results.records {
        eprintln!("{} {}...", catalog.text(Message::DownloadingPdf), record.order);
        match download(portal, dir, record).await {
            Ok(path) => {
                println!("{}", path.display());
                summary.saved.push(path);
            }
            Err(DownloadError::Fetch(err)) => {
                portal_warn!("PDF for order {} failed: {}", record.order, err);
                failed += 1;
                last_failure = Some(err);
            }
            Err(DownloadError::Persist(err)) => {
                portal_error!("Could not save PDF for order {}: {}", record.order, err);
                return Err(err.into());
            }
        }
    }

    match last_failure {
        Some(last) => Err(CliError::Pdf {
            failed,
            total: results.records.len(),
            last,
        }),
        None => Ok(summary),
    }
}

enum DownloadError {
    Fetch(FetchError),
    Persist(PersistError),
}

async fn download<P: ResultsPortal>(
    portal: &P,
    dir: &Path,
    record: &ResultRecord,
) -> Result<PathBuf, DownloadError> {
    let document = portal
        .retrieve_pdf(&record.pdf_url)
        .await
        .map_err(DownloadError::Fetch)?;
    save_pdf(dir, record, &document).map_err(DownloadError::Persist)
}

fn print_records(catalog: &Catalog, records: &[ResultRecord]) {
    println!("{}", catalog.results_count(records.len()));
    for record in records {
        println!(
            "{}: {}  {}: {}  {}: {}",
            catalog.text(Message::Order),
            record.order,
            catalog.text(Message::License),
            record.license,
            catalog.text(Message::Transmitted),
            record.transmitted
        );
        println!("  {}", record.pdf_url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use results_core::{ParseReport, SessionToken};
    use results_engine::{FetchedResults, PdfDocument};
    use tempfile::TempDir;

    struct FakePortal {
        records: Vec<ResultRecord>,
        pdf: Result<PdfDocument, FetchError>,
        fetch_error: Option<FetchError>,
    }

    fn fetch_error(kind: FailureKind) -> FetchError {
        FetchError {
            kind,
            message: "fake".to_string(),
        }
    }

    #[async_trait::async_trait]
    impl ResultsPortal for FakePortal {
        async fn fetch_results(
            &mut self,
            _patient: &PatientInfo,
            _key: &LookupKey,
            observer: &dyn CycleObserver,
        ) -> Result<FetchedResults, FetchError> {
            observer.emit(CycleUpdate {
                from: CycleState::Idle,
                to: CycleState::AwaitingSessionPage,
            });
            if let Some(err) = self.fetch_error.clone() {
                return Err(err);
            }
            Ok(FetchedResults {
                records: self.records.clone(),
                report: ParseReport::default(),
                session_token: Some(SessionToken::new("fake")),
            })
        }

        async fn retrieve_pdf(&self, _pdf_url: &str) -> Result<PdfDocument, FetchError> {
            self.pdf.clone()
        }
    }

    fn record(order: &str) -> ResultRecord {
        ResultRecord {
            order: order.to_string(),
            license: "LAB01".to_string(),
            transmitted: "2024-01-05 10:00".to_string(),
            pdf_url: format!("https://portal.example/pdf/{order}.pdf"),
        }
    }

    fn pdf() -> PdfDocument {
        PdfDocument {
            url: "https://portal.example/pdf/x.pdf".to_string(),
            content_type: Some("application/pdf".to_string()),
            bytes: b"%PDF-1.4".to_vec(),
        }
    }

    fn patient() -> PatientInfo {
        PatientInfo::new("Rivera", "1980", "03", "07")
    }

    #[tokio::test]
    async fn lookup_downloads_every_record() {
        let temp = TempDir::new().unwrap();
        let mut portal = FakePortal {
            records: vec![record("1"), record("2")],
            pdf: Ok(pdf()),
            fetch_error: None,
        };
        let options = OutputOptions {
            json: true,
            download_dir: Some(temp.path().to_path_buf()),
        };

        let summary = run_lookup(
            &mut portal,
            &Catalog::default(),
            &patient(),
            &LookupKey::new("1", "LAB01"),
            &options,
        )
        .await
        .unwrap();

        assert_eq!(summary.records, 2);
        assert_eq!(summary.saved.len(), 2);
        assert!(summary.saved.iter().all(|path| path.exists()));
    }

    #[tokio::test]
    async fn empty_results_are_not_an_error() {
        let mut portal = FakePortal {
            records: Vec::new(),
            pdf: Ok(pdf()),
            fetch_error: None,
        };
        let summary = run_lookup(
            &mut portal,
            &Catalog::default(),
            &patient(),
            &LookupKey::new("1", "LAB01"),
            &OutputOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(summary, LookupSummary::default());
    }

    #[tokio::test]
    async fn pdf_mismatch_is_reported_after_all_records() {
        let temp = TempDir::new().unwrap();
        let mut portal = FakePortal {
            records: vec![record("1"), record("2")],
            pdf: Err(fetch_error(FailureKind::ContentMismatch {
                content_type: "text/html".to_string(),
            })),
            fetch_error: None,
        };
        let options = OutputOptions {
            json: false,
            download_dir: Some(temp.path().to_path_buf()),
        };

        let err = run_lookup(
            &mut portal,
            &Catalog::new(Language::En),
            &patient(),
            &LookupKey::new("1", "LAB01"),
            &options,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CliError::Pdf { failed: 2, total: 2, .. }));
        assert_eq!(
            user_message(&Catalog::new(Language::En), &err),
            Catalog::new(Language::En).text(Message::NotAPdf)
        );
    }

    #[tokio::test]
    async fn portal_status_error_maps_to_rejection_message() {
        let mut portal = FakePortal {
            records: Vec::new(),
            pdf: Ok(pdf()),
            fetch_error: Some(fetch_error(FailureKind::HttpStatus(403))),
        };
        let err = run_lookup(
            &mut portal,
            &Catalog::default(),
            &patient(),
            &LookupKey::new("1", "LAB01"),
            &OutputOptions::default(),
        )
        .await
        .unwrap_err();
        assert_eq!(
            user_message(&Catalog::default(), &err),
            Catalog::default().text(Message::PortalRejected)
        );
    }

    #[test]
    fn keys_are_validated() {
        assert!(matches!(manual_key(" ", "L"), Err(CliError::MissingLookupKey)));
        assert_eq!(manual_key(" 12 ", "L1").unwrap(), LookupKey::new("12", "L1"));
        assert!(matches!(link_key("hola"), Err(CliError::InvalidLink)));
        assert_eq!(
            link_key("https://x.example/p?controlnumber=1&lablicense=2").unwrap(),
            LookupKey::new("1", "2")
        );
    }

    #[test]
    fn incomplete_patient_is_rejected() {
        let temp = TempDir::new().unwrap();
        let store = ProfileStore::new(temp.path().to_path_buf());
        let patient = PatientInfo::new("", "1980", "1", "1");
        assert!(matches!(
            set_patient(&store, &Catalog::default(), patient),
            Err(CliError::PatientIncomplete)
        ));
        assert_eq!(store.patient(), None);
    }
}
