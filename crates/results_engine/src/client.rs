use std::time::Duration;

use futures_util::StreamExt;
use portal_logging::{portal_debug, portal_info, portal_warn};
use reqwest::header::{
    HeaderMap, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, ORIGIN, REFERER, SET_COOKIE,
};
use reqwest::{Response, Url};
use results_core::{
    build_lookup_url, build_submission_body, encode_form, extract_session_token, CycleEvent,
    CycleState, LookupKey, PatientInfo, PortalConfig, ResultParser, SessionToken,
};

use crate::{decode_page, CycleUpdate, FailureKind, FetchError, FetchedResults, PdfDocument};

const PDF_ACCEPT: &str = "application/pdf,*/*";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const PDF_SIGNATURE: &[u8] = b"%PDF";
/// How far into a body the PDF signature is searched for.
const SIGNATURE_WINDOW: usize = 1024;

/// Transport knobs. The core defines no timeouts of its own.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 20 * 1024 * 1024,
        }
    }
}

/// Receives every state change of a fetch cycle.
pub trait CycleObserver: Send + Sync {
    fn emit(&self, update: CycleUpdate);
}

/// Observer that only writes transitions to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl CycleObserver for LogObserver {
    fn emit(&self, update: CycleUpdate) {
        portal_debug!("Fetch cycle: {} -> {}", update.from, update.to);
    }
}

#[async_trait::async_trait]
pub trait ResultsPortal: Send + Sync {
    /// Runs one GET -> POST -> parse cycle. An empty record list is a success.
    async fn fetch_results(
        &mut self,
        patient: &PatientInfo,
        key: &LookupKey,
        observer: &dyn CycleObserver,
    ) -> Result<FetchedResults, FetchError>;

    /// Downloads one report, rejecting anything that is not a PDF.
    async fn retrieve_pdf(&self, pdf_url: &str) -> Result<PdfDocument, FetchError>;
}

/// Portal session over a cookie-persisting HTTP client.
///
/// One client owns one cookie jar and one session token; concurrent cycles
/// need separate clients.
pub struct PortalClient {
    config: PortalConfig,
    settings: ClientSettings,
    http: reqwest::Client,
    parser: ResultParser,
    state: CycleState,
    session: Option<SessionToken>,
}

impl PortalClient {
    pub fn new(config: PortalConfig, settings: ClientSettings) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(config.user_agent.clone())
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        let parser = ResultParser::new(config.base_url.clone());

        Ok(Self {
            config,
            settings,
            http,
            parser,
            state: CycleState::Idle,
            session: None,
        })
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Token from the most recent cycle whose response carried cookies.
    pub fn session_token(&self) -> Option<&SessionToken> {
        self.session.as_ref()
    }

    fn transition(
        &mut self,
        event: CycleEvent,
        observer: &dyn CycleObserver,
    ) -> Result<(), FetchError> {
        let from = self.state;
        let to = from
            .advance(event)
            .map_err(|err| FetchError::new(FailureKind::ProcessingError, err.to_string()))?;
        self.state = to;
        observer.emit(CycleUpdate { from, to });
        Ok(())
    }

    async fn run_cycle(
        &mut self,
        patient: &PatientInfo,
        key: &LookupKey,
        observer: &dyn CycleObserver,
    ) -> Result<FetchedResults, FetchError> {
        let lookup_url = build_lookup_url(&self.config, &key.control, &key.license);
        let url = Url::parse(&lookup_url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let origin = url.origin().ascii_serialization();

        portal_info!("Requesting lookup page for control number {}", key.control);
        let response = self
            .http
            .get(url.clone())
            .header(ACCEPT_LANGUAGE, self.config.accept_language.as_str())
            .send()
            .await
            .map_err(map_reqwest_error)?;
        ensure_success(&response)?;
        // Only the cookies matter; drain the page so the connection is reused.
        read_body(response, self.settings.max_bytes).await?;
        self.transition(CycleEvent::SessionEstablished, observer)?;

        portal_info!("Submitting patient form");
        let body = encode_form(&build_submission_body(
            &self.config,
            patient,
            &key.control,
            &key.license,
        ));
        let response = self
            .http
            .post(url)
            .header(ACCEPT_LANGUAGE, self.config.accept_language.as_str())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header(REFERER, lookup_url.as_str())
            .header(ORIGIN, origin.as_str())
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        ensure_success(&response)?;
        let cookies = set_cookie_text(response.headers());
        let content_type = content_type_of(response.headers());
        let bytes = read_body(response, self.settings.max_bytes).await?;
        self.transition(CycleEvent::FormAccepted, observer)?;

        let page = decode_page(&bytes, content_type.as_deref());
        if page.had_errors {
            portal_warn!(
                "Results page had malformed {} sequences; continuing",
                page.encoding_label
            );
        }
        let parsed = self.parser.parse(&page.html);
        if let Some(cookies) = cookies.as_deref() {
            self.session = extract_session_token(&self.config.session_cookie, Some(cookies));
        }
        self.transition(CycleEvent::ResultsParsed, observer)?;
        portal_info!("Fetch cycle found {} results", parsed.records.len());

        Ok(FetchedResults {
            records: parsed.records,
            report: parsed.report,
            session_token: self.session.clone(),
        })
    }
}

#[async_trait::async_trait]
impl ResultsPortal for PortalClient {
    async fn fetch_results(
        &mut self,
        patient: &PatientInfo,
        key: &LookupKey,
        observer: &dyn CycleObserver,
    ) -> Result<FetchedResults, FetchError> {
        if self.state.is_in_flight() {
            // A previous cycle was dropped mid-flight.
            portal_warn!("Abandoning unfinished fetch cycle in state {}", self.state);
            self.transition(CycleEvent::Fail, observer)?;
        }
        self.transition(CycleEvent::Start, observer)?;

        match self.run_cycle(patient, key, observer).await {
            Ok(results) => Ok(results),
            Err(err) => {
                portal_warn!("Fetch cycle failed in state {}: {}", self.state, err);
                if self.state.is_in_flight() {
                    self.transition(CycleEvent::Fail, observer)?;
                }
                Err(err)
            }
        }
    }

    async fn retrieve_pdf(&self, pdf_url: &str) -> Result<PdfDocument, FetchError> {
        let url = Url::parse(pdf_url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;

        portal_info!("Retrieving PDF {}", url.path());
        let response = self
            .http
            .get(url)
            .header(ACCEPT, PDF_ACCEPT)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        ensure_success(&response)?;
        let content_type = content_type_of(response.headers());
        let bytes = read_body(response, self.settings.max_bytes).await?;

        if !looks_like_pdf(content_type.as_deref(), &bytes) {
            let declared = content_type.unwrap_or_else(|| "unknown".to_string());
            return Err(FetchError::new(
                FailureKind::ContentMismatch {
                    content_type: declared,
                },
                "response is not a pdf",
            ));
        }

        Ok(PdfDocument {
            url: pdf_url.to_string(),
            content_type,
            bytes,
        })
    }
}

/// Declared content type first, then the `%PDF` signature near the start.
fn looks_like_pdf(content_type: Option<&str>, bytes: &[u8]) -> bool {
    if content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("pdf")) {
        return true;
    }
    let head = &bytes[..bytes.len().min(SIGNATURE_WINDOW)];
    head.windows(PDF_SIGNATURE.len()).any(|w| w == PDF_SIGNATURE)
}

fn ensure_success(response: &Response) -> Result<(), FetchError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(FetchError::new(
            FailureKind::HttpStatus(status.as_u16()),
            status.to_string(),
        ))
    }
}

fn content_type_of(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

fn set_cookie_text(headers: &HeaderMap) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();
    (!values.is_empty()).then(|| values.join(", "))
}

async fn read_body(response: Response, max_bytes: u64) -> Result<Vec<u8>, FetchError> {
    if let Some(content_len) = response.content_length() {
        if content_len > max_bytes {
            return Err(FetchError::new(
                FailureKind::TooLarge {
                    max_bytes,
                    actual: Some(content_len),
                },
                "response too large",
            ));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(map_reqwest_error)?;
        let next_len = bytes.len() as u64 + chunk.len() as u64;
        if next_len > max_bytes {
            return Err(FetchError::new(
                FailureKind::TooLarge {
                    max_bytes,
                    actual: Some(next_len),
                },
                "response too large",
            ));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_detection_uses_header_then_signature() {
        assert!(looks_like_pdf(Some("application/PDF"), b""));
        assert!(looks_like_pdf(Some("application/octet-stream"), b"%PDF-1.7\n"));
        assert!(looks_like_pdf(None, b"\r\n%PDF-1.4"));
        assert!(!looks_like_pdf(Some("text/html"), b"<html>expired</html>"));
    }
}
