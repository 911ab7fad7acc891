use std::fmt;

use serde::{Deserialize, Serialize};

/// Patient identity submitted to the portal. Month and day are zero-padded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientInfo {
    pub name: String,
    pub year: String,
    pub month: String,
    pub day: String,
}

impl PatientInfo {
    pub fn new(
        name: impl Into<String>,
        year: impl Into<String>,
        month: impl Into<String>,
        day: impl Into<String>,
    ) -> Self {
        let (name, year, month, day): (String, String, String, String) =
            (name.into(), year.into(), month.into(), day.into());
        Self {
            name: name.trim().to_string(),
            year: year.trim().to_string(),
            month: zero_pad(&month),
            day: zero_pad(&day),
        }
    }

    /// `DD/MM/YYYY`, the way the portal prints birth dates.
    pub fn birth_date(&self) -> String {
        format!("{}/{}/{}", self.day, self.month, self.year)
    }
}

fn zero_pad(value: &str) -> String {
    let value = value.trim();
    if value.len() == 1 {
        format!("0{value}")
    } else {
        value.to_string()
    }
}

/// Control number and lab license identifying one results query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupKey {
    pub control: String,
    pub license: String,
}

impl LookupKey {
    pub fn new(control: impl Into<String>, license: impl Into<String>) -> Self {
        Self {
            control: control.into(),
            license: license.into(),
        }
    }
}

/// One lab report row scraped from the results table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub order: String,
    pub license: String,
    pub transmitted: String,
    pub pdf_url: String,
}

/// Opaque session cookie value used for authenticated PDF retrieval.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Session values end up in logs; keep them out of Debug output.
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionToken(<{} chars>)", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patient_info_pads_month_and_day() {
        let patient = PatientInfo::new(" Garcia Lopez ", "1980", "3", "7");
        assert_eq!(patient.name, "Garcia Lopez");
        assert_eq!(patient.month, "03");
        assert_eq!(patient.day, "07");
        assert_eq!(patient.birth_date(), "07/03/1980");
    }

    #[test]
    fn session_token_debug_hides_value() {
        let token = SessionToken::new("secret-value");
        assert!(!format!("{token:?}").contains("secret"));
        assert_eq!(token.as_str(), "secret-value");
    }
}
