//! Saved patient profile and language preference.

use std::fs;
use std::path::PathBuf;

use portal_logging::{portal_debug, portal_warn};
use results_core::PatientInfo;
use results_engine::{AtomicFileWriter, PersistError};
use serde::{Deserialize, Serialize};

const PROFILE_FILENAME: &str = ".lab_results_profile.ron";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub patient: Option<PatientInfo>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("failed to serialize profile: {0}")]
    Serialize(#[from] ron::Error),
    #[error("failed to write profile: {0}")]
    Persist(#[from] PersistError),
}

/// RON-backed store in a single directory. A missing or unreadable file reads
/// as an empty profile.
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn load(&self) -> Profile {
        let path = self.dir.join(PROFILE_FILENAME);
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Profile::default();
            }
            Err(err) => {
                portal_warn!("Failed to read profile from {:?}: {}", path, err);
                return Profile::default();
            }
        };

        match ron::from_str(&content) {
            Ok(profile) => profile,
            Err(err) => {
                portal_warn!("Failed to parse profile from {:?}: {}", path, err);
                Profile::default()
            }
        }
    }

    fn save(&self, profile: &Profile) -> Result<(), ProfileError> {
        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(profile, pretty)?;
        let writer = AtomicFileWriter::new(self.dir.clone());
        let path = writer.write(PROFILE_FILENAME, content)?;
        portal_debug!("Saved profile to {:?}", path);
        Ok(())
    }

    pub fn patient(&self) -> Option<PatientInfo> {
        self.load().patient
    }

    pub fn set_patient(&self, patient: &PatientInfo) -> Result<(), ProfileError> {
        let mut profile = self.load();
        profile.patient = Some(patient.clone());
        self.save(&profile)
    }

    pub fn clear_patient(&self) -> Result<(), ProfileError> {
        let mut profile = self.load();
        profile.patient = None;
        self.save(&profile)
    }

    pub fn language(&self) -> Option<String> {
        self.load().language
    }

    pub fn set_language(&self, code: &str) -> Result<(), ProfileError> {
        let mut profile = self.load();
        profile.language = Some(code.to_string());
        self.save(&profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_an_empty_profile() {
        let temp = TempDir::new().unwrap();
        let store = ProfileStore::new(temp.path().to_path_buf());
        assert_eq!(store.load(), Profile::default());
        assert_eq!(store.patient(), None);
    }

    #[test]
    fn patient_round_trips_and_clears_without_touching_language() {
        let temp = TempDir::new().unwrap();
        let store = ProfileStore::new(temp.path().to_path_buf());
        let patient = PatientInfo::new("Rivera Cruz", "1980", "3", "7");

        store.set_language("en").unwrap();
        store.set_patient(&patient).unwrap();
        assert_eq!(store.patient(), Some(patient));

        store.clear_patient().unwrap();
        assert_eq!(store.patient(), None);
        assert_eq!(store.language().as_deref(), Some("en"));
    }

    #[test]
    fn corrupt_file_reads_as_empty_profile() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(PROFILE_FILENAME), "not ron at all {").unwrap();
        let store = ProfileStore::new(temp.path().to_path_buf());
        assert_eq!(store.load(), Profile::default());
    }
}
