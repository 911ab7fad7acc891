/// Fixed strings describing the results portal: where it lives, what the
/// patient form calls its fields and which cookie carries the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    /// Scheme and host, without a trailing slash.
    pub base_url: String,
    pub patient_path: String,
    pub session_cookie: String,
    pub user_agent: String,
    pub accept_language: String,
    pub form: FormFieldNames,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.misresultados.com".to_string(),
            patient_path: "/patient".to_string(),
            session_cookie: "PHPSESSID".to_string(),
            user_agent: concat!("lab-results/", env!("CARGO_PKG_VERSION")).to_string(),
            accept_language: "en-US,en;q=0.5".to_string(),
            form: FormFieldNames::default(),
        }
    }
}

impl PortalConfig {
    /// Same portal layout, different origin. Used to point at mirrors and mock servers.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }
}

/// Field names of the patient identification form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFieldNames {
    pub last_name: String,
    pub birth_year: String,
    pub birth_month: String,
    pub birth_day: String,
    pub control_number: String,
    pub license_number: String,
    pub captcha: String,
}

impl Default for FormFieldNames {
    fn default() -> Self {
        Self {
            last_name: "apellidos".to_string(),
            birth_year: "anio".to_string(),
            birth_month: "mes".to_string(),
            birth_day: "dia".to_string(),
            control_number: "numerocontrol".to_string(),
            license_number: "licencia".to_string(),
            captcha: "g-recaptcha-response".to_string(),
        }
    }
}
