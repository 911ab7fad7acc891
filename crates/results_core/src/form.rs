use url::form_urlencoded;

use crate::{PatientInfo, PortalConfig};

/// Lookup page for a control number and lab license.
///
/// Values are not validated; they are only percent-encoded as query components.
pub fn build_lookup_url(config: &PortalConfig, control: &str, license: &str) -> String {
    format!(
        "{}{}?controlnumber={}&lablicense={}",
        config.base_url,
        config.patient_path,
        encode_component(control),
        encode_component(license)
    )
}

/// Key/value pairs of the patient identification form, in submission order.
///
/// The CAPTCHA field is always sent empty; nothing here solves it.
pub fn build_submission_body(
    config: &PortalConfig,
    patient: &PatientInfo,
    control: &str,
    license: &str,
) -> Vec<(String, String)> {
    let fields = &config.form;
    vec![
        (fields.last_name.clone(), patient.name.clone()),
        (fields.birth_year.clone(), patient.year.clone()),
        (fields.birth_month.clone(), patient.month.clone()),
        (fields.birth_day.clone(), patient.day.clone()),
        (fields.control_number.clone(), control.to_string()),
        (fields.license_number.clone(), license.to_string()),
        (fields.captcha.clone(), String::new()),
    ]
}

/// `application/x-www-form-urlencoded` serialization of a form body.
pub fn encode_form(pairs: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish()
}

fn encode_component(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
