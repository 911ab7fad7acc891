use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::LookupKey;

const CONTROL_PARAMS: [&str; 2] = ["controlnumber", "control"];
const LICENSE_PARAMS: [&str; 2] = ["lablicense", "license"];

// Shared links are not standardized: the pair may appear in either order.
static LOOKUP_PAIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:controlnumber|control)=([^&\s#]+).*?(?:lablicense|license)=([^&\s#]+)|(?:lablicense|license)=([^&\s#]+).*?(?:controlnumber|control)=([^&\s#]+)",
    )
    .expect("lookup pair pattern compiles")
});

/// Recovers a control number / lab license pair from a shared results link.
///
/// Tries a structured URL parse first and falls back to pattern matching
/// anywhere in the text. `None` means no complete pair was found.
pub fn parse_lookup_key(raw: &str) -> Option<LookupKey> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    from_query(raw).or_else(|| from_pattern(raw))
}

fn from_query(raw: &str) -> Option<LookupKey> {
    let url = Url::parse(raw).ok()?;
    let control = first_param(&url, &CONTROL_PARAMS)?;
    let license = first_param(&url, &LICENSE_PARAMS)?;
    Some(LookupKey::new(control, license))
}

fn first_param(url: &Url, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        url.query_pairs()
            .find(|(key, value)| key == name && !value.is_empty())
            .map(|(_, value)| value.into_owned())
    })
}

fn from_pattern(raw: &str) -> Option<LookupKey> {
    let caps = LOOKUP_PAIR_RE.captures(raw)?;
    let control = caps.get(1).or_else(|| caps.get(4))?;
    let license = caps.get(2).or_else(|| caps.get(3))?;
    Some(LookupKey::new(control.as_str(), license.as_str()))
}
