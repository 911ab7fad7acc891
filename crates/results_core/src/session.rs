use crate::SessionToken;

/// Pulls the session cookie value out of raw `Set-Cookie` / `Cookie` text.
///
/// Returns `None` for missing or blank input and when the cookie is absent.
pub fn extract_session_token(cookie_name: &str, header: Option<&str>) -> Option<SessionToken> {
    let header = header.map(str::trim).filter(|h| !h.is_empty())?;
    header
        .split(|c: char| c == ';' || c == ',' || c.is_whitespace())
        .filter_map(|pair| pair.strip_prefix(cookie_name)?.strip_prefix('='))
        .find(|value| !value.is_empty())
        .map(SessionToken::new)
}
