use results_core::{extract_session_token, SessionToken};

#[test]
fn token_is_read_from_set_cookie_text() {
    let header = "PHPSESSID=abc123def; path=/; HttpOnly";
    assert_eq!(
        extract_session_token("PHPSESSID", Some(header)),
        Some(SessionToken::new("abc123def"))
    );
}

#[test]
fn token_is_found_among_other_cookies() {
    let header = "lang=es; path=/, PHPSESSID=zz9; path=/";
    let token = extract_session_token("PHPSESSID", Some(header));
    assert_eq!(token.as_ref().map(SessionToken::as_str), Some("zz9"));
}

#[test]
fn extraction_is_idempotent() {
    let header = "PHPSESSID=same; path=/";
    let first = extract_session_token("PHPSESSID", Some(header));
    let second = extract_session_token("PHPSESSID", Some(header));
    assert_eq!(first, second);
}

#[test]
fn blank_or_unmatched_input_is_absent() {
    assert_eq!(extract_session_token("PHPSESSID", None), None);
    assert_eq!(extract_session_token("PHPSESSID", Some("")), None);
    assert_eq!(extract_session_token("PHPSESSID", Some("   ")), None);
    assert_eq!(extract_session_token("PHPSESSID", Some("OTHER=1; path=/")), None);
    assert_eq!(extract_session_token("PHPSESSID", Some("XPHPSESSID=1")), None);
}

#[test]
fn empty_value_is_skipped_for_a_later_cookie() {
    let header = "PHPSESSID=; Max-Age=0, PHPSESSID=fresh7; path=/";
    assert_eq!(
        extract_session_token("PHPSESSID", Some(header)),
        Some(SessionToken::new("fresh7"))
    );
}
