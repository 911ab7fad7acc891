use chardetng::EncodingDetector;
use encoding_rs::Encoding;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPage {
    pub html: String,
    pub encoding_label: String,
    /// Malformed sequences were replaced with U+FFFD.
    pub had_errors: bool,
}

/// Decode raw bytes into UTF-8 using: BOM -> Content-Type charset -> chardetng fallback.
///
/// Decoding is lossy; the result page is scraped, not validated.
pub fn decode_page(bytes: &[u8], content_type: Option<&str>) -> DecodedPage {
    // 1) BOM aware decode using encoding_rs helper
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    // 2) Content-Type header charset
    if let Some(label) = content_type.and_then(extract_charset) {
        if let Some(enc) = Encoding::for_label(label.as_bytes()) {
            return decode_with(bytes, enc);
        }
    }

    // 3) chardetng detection (the portal serves Spanish text, often Latin-1)
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let enc = detector.guess(None, true);
    decode_with(bytes, enc)
}

fn extract_charset(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .filter_map(|part| {
            let part = part.trim();
            let (key, value) = part.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("charset")
                .then(|| value.trim_matches([' ', '"', '\''].as_ref()))
        })
        .next()
        .map(|s| s.to_string())
}

fn decode_with(bytes: &[u8], enc: &'static Encoding) -> DecodedPage {
    let (text, used, had_errors) = enc.decode(bytes);
    DecodedPage {
        html: text.into_owned(),
        encoding_label: used.name().to_string(),
        had_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charset_header_is_respected() {
        let decoded = decode_page(b"Mu\xf1oz", Some("text/html; Charset=ISO-8859-1"));
        assert_eq!(decoded.html, "Muñoz");
        assert!(!decoded.had_errors);
    }

    #[test]
    fn utf8_bom_wins_over_header() {
        let decoded = decode_page(b"\xEF\xBB\xBFhola", Some("text/html; charset=windows-1252"));
        assert_eq!(decoded.html, "hola");
        assert_eq!(decoded.encoding_label, "UTF-8");
    }

    #[test]
    fn malformed_utf8_is_replaced_not_rejected() {
        let decoded = decode_page(b"ok \xff end", Some("text/html; charset=utf-8"));
        assert!(decoded.had_errors);
        assert!(decoded.html.starts_with("ok "));
        assert!(decoded.html.ends_with(" end"));
    }
}
