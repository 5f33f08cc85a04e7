use chardetng::EncodingDetector;
use encoding_rs::Encoding;

/// How far into the document `<meta charset>` is looked for.
const META_SNIFF_LIMIT: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPage {
    pub html: String,
    pub encoding_label: String,
    /// Malformed byte sequences were replaced with U+FFFD.
    pub had_errors: bool,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("page body is empty")]
    Empty,
}

/// Decode a page body to UTF-8.
///
/// Order of precedence: byte order mark, Content-Type charset, `<meta charset>`
/// near the top of the document, then a `chardetng` guess (Persian pages
/// without declarations are usually windows-1256 or UTF-8). Malformed
/// sequences do not fail the page; they become replacement characters.
pub fn decode_page(bytes: &[u8], content_type: Option<&str>) -> Result<DecodedPage, DecodeError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(DecodeError::Empty);
    }

    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    let declared = content_type
        .and_then(charset_from_content_type)
        .or_else(|| charset_from_meta(bytes))
        .and_then(|label| Encoding::for_label(label.as_bytes()));
    if let Some(encoding) = declared {
        return decode_with(bytes, encoding);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    decode_with(bytes, detector.guess(None, true))
}

fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(&['"', '\''][..]).to_string())
    })
}

/// Finds `charset=` inside the first `<meta ...>` tags, covering both
/// `<meta charset="x">` and the http-equiv form.
fn charset_from_meta(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(META_SNIFF_LIMIT)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();
    let mut rest = head.as_str();
    while let Some(start) = rest.find("<meta") {
        let tag = &rest[start..];
        let end = tag.find('>').unwrap_or(tag.len());
        let tag_body = &tag[..end];
        if let Some(pos) = tag_body.find("charset=") {
            let value = tag_body[pos + "charset=".len()..]
                .trim_start_matches(&['"', '\''][..])
                .split(|c: char| c == '"' || c == '\'' || c == ';' || c == '/' || c.is_whitespace())
                .next()
                .unwrap_or("");
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
        rest = &tag[end..];
    }
    None
}

fn decode_with(bytes: &[u8], encoding: &'static Encoding) -> Result<DecodedPage, DecodeError> {
    let (text, _, had_errors) = encoding.decode(bytes);
    Ok(DecodedPage {
        html: text.into_owned(),
        encoding_label: encoding.name().to_string(),
        had_errors,
    })
}

#[cfg(test)]
mod tests {
    use super::{charset_from_content_type, charset_from_meta, decode_page, DecodeError};

    #[test]
    fn stray_bytes_are_replaced_not_fatal() {
        let mut bytes = b"<p>hello</p>".to_vec();
        bytes.push(0xFF);
        let decoded = decode_page(&bytes, Some("text/html; charset=utf-8")).unwrap();
        assert!(decoded.had_errors);
        assert_eq!(decoded.html, "<p>hello</p>\u{FFFD}");
        assert_eq!(decoded.encoding_label, "UTF-8");
    }

    #[test]
    fn blank_body_is_empty() {
        assert_eq!(decode_page(b" \n\t", None), Err(DecodeError::Empty));
    }

    #[test]
    fn content_type_charset_is_case_insensitive_and_unquoted() {
        assert_eq!(
            charset_from_content_type("text/html; Charset=\"UTF-8\""),
            Some("UTF-8".to_string())
        );
        assert_eq!(charset_from_content_type("text/html"), None);
    }

    #[test]
    fn meta_charset_forms_are_found() {
        assert_eq!(
            charset_from_meta(b"<html><head><meta charset=\"windows-1256\"></head>"),
            Some("windows-1256".to_string())
        );
        assert_eq!(
            charset_from_meta(
                b"<meta http-equiv=\"Content-Type\" content=\"text/html; charset=utf-8\">"
            ),
            Some("utf-8".to_string())
        );
        assert_eq!(charset_from_meta(b"<meta name=\"x\" content=\"y\">"), None);
    }
}
