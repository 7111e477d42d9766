//! Character encoding of the HTML pages.

use std::sync::LazyLock;

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use regex::bytes::Regex;

use crate::prelude::*;

/// Leading bytes searched for a `<meta>` declaration.
const PRESCAN_LENGTH: usize = 1024;

/// Top-level domain hint for the content-based guess.
const GUESS_TLD: &[u8] = b"jp";

static META_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i-u)<meta[^>]*?charset\s*=\s*["']?\s*([a-z0-9_.:\-]+)"#)
        .expect("valid meta charset regex")
});

/// Decode the page.
///
/// The encoding comes from the byte order mark, then the declared charset
/// (`Content-Type` header), then the `<meta>` declaration, and is guessed from the content otherwise.
pub fn decode_html(bytes: &[u8], declared: Option<&str>) -> String {
    let (text, encoding, had_errors) = sniff_encoding(bytes, declared).decode(bytes);
    if had_errors {
        warn!(encoding = encoding.name(), "the page contains malformed sequences");
    } else {
        debug!(encoding = encoding.name(), "decoded the page");
    }
    text.into_owned()
}

pub fn sniff_encoding(bytes: &[u8], declared: Option<&str>) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding;
    }
    declared
        .and_then(|label| Encoding::for_label(label.trim().as_bytes()))
        .or_else(|| meta_charset(bytes))
        .unwrap_or_else(|| guess(bytes))
}

fn meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(PRESCAN_LENGTH)];
    let label = META_CHARSET_RE.captures(head)?.get(1)?;
    Encoding::for_label(label.as_bytes()).map(Encoding::output_encoding)
}

fn guess(bytes: &[u8]) -> &'static Encoding {
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(Some(GUESS_TLD), true)
}
