//! Constant-time comparisons and handshake string extraction.
//!
//! The extraction helpers mirror the buffer-scanning the original C client
//! does by hand (`cometa.c`'s subscribe routine): pull the last non-empty
//! line out of a response, or the text between the last pair of double
//! quotes. Implemented here instead of re-parsing, since the relay's and
//! app server's handshake bodies are not well-formed JSON framed by
//! `Content-Length` alone — they're free-form text with the payload at a
//! fixed relative position.

use subtle::ConstantTimeEq;

/// Constant-time comparison of two byte slices. Used when comparing
/// relay/app-server responses against known sentinel strings, to avoid
/// leaning on a data-dependent `==` for handshake-adjacent comparisons.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Extracts the last non-empty line from `body`, trimming trailing and
/// leading CR/LF. This is the relay's subscribe-challenge line, returned
/// from handshake step 1.
#[must_use]
pub fn last_non_empty_line(body: &str) -> Option<&str> {
    body.lines().rev().find(|line| !line.trim().is_empty())
}

/// Extracts the text between the last pair of double quotes in `body`.
/// This is the app server's signature field, read out of a handshake
/// step 2 response that may not be valid JSON on its own.
#[must_use]
pub fn last_quoted(body: &str) -> Option<&str> {
    let last_quote = body.rfind('"')?;
    let before = &body[..last_quote];
    let second_last_quote = before.rfind('"')?;
    Some(&body[second_last_quote + 1..last_quote])
}
