//! Blob decoding: turn an archive entry's bytes into structured JSON.
//!
//! DBC archives wrap notebook records in a handful of nested encodings:
//! plain JSON, base64-wrapped JSON, gzip- or zlib-compressed JSON, and the
//! base64-of-compressed compositions. The decoder tries each known encoding
//! in a fixed order and returns the first JSON value that emerges. Nothing
//! here fails: exhausting every attempt yields [`DecodedPayload::RawText`]
//! with a lossy UTF-8 rendering of the original bytes, and the builder
//! degrades that to a single-cell notebook.
//!
//! Each decode step is a side-effect-free helper so the chain can be tested
//! one link at a time.

use base64::prelude::*;
use flate2::read::{GzDecoder, ZlibDecoder};
use serde_json::Value;
use std::io::Read;

/// Result of decoding one archive entry.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedPayload {
    /// The entry decoded to structured JSON through one of the known encodings.
    Json(Value),
    /// No structured decoding succeeded; carries the lossy UTF-8 text of the
    /// raw bytes (invalid sequences replaced, never fails).
    RawText(String),
}

/// Decode an archive entry's bytes.
///
/// Falls back to [`DecodedPayload::RawText`] when no structured decoding
/// succeeds; this function never fails.
#[must_use = "this function returns the decoded payload that should be built into notebooks"]
pub fn decode_entry(bytes: &[u8]) -> DecodedPayload {
    match try_decode_json(bytes) {
        Some(value) => DecodedPayload::Json(value),
        None => DecodedPayload::RawText(String::from_utf8_lossy(bytes).into_owned()),
    }
}

/// Ordered decode attempts; the first that yields JSON wins.
///
/// Attempt order: UTF-8 JSON, base64 → JSON, base64 → gzip → JSON,
/// base64 → zlib → JSON, gzip → JSON, zlib → JSON. Returns None when every
/// attempt fails.
#[must_use = "returns the decoded JSON value, if any attempt succeeded"]
pub fn try_decode_json(bytes: &[u8]) -> Option<Value> {
    if let Some(value) = try_parse_json(bytes) {
        return Some(value);
    }

    if let Some(decoded) = try_base64(bytes) {
        if let Some(value) = try_parse_json(&decoded) {
            return Some(value);
        }
        if let Some(value) = try_gunzip(&decoded).as_deref().and_then(try_parse_json) {
            return Some(value);
        }
        if let Some(value) = try_inflate(&decoded).as_deref().and_then(try_parse_json) {
            return Some(value);
        }
    }

    if let Some(value) = try_gunzip(bytes).as_deref().and_then(try_parse_json) {
        return Some(value);
    }

    try_inflate(bytes).as_deref().and_then(try_parse_json)
}

/// Interpret bytes as UTF-8 JSON.
fn try_parse_json(bytes: &[u8]) -> Option<Value> {
    let text = std::str::from_utf8(bytes).ok()?;
    serde_json::from_str(text).ok()
}

/// Base64-decode bytes, tolerating embedded ASCII whitespace (exports often
/// hard-wrap long base64 blobs).
fn try_base64(bytes: &[u8]) -> Option<Vec<u8>> {
    let text = std::str::from_utf8(bytes).ok()?;
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }
    BASE64_STANDARD.decode(compact.as_bytes()).ok()
}

/// Decompress a gzip stream.
fn try_gunzip(bytes: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(bytes).read_to_end(&mut out).ok()?;
    Some(out)
}

/// Decompress a raw zlib stream.
fn try_inflate(bytes: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(bytes).read_to_end(&mut out).ok()?;
    Some(out)
}
