//! Request signing and response validation.
//!
//! Every request carries a canonical-string signature: HMAC-SHA1 over the
//! resource path, the method, the (empty) query and the sorted `x-ots-*`
//! headers, keyed with the access-key secret and base64-encoded into
//! `x-ots-signature`. Responses are validated against their body digest
//! and their clock.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::error::{Error, Result};
use crate::protocol::action::Action;

type HmacSha1 = Hmac<Sha1>;

pub const API_VERSION: &str = "2015-12-31";

pub const HEADER_API_VERSION: &str = "x-ots-apiversion";
pub const HEADER_ACCESS_KEY_ID: &str = "x-ots-accesskeyid";
pub const HEADER_CONTENT_MD5: &str = "x-ots-contentmd5";
pub const HEADER_DATE: &str = "x-ots-date";
pub const HEADER_INSTANCE_NAME: &str = "x-ots-instancename";
pub const HEADER_SIGNATURE: &str = "x-ots-signature";
pub const HEADER_STS_TOKEN: &str = "x-ots-stoken";
pub const HEADER_REQUEST_ID: &str = "x-ots-requestid";
pub const HEADER_AUTH_FAILED: &str = "x-ots-authfailed";

/// Tolerated skew between the response clock and ours.
const MAX_CLOCK_SKEW: i64 = 15 * 60;

/// Access credentials, optionally with an STS security token.
#[derive(Clone)]
pub struct Credential {
    pub access_key_id: String,
    pub access_key_secret: String,
    pub security_token: Option<String>,
}

impl Credential {
    pub fn new(access_key_id: impl Into<String>, access_key_secret: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
            security_token: None,
        }
    }

    pub fn with_security_token(mut self, token: impl Into<String>) -> Self {
        self.security_token = Some(token.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.access_key_id.is_empty() {
            return Err(Error::validation("access-key id must be non-empty"));
        }
        if self.access_key_secret.is_empty() {
            return Err(Error::validation("access-key secret must be non-empty"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // never leak the secret through logs
        f.debug_struct("Credential")
            .field("access_key_id", &self.access_key_id)
            .field("security_token", &self.security_token.is_some())
            .finish_non_exhaustive()
    }
}

pub fn hmac_sha1(key: &[u8], data: &[u8]) -> [u8; 20] {
    let mut mac = HmacSha1::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

/// Base64 of the MD5 digest of `body`, as `x-ots-contentmd5` carries it.
pub fn content_md5(body: &[u8]) -> String {
    BASE64.encode(md5::compute(body).0)
}

/// The current instant formatted for `x-ots-date`.
pub fn format_date(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Computes the `x-ots-signature` value over the headers assembled so far.
///
/// Canonical headers are the `x-ots-*` ones (the signature itself
/// excluded), lowercased, formatted `name:value` and sorted ascending.
pub fn signature(
    action: Action,
    headers: &[(String, String)],
    access_key_secret: &str,
) -> String {
    let mut canonical: Vec<String> = headers
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value))
        .filter(|(name, _)| name.starts_with("x-ots-") && name != HEADER_SIGNATURE)
        .map(|(name, value)| format!("{name}:{value}"))
        .collect();
    canonical.sort();

    let string_to_sign = format!("/{}\nPOST\n\n{}\n", action.name(), canonical.join("\n"));
    BASE64.encode(hmac_sha1(access_key_secret.as_bytes(), string_to_sign.as_bytes()))
}

/// Validates a response against the signing protocol.
///
/// Checks the body digest (when `check_digest` is set) and bounds the skew
/// between `x-ots-date` and the local clock; a violation of either means
/// the response cannot be trusted.
pub(crate) fn validate_response(
    headers: &HashMap<String, String>,
    body: &[u8],
    check_digest: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    if check_digest {
        let want = headers.get(HEADER_CONTENT_MD5).ok_or_else(|| {
            Error::corrupted_response("response lacks x-ots-contentmd5", file!(), line!())
        })?;
        let got = content_md5(body);
        if *want != got {
            return Err(Error::corrupted_response(
                format!("response digest mismatch: header says {want}, body is {got}"),
                file!(),
                line!(),
            ));
        }
    }

    let date = headers.get(HEADER_DATE).ok_or_else(|| {
        Error::corrupted_response("response lacks x-ots-date", file!(), line!())
    })?;
    let date = DateTime::parse_from_rfc3339(date).map_err(|e| {
        Error::corrupted_response(format!("unparsable x-ots-date {date:?}: {e}"), file!(), line!())
    })?;
    let skew = now.signed_duration_since(date.with_timezone(&Utc));
    if skew.abs() > Duration::seconds(MAX_CLOCK_SKEW) {
        return Err(Error::corrupted_response(
            format!(
                "response clock is {} seconds away from ours",
                skew.num_seconds()
            ),
            file!(),
            line!(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_sha1_known_answer() {
        let got = hmac_sha1(b"key", b"The quick brown fox jumps over the lazy dog");
        let want: [u8; 20] = [
            0xde, 0x7c, 0x9b, 0x85, 0xb8, 0xb7, 0x8a, 0xa6, 0xbc, 0x8a, 0x7a, 0x36, 0xf7, 0x0a,
            0x90, 0x70, 0x1c, 0x9d, 0xb4, 0xd9,
        ];
        assert_eq!(got, want);
    }

    #[test]
    fn content_md5_known_answer() {
        let body = b"abcdefghijklmnopqrstuvwxyz0123456789";
        let digest = md5::compute(body).0;
        assert_eq!(
            digest,
            [
                0x6d, 0x22, 0x86, 0x30, 0x12, 0x65, 0x51, 0x2f, 0x01, 0x97, 0x81, 0xcc, 0x0c,
                0xe7, 0xa3, 0x9f,
            ]
        );
        // and the same 36-byte string base64-encodes as expected
        assert_eq!(
            BASE64.encode(body),
            "YWJjZGVmZ2hpamtsbW5vcHFyc3R1dnd4eXowMTIzNDU2Nzg5"
        );
    }

    #[test]
    fn canonical_headers_are_sorted_and_filtered() {
        let headers = vec![
            ("x-ots-date".to_string(), "D".to_string()),
            ("User-Agent".to_string(), "ua".to_string()),
            ("x-ots-apiversion".to_string(), "V".to_string()),
            ("x-ots-signature".to_string(), "bogus".to_string()),
            ("X-OTS-AccessKeyId".to_string(), "AK".to_string()),
        ];
        let got = signature(Action::GetRow, &headers, "secret");

        let string_to_sign =
            "/GetRow\nPOST\n\nx-ots-accesskeyid:AK\nx-ots-apiversion:V\nx-ots-date:D\n";
        let want = BASE64.encode(hmac_sha1(b"secret", string_to_sign.as_bytes()));
        assert_eq!(got, want);
    }

    #[test]
    fn digest_mismatch_is_corrupted_response() {
        let mut headers = HashMap::new();
        headers.insert(HEADER_CONTENT_MD5.to_string(), content_md5(b"other"));
        headers.insert(HEADER_DATE.to_string(), format_date(Utc::now()));
        let err = validate_response(&headers, b"body", true, Utc::now()).unwrap_err();
        assert_eq!(err.http_status, crate::error::HTTP_CORRUPTED_RESPONSE);
    }

    #[test]
    fn skewed_clock_is_corrupted_response() {
        let now = Utc::now();
        let mut headers = HashMap::new();
        headers.insert(HEADER_CONTENT_MD5.to_string(), content_md5(b""));
        headers.insert(
            HEADER_DATE.to_string(),
            format_date(now - Duration::seconds(MAX_CLOCK_SKEW + 1)),
        );
        let err = validate_response(&headers, b"", true, now).unwrap_err();
        assert!(err.message.contains("clock"), "{}", err.message);

        // just inside the window passes
        headers.insert(
            HEADER_DATE.to_string(),
            format_date(now - Duration::seconds(MAX_CLOCK_SKEW - 1)),
        );
        validate_response(&headers, b"", true, now).unwrap();
    }

    #[test]
    fn digest_check_can_be_disabled() {
        let mut headers = HashMap::new();
        headers.insert(HEADER_DATE.to_string(), format_date(Utc::now()));
        validate_response(&headers, b"whatever", false, Utc::now()).unwrap();
    }
}
