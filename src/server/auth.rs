use hmac::{ Hmac, Mac };
use sha2::Sha256;
use std::collections::HashMap;
use thiserror::Error;
use url::form_urlencoded;

type HmacSha256 = Hmac<Sha256>;

pub const MAX_CLOCK_SKEW_SECS: i64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing ts/sig")]
    MissingParams,
    #[error("timestamp out of range")]
    StaleTimestamp,
    #[error("bad signature")]
    BadSignature,
}

/// Hex HMAC-SHA256 of the timestamp string, keyed with the shared secret.
pub fn sign(secret: &str, ts: &str) -> String {
    match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mut mac) => {
            mac.update(ts.as_bytes());
            hex::encode(mac.finalize().into_bytes())
        }
        Err(_) => String::new(),
    }
}

/// Checks `ts` and `sig` query parameters of a handshake request against
/// `secret` at unix time `now`.
pub fn verify_query(secret: &str, query: &str, now: i64) -> Result<(), AuthError> {
    let params: HashMap<String, String> = form_urlencoded
        ::parse(query.as_bytes())
        .into_owned()
        .collect();

    let ts = params.get("ts").or_else(|| params.get("X-Api-Ts"));
    let sig = params.get("sig").or_else(|| params.get("X-Api-Sign"));
    let (ts, sig) = match (ts, sig) {
        (Some(ts), Some(sig)) => (ts, sig),
        _ => {
            return Err(AuthError::MissingParams);
        }
    };

    let ts_i: i64 = ts.parse().map_err(|_| AuthError::StaleTimestamp)?;
    if (now - ts_i).abs() > MAX_CLOCK_SKEW_SECS {
        return Err(AuthError::StaleTimestamp);
    }

    let provided = hex::decode(sig).map_err(|_| AuthError::BadSignature)?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(
        |_| AuthError::BadSignature
    )?;
    mac.update(ts.as_bytes());
    mac.verify_slice(&provided).map_err(|_| AuthError::BadSignature)
}
