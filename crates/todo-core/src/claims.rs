use std::collections::BTreeMap;
use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub const NAME_ID_KEY: &str = "nameid";
pub const UNIQUE_NAME_KEY: &str = "unique_name";
pub const ROLE_KEY: &str = "role";
pub const EXPIRY_KEY: &str = "exp";

/// Claim names. Payload keys are kept verbatim as `Raw`; the recognized ones
/// also yield a normalized claim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClaimType {
    Subject,
    Name,
    Role,
    Raw(String),
}

impl ClaimType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Subject => "identity:subject",
            Self::Name => "identity:name",
            Self::Role => "identity:role",
            Self::Raw(key) => key.as_str(),
        }
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub kind: ClaimType,
    pub value: String,
}

impl Claim {
    pub fn new(kind: ClaimType, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Claims derived from a credential. The default value is the anonymous
/// identity (no claims).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    claims: Vec<Claim>,
}

impl Identity {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_claims(claims: Vec<Claim>) -> Self {
        Self { claims }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.claims.is_empty()
    }

    #[must_use]
    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    pub fn find_first(&self, kind: &ClaimType) -> Option<&str> {
        self.claims
            .iter()
            .find(|claim| &claim.kind == kind)
            .map(|claim| claim.value.as_str())
    }

    pub fn values<'a>(&'a self, kind: &'a ClaimType) -> impl Iterator<Item = &'a str> + 'a {
        self.claims
            .iter()
            .filter(move |claim| &claim.kind == kind)
            .map(|claim| claim.value.as_str())
    }

    #[must_use]
    pub fn subject_id(&self) -> Option<&str> {
        self.find_first(&ClaimType::Subject)
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.find_first(&ClaimType::Name)
    }

    #[must_use]
    pub fn roles(&self) -> Vec<&str> {
        self.values(&ClaimType::Role).collect()
    }

    #[must_use]
    pub fn is_in_role(&self, role: &str) -> bool {
        self.values(&ClaimType::Role).any(|value| value == role)
    }

    /// Expiry from the raw `exp` claim, numeric seconds since the epoch.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.find_first(&ClaimType::Raw(EXPIRY_KEY.to_string()))?;
        let seconds = raw
            .trim()
            .parse::<i64>()
            .ok()
            .or_else(|| raw.trim().parse::<f64>().ok().map(|value| value as i64))?;
        DateTime::from_timestamp(seconds, 0)
    }

    /// A credential without a readable expiry never counts as expired. A skew
    /// that runs past the end of the calendar counts as expired.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>, skew: ChronoDuration) -> bool {
        self.expires_at()
            .map(|expires_at| {
                now.checked_add_signed(skew)
                    .map_or(true, |deadline| deadline >= expires_at)
            })
            .unwrap_or(false)
    }

    #[must_use]
    pub fn claim_map(&self) -> ClaimMap {
        let mut map = BTreeMap::new();
        for claim in &self.claims {
            map.entry(claim.kind.to_string())
                .or_insert_with(Vec::new)
                .push(claim.value.clone());
        }
        ClaimMap(map)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ClaimMap(pub BTreeMap<String, Vec<String>>);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("token must have three dot-separated segments, found {0}")]
    MissingSegment(usize),
    #[error("payload is not valid base64: {0}")]
    Base64(String),
    #[error("payload is not valid json: {0}")]
    Json(String),
    #[error("payload is not a json object")]
    NotAnObject,
}

/// Decodes the payload claims of a compact token. Any malformed input yields
/// the anonymous identity.
#[must_use]
pub fn decode(token: &str) -> Identity {
    try_decode(token).unwrap_or_default()
}

pub fn try_decode(token: &str) -> Result<Identity, DecodeError> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::MissingSegment(segments.len()));
    }
    let bytes = decode_segment(segments[1])?;
    let payload: Value =
        serde_json::from_slice(&bytes).map_err(|err| DecodeError::Json(err.to_string()))?;
    let Value::Object(entries) = payload else {
        return Err(DecodeError::NotAnObject);
    };

    let mut claims = Vec::with_capacity(entries.len());
    for (key, value) in &entries {
        claims.push(Claim::new(ClaimType::Raw(key.clone()), value_text(value)));
        match key.as_str() {
            NAME_ID_KEY => claims.push(Claim::new(ClaimType::Subject, value_text(value))),
            UNIQUE_NAME_KEY => claims.push(Claim::new(ClaimType::Name, value_text(value))),
            ROLE_KEY => match value {
                Value::Array(roles) => claims.extend(
                    roles
                        .iter()
                        .map(|role| Claim::new(ClaimType::Role, value_text(role))),
                ),
                other => claims.push(Claim::new(ClaimType::Role, value_text(other))),
            },
            _ => {}
        }
    }
    Ok(Identity::from_claims(claims))
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, DecodeError> {
    let mut normalized: String = segment
        .chars()
        .map(|ch| match ch {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    let remainder = normalized.len() % 4;
    if remainder != 0 {
        normalized.push_str(&"=".repeat(4 - remainder));
    }
    STANDARD
        .decode(normalized.as_bytes())
        .map_err(|err| DecodeError::Base64(err.to_string()))
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
