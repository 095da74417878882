use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use url::Url;

use crate::clock::Clock;
use crate::keys::AppKey;
use crate::request::ShieldRequest;
use crate::signed_link::errors::SignedLinkError;
use crate::signed_link::invalidation::InvalidationSet;
use crate::utils::{base64url_decode, base64url_encode, sha256_hex};

type HmacSha256 = Hmac<Sha256>;

pub const EXPIRES_PARAM: &str = "expires";
pub const SIGNATURE_PARAM: &str = "signature";

/// Base used to resolve relative targets such as `/auth/confirm`.
const RELATIVE_BASE: &str = "http://localhost";

/// Issues and verifies HMAC-signed, expiring, optionally single-use URLs.
///
/// The signature covers the path and every query parameter except `signature`
/// itself, sorted, so parameter order in the delivered URL does not matter.
/// Host and scheme are not covered.
#[derive(Clone)]
pub struct SignedLink {
    key: Vec<u8>,
    clock: Arc<dyn Clock>,
    invalidation: Arc<dyn InvalidationSet>,
    max_ttl: Duration,
}

/// Parameters of a link that passed verification.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedLink {
    params: BTreeMap<String, String>,
    expires_at: DateTime<Utc>,
}

impl VerifiedLink {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

impl SignedLink {
    /// `max_ttl` bounds every issued link. It must not exceed the period for which
    /// the invalidation set keeps its records.
    pub fn new(
        app_key: &AppKey,
        clock: Arc<dyn Clock>,
        invalidation: Arc<dyn InvalidationSet>,
        max_ttl: Duration,
    ) -> Self {
        Self {
            key: app_key.signed_link_key(),
            clock,
            invalidation,
            max_ttl,
        }
    }

    /// Sign `target` with `payload` added as query parameters, valid for `ttl`.
    ///
    /// Relative targets produce relative links.
    pub fn sign(
        &self,
        target: &str,
        payload: &[(&str, &str)],
        ttl: Duration,
    ) -> Result<String, SignedLinkError> {
        let (mut url, relative) = parse_target(target)?;

        let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        pairs.extend(payload.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        if let Some((reserved, _)) = pairs
            .iter()
            .find(|(k, _)| k == EXPIRES_PARAM || k == SIGNATURE_PARAM)
        {
            return Err(SignedLinkError::ReservedParameter(reserved.clone()));
        }

        let ttl = if ttl > self.max_ttl {
            tracing::warn!(
                "Signed link ttl {}s exceeds the maximum, capping to {}s",
                ttl.num_seconds(),
                self.max_ttl.num_seconds()
            );
            self.max_ttl
        } else {
            ttl
        };
        let expires = self
            .clock
            .now()
            .checked_add_signed(ttl)
            .ok_or_else(|| SignedLinkError::Malformed("Link ttl out of range".to_string()))?
            .timestamp();
        pairs.push((EXPIRES_PARAM.to_string(), expires.to_string()));
        pairs.sort();

        let mac = self.mac(&canonicalize(url.path(), &pairs));
        url.query_pairs_mut()
            .clear()
            .extend_pairs(&pairs)
            .append_pair(SIGNATURE_PARAM, &base64url_encode(&mac));

        Ok(render(&url, relative))
    }

    /// Check signature and expiry without touching the invalidation set.
    pub fn check(&self, link: &str) -> Result<VerifiedLink, SignedLinkError> {
        self.inspect(link).map(|(verified, _)| verified)
    }

    /// Full verification. With `consume`, the link is recorded as used and any
    /// later verification of it fails.
    #[tracing::instrument(skip(self, link))]
    pub async fn verify(&self, link: &str, consume: bool) -> Result<VerifiedLink, SignedLinkError> {
        let (verified, mac) = self.inspect(link).inspect_err(|e| {
            tracing::debug!("Signed link rejected: {}", e);
        })?;

        if consume {
            let id = sha256_hex(&base64url_encode(&mac));
            // Keep the record at least until the link itself expires.
            let ttl = (verified.expires_at - self.clock.now() + Duration::seconds(1))
                .max(Duration::seconds(1));
            if !self.invalidation.consume(&id, ttl).await? {
                tracing::debug!("Signed link rejected: {}", SignedLinkError::Consumed);
                return Err(SignedLinkError::Consumed);
            }
        }

        Ok(verified)
    }

    pub async fn verify_request(
        &self,
        request: &ShieldRequest,
        consume: bool,
    ) -> Result<VerifiedLink, SignedLinkError> {
        self.verify(request.path_and_query(), consume).await
    }

    fn inspect(&self, link: &str) -> Result<(VerifiedLink, Vec<u8>), SignedLinkError> {
        let (url, _) = parse_target(link)?;

        let mut signature = None;
        let mut expires = None;
        let mut pairs = Vec::new();
        for (key, value) in url.query_pairs().into_owned() {
            match key.as_str() {
                SIGNATURE_PARAM => {
                    if signature.replace(value).is_some() {
                        return Err(SignedLinkError::Malformed("duplicate signature".to_string()));
                    }
                }
                EXPIRES_PARAM => {
                    if expires.replace(value.clone()).is_some() {
                        return Err(SignedLinkError::Malformed("duplicate expires".to_string()));
                    }
                    pairs.push((key, value));
                }
                _ => pairs.push((key, value)),
            }
        }

        let signature =
            signature.ok_or_else(|| SignedLinkError::Malformed("missing signature".to_string()))?;
        let expires: i64 = expires
            .ok_or_else(|| SignedLinkError::Malformed("missing expires".to_string()))?
            .parse()
            .map_err(|_| SignedLinkError::Malformed("expires is not a timestamp".to_string()))?;
        let expires_at = DateTime::from_timestamp(expires, 0)
            .ok_or_else(|| SignedLinkError::Malformed("expires out of range".to_string()))?;
        let provided = base64url_decode(&signature)
            .map_err(|_| SignedLinkError::Malformed("signature is not base64url".to_string()))?;

        pairs.sort();
        let expected = self.mac(&canonicalize(url.path(), &pairs));
        if !bool::from(expected.as_slice().ct_eq(provided.as_slice())) {
            return Err(SignedLinkError::BadSignature);
        }

        if self.clock.now().timestamp() > expires {
            return Err(SignedLinkError::Expired);
        }

        let params = pairs
            .into_iter()
            .filter(|(k, _)| k != EXPIRES_PARAM)
            .collect();
        Ok((VerifiedLink { params, expires_at }, expected))
    }

    fn mac(&self, canonical: &str) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC can take key of any size");
        mac.update(canonical.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

fn parse_target(target: &str) -> Result<(Url, bool), SignedLinkError> {
    match Url::parse(target) {
        Ok(url) => Ok((url, false)),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Ok((Url::parse(RELATIVE_BASE)?.join(target)?, true))
        }
        Err(e) => Err(e.into()),
    }
}

fn canonicalize(path: &str, sorted_pairs: &[(String, String)]) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(sorted_pairs)
        .finish();
    format!("{path}?{query}")
}

fn render(url: &Url, relative: bool) -> String {
    if relative {
        url[url::Position::BeforePath..].to_string()
    } else {
        url.to_string()
    }
}
