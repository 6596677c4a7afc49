use axum::http::HeaderMap;
use hmac::{Hmac, Mac, digest::KeyInit};
use sha1::Sha1;
use sha2::Sha256;

use crate::error::Error;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-hub-signature";
pub const SIGNATURE_256_HEADER: &str = "x-hub-signature-256";

/// Picks the signature header GitHub sent, preferring the SHA-256 one.
pub fn signature_header(headers: &HeaderMap) -> Result<&str, Error> {
    let value = headers
        .get(SIGNATURE_256_HEADER)
        .or_else(|| headers.get(SIGNATURE_HEADER))
        .ok_or_else(|| Error::AuthenticationFailure("missing signature header".into()))?;

    value
        .to_str()
        .map_err(|_| Error::AuthenticationFailure("signature header is not ASCII".into()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Sha1,
    Sha256,
}

/// A parsed `<algorithm>=<hex digest>` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub algorithm: Algorithm,
    digest: Vec<u8>,
}

impl Signature {
    /// Validates the header shape without looking at the body.
    pub fn parse(header: &str) -> Result<Self, Error> {
        let (algorithm, digest) = header
            .split_once('=')
            .ok_or_else(|| Error::AuthenticationFailure("signature has no `=` separator".into()))?;

        let algorithm = match algorithm {
            "sha1" => Algorithm::Sha1,
            "sha256" => Algorithm::Sha256,
            other => {
                return Err(Error::AuthenticationFailure(format!(
                    "unsupported signature algorithm `{other}`"
                )));
            }
        };

        if digest.is_empty() {
            return Err(Error::AuthenticationFailure("signature digest is empty".into()));
        }

        let digest = hex::decode(digest)
            .map_err(|_| Error::AuthenticationFailure("signature digest is not hex".into()))?;

        Ok(Self { algorithm, digest })
    }

    /// Checks the digest against an HMAC of `payload` keyed with `secret`.
    pub fn verify(&self, secret: &str, payload: &[u8]) -> Result<(), Error> {
        let verified = match self.algorithm {
            Algorithm::Sha1 => verify_with::<HmacSha1>(secret, payload, &self.digest),
            Algorithm::Sha256 => verify_with::<HmacSha256>(secret, payload, &self.digest),
        };

        if verified {
            Ok(())
        } else {
            Err(Error::AuthenticationFailure("digest mismatch".into()))
        }
    }
}

/// Checks `signature` (`<algorithm>=<hex digest>`) against an HMAC of `payload`
/// keyed with `secret`. The algorithm comes from the header itself.
pub fn verify_signature(secret: &str, payload: &[u8], signature: &str) -> Result<(), Error> {
    Signature::parse(signature)?.verify(secret, payload)
}

fn verify_with<M: Mac + KeyInit>(secret: &str, payload: &[u8], expected: &[u8]) -> bool {
    let mut mac = match <M as Mac>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload);
    mac.verify_slice(expected).is_ok()
}

#[cfg(test)]
pub(crate) fn sign_sha1(secret: &str, payload: &[u8]) -> String {
    let mut mac = <HmacSha1 as Mac>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(payload);
    format!("sha1={}", hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use proptest::prelude::*;

    const SECRET: &str = "It's a Secret to Everybody";
    const BODY: &[u8] = b"Hello, World!";

    fn sign_sha256(secret: &str, payload: &[u8]) -> String {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(payload);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn accepts_github_documented_sha256_example() {
        let signature =
            "sha256=757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17";
        assert!(verify_signature(SECRET, BODY, signature).is_ok());
    }

    #[test]
    fn accepts_matching_sha1() {
        let signature = sign_sha1(SECRET, BODY);
        assert!(verify_signature(SECRET, BODY, &signature).is_ok());
    }

    #[test]
    fn accepts_matching_sha256() {
        let signature = sign_sha256(SECRET, BODY);
        assert!(verify_signature(SECRET, BODY, &signature).is_ok());
    }

    #[test]
    fn rejects_other_secret() {
        let signature = sign_sha1("another secret", BODY);
        assert!(matches!(
            verify_signature(SECRET, BODY, &signature),
            Err(Error::AuthenticationFailure(_))
        ));
    }

    proptest! {
        #[test]
        fn verifies_any_body_under_its_own_secret(
            secret in "[ -~]{1,64}",
            other_secret in "[ -~]{1,64}",
            body in proptest::collection::vec(any::<u8>(), 0..512),
            flip in any::<prop::sample::Index>(),
        ) {
            let signature = sign_sha1(&secret, &body);
            prop_assert!(verify_signature(&secret, &body, &signature).is_ok());

            let sha256 = sign_sha256(&secret, &body);
            prop_assert!(verify_signature(&secret, &body, &sha256).is_ok());

            if other_secret != secret {
                prop_assert!(verify_signature(&other_secret, &body, &signature).is_err());
            }

            if !body.is_empty() {
                let mut mutated = body.clone();
                mutated[flip.index(body.len())] ^= 0x01;
                prop_assert!(verify_signature(&secret, &mutated, &signature).is_err());
            }
        }
    }

    #[test]
    fn rejects_any_mutated_byte() {
        let signature = sign_sha1(SECRET, BODY);
        for i in 0..BODY.len() {
            let mut mutated = BODY.to_vec();
            mutated[i] ^= 0x01;
            assert!(
                verify_signature(SECRET, &mutated, &signature).is_err(),
                "byte {i} flipped but signature still verified"
            );
        }
    }

    #[test]
    fn rejects_malformed_headers() {
        for signature in ["", "sha1", "deadbeef", "sha1=", "sha1=not-hex", "md5=abcd"] {
            assert!(
                matches!(
                    verify_signature(SECRET, BODY, signature),
                    Err(Error::AuthenticationFailure(_))
                ),
                "{signature:?} should be rejected"
            );
        }
    }

    #[test]
    fn header_is_validated_without_a_body() {
        let parsed = Signature::parse("sha256=00ff").unwrap();
        assert_eq!(parsed.algorithm, Algorithm::Sha256);

        for header in ["sha1", "", "md5=abcd", "sha1=", "sha1=zz"] {
            assert!(Signature::parse(header).is_err(), "{header:?}");
        }
    }

    #[test]
    fn algorithm_must_match_digest() {
        let sha1_digest = sign_sha1(SECRET, BODY);
        let relabelled = sha1_digest.replacen("sha1=", "sha256=", 1);
        assert!(verify_signature(SECRET, BODY, &relabelled).is_err());
    }

    #[test]
    fn prefers_sha256_header() {
        let mut headers = HeaderMap::new();
        headers.insert(SIGNATURE_HEADER, HeaderValue::from_static("sha1=aa"));
        headers.insert(SIGNATURE_256_HEADER, HeaderValue::from_static("sha256=bb"));
        assert_eq!(signature_header(&headers).unwrap(), "sha256=bb");
    }

    #[test]
    fn missing_header_is_authentication_failure() {
        assert!(matches!(
            signature_header(&HeaderMap::new()),
            Err(Error::AuthenticationFailure(_))
        ));
    }
}
