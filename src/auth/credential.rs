//! Stored-credential hashing and verification.
//!
//! The stored format is `$pbkdf2-sha256$<iterations>$<salt>$<digest>`: four
//! `$`-delimited fields after a leading empty field. The salt is an opaque
//! ASCII string fed to the KDF as raw bytes, and the digest is the derived
//! key in URL-safe base64 with trailing `=` padding stripped. This matches
//! the hashes already present in the legacy user table, so existing accounts
//! keep working.
//!
//! `verify` never surfaces parse failures: a malformed stored string, an
//! unknown algorithm or a bad iteration count all just verify as `false`.

use anyhow::{Context, Result};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use pbkdf2::pbkdf2_hmac;
use rand::{RngCore, rngs::OsRng};
use sha2::Sha256;
use subtle::ConstantTimeEq;

const ALGORITHM_PBKDF2_SHA256: &str = "pbkdf2-sha256";
const DEFAULT_ITERATIONS: u32 = 29_000;
const DERIVED_KEY_BYTES: usize = 32;
const SALT_BYTES: usize = 16;

/// Cost-function input ceiling: longer plaintexts are truncated before the
/// KDF runs, on both the hashing and the verification path.
const MAX_PASSWORD_BYTES: usize = 72;

struct ParsedCredential<'a> {
    iterations: u32,
    salt: &'a str,
    digest: &'a str,
}

/// Split a stored credential into its fields.
///
/// Exactly five `$`-delimited fields are required, with an empty leading
/// field and no embedded `$` in the salt. Anything else is rejected rather
/// than guessed at.
fn parse(stored: &str) -> Option<ParsedCredential<'_>> {
    let fields: Vec<&str> = stored.split('$').collect();
    if fields.len() != 5 || !fields[0].is_empty() {
        return None;
    }
    if fields[1] != ALGORITHM_PBKDF2_SHA256 {
        return None;
    }
    let iterations: u32 = fields[2].parse().ok()?;
    if iterations == 0 || fields[3].is_empty() || fields[4].is_empty() {
        return None;
    }
    Some(ParsedCredential {
        iterations,
        salt: fields[3],
        digest: fields[4],
    })
}

fn truncate(plaintext: &str) -> &[u8] {
    let bytes = plaintext.as_bytes();
    &bytes[..bytes.len().min(MAX_PASSWORD_BYTES)]
}

/// Recompute the derived key and return it encoded the way it is stored.
fn derive(plaintext: &str, salt: &str, iterations: u32) -> String {
    let mut derived = [0u8; DERIVED_KEY_BYTES];
    pbkdf2_hmac::<Sha256>(
        truncate(plaintext),
        salt.as_bytes(),
        iterations,
        &mut derived,
    );
    URL_SAFE_NO_PAD.encode(derived)
}

/// Hash a plaintext password into the stored-credential format.
///
/// # Errors
/// Returns an error only if the system RNG fails to produce a salt.
pub fn hash(plaintext: &str) -> Result<String> {
    let mut salt_bytes = [0u8; SALT_BYTES];
    OsRng
        .try_fill_bytes(&mut salt_bytes)
        .context("failed to generate credential salt")?;
    let salt = URL_SAFE_NO_PAD.encode(salt_bytes);
    let digest = derive(plaintext, &salt, DEFAULT_ITERATIONS);
    Ok(format!(
        "${ALGORITHM_PBKDF2_SHA256}${DEFAULT_ITERATIONS}${salt}${digest}"
    ))
}

/// Verify a plaintext password against a stored credential.
///
/// The digest comparison is constant-time so verification latency does not
/// leak how much of the digest matched.
#[must_use]
pub fn verify(plaintext: &str, stored: &str) -> bool {
    let Some(parsed) = parse(stored) else {
        return false;
    };
    let candidate = derive(plaintext, parsed.salt, parsed.iterations);
    candidate.as_bytes().ct_eq(parsed.digest.as_bytes()).into()
}
