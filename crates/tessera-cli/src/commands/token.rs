//! Token management commands.
//!
//! `tessera token issue` - Issue a new signed token.
//! `tessera token verify` - Verify a token and print its claims.
//! `tessera token inspect` - Decode a token without verifying it.

use anyhow::Context;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tessera_core::TokenConfig;
use tessera_token::{
    ClaimValue, Claims, SecretKey, TokenEncoder, TokenVerifier, inspect_token_unverified,
};

/// Arguments for `tessera token issue`.
#[derive(Debug, Default)]
pub struct IssueArgs {
    pub key: Option<String>,
    pub claims: Vec<String>,
    pub claims_file: Option<PathBuf>,
    pub expires: Option<String>,
    pub output: Option<PathBuf>,
}

/// Resolve the secret key from an argument or the configuration.
///
/// The key string can be:
/// - A path to a file containing a base64-encoded key
/// - A base64-encoded key directly (e.g., from TESSERA_SECRET_KEY env var)
fn resolve_secret_key(key: Option<String>, config: &TokenConfig) -> anyhow::Result<SecretKey> {
    let key_str = match key {
        Some(key) => key,
        None => config
            .resolve_secret_key()
            .context("Failed to read secret key from configuration")?
            .context(
                "Secret key not provided. Either pass --key <path>, set TESSERA_SECRET_KEY, \
                 or configure token.secret_key_file",
            )?,
    };

    let path = Path::new(&key_str);
    if path.exists() {
        return SecretKey::load_from_file(path)
            .with_context(|| format!("Failed to load secret key from file: {}", path.display()));
    }

    SecretKey::from_base64(&key_str)
        .context("Failed to parse secret key. Expected URL-safe unpadded base64")
}

/// Read a token argument, loading it from a file if it names one.
fn read_token(token: String) -> anyhow::Result<String> {
    if Path::new(&token).exists() {
        Ok(fs::read_to_string(&token)?.trim().to_string())
    } else {
        Ok(token.trim().to_string())
    }
}

/// Parse a duration string like "24h", "7d", "30m", "45s" into chrono::Duration.
///
/// "none" and "never" mean no expiry.
fn parse_duration(s: &str) -> anyhow::Result<Option<chrono::Duration>> {
    let s = s.trim().to_lowercase();

    if s == "none" || s == "never" {
        return Ok(None);
    }

    let duration = if let Some(hours) = s.strip_suffix('h') {
        chrono::Duration::try_hours(hours.parse()?)
    } else if let Some(days) = s.strip_suffix('d') {
        chrono::Duration::try_days(days.parse()?)
    } else if let Some(minutes) = s.strip_suffix('m') {
        chrono::Duration::try_minutes(minutes.parse()?)
    } else if let Some(seconds) = s.strip_suffix('s') {
        chrono::Duration::try_seconds(seconds.parse()?)
    } else {
        // Bare numbers are seconds
        chrono::Duration::try_seconds(s.parse()?)
    };
    let Some(duration) = duration else {
        anyhow::bail!("Token lifetime out of range: {}", s);
    };

    if duration <= chrono::Duration::zero() {
        anyhow::bail!("Token lifetime must be positive: {}", s);
    }

    Ok(Some(duration))
}

/// Parse a `key=value` claim.
///
/// The value is read as a JSON literal when it is one (`42`, `true`,
/// `["a","b"]`), and as a plain string otherwise.
fn parse_claim(pair: &str) -> anyhow::Result<(String, ClaimValue)> {
    let (key, raw) = pair
        .split_once('=')
        .with_context(|| format!("Invalid claim '{}'. Expected KEY=VALUE", pair))?;

    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("Invalid claim '{}'. Claim name is empty", pair);
    }

    let value = serde_json::from_str::<ClaimValue>(raw)
        .unwrap_or_else(|_| ClaimValue::String(raw.to_string()));

    Ok((key.to_string(), value))
}

/// Build the claims for a new token.
///
/// Claims from `--claims-file` are applied first, then `--claim` flags. An
/// explicit `--expires` always sets `exp`; otherwise the configured default
/// lifetime applies unless the claims already carry an `exp`.
fn build_claims(args: &IssueArgs, config: &TokenConfig, now: i64) -> anyhow::Result<Claims> {
    let mut claims = match &args.claims_file {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read claims file: {}", path.display()))?;
            serde_json::from_str::<Claims>(&content).with_context(|| {
                format!("Claims file {} must contain a JSON object", path.display())
            })?
        }
        None => Claims::new(),
    };

    for pair in &args.claims {
        let (key, value) = parse_claim(pair)?;
        claims.insert(key, value);
    }

    let lifetime = match &args.expires {
        Some(expires) => Some(expires.as_str()),
        None if claims.contains_key(tessera_token::EXPIRY_CLAIM) => None,
        None => config.default_ttl.as_deref(),
    };

    if let Some(lifetime) = lifetime {
        if let Some(ttl) = parse_duration(lifetime)? {
            claims = claims.expires_in(now, ttl);
        } else {
            claims.remove(tessera_token::EXPIRY_CLAIM);
        }
    }

    Ok(claims)
}

/// Issue a new token.
pub fn issue(args: IssueArgs, config: &TokenConfig) -> anyhow::Result<()> {
    let key = resolve_secret_key(args.key.clone(), config)?;
    let claims = build_claims(&args, config, Utc::now().timestamp())?;

    let token = TokenEncoder::new(&key).encode(&claims)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &token)?;
        println!("✔ Token written to: {}", output_path.display());
        println!("  Claims: {}", claims.len());
        match claims.expiry() {
            Ok(Some(exp)) => println!("  Expires: {}", format_timestamp(exp)),
            _ => println!("  Expires: never"),
        }
    } else {
        println!("{}", token);
    }

    Ok(())
}

/// Verify a token. Returns whether it was accepted.
pub fn verify(
    key: Option<String>,
    token: String,
    now: Option<i64>,
    require_expiration: bool,
    config: &TokenConfig,
) -> anyhow::Result<bool> {
    let key = resolve_secret_key(key, config)?;
    let token = read_token(token)?;
    let now = now.unwrap_or_else(|| Utc::now().timestamp());

    let claims = match TokenVerifier::new(&key).verify(&token, now) {
        Ok(claims) => claims,
        Err(reason) => {
            tracing::warn!(reason = reason.as_str(), "Token verification failed");
            println!("✖ Token rejected: {} ({})", reason, reason.as_str());
            return Ok(false);
        }
    };

    let expiry = claims.expiry()?;
    if expiry.is_none() && (require_expiration || config.require_expiration) {
        println!("✖ Token rejected: no exp claim and expiration is required");
        return Ok(false);
    }

    println!("✔ Token is valid");
    println!();
    match expiry {
        Some(exp) => println!("Expires: {}", format_timestamp(exp)),
        None => println!("Expires: never"),
    }
    println!("Claims:");
    println!("{}", serde_json::to_string_pretty(&claims)?);

    Ok(true)
}

/// Inspect a token without verification.
pub fn inspect(token: String) -> anyhow::Result<()> {
    let token = read_token(token)?;
    let info = inspect_token_unverified(&token).context("Token could not be decoded")?;

    println!("Token Information (signature NOT verified):");
    println!("  Algorithm: {}", info.header.alg);
    println!("  Type: {}", info.header.typ);
    println!("  Signature: {} bytes", info.signature_len);
    match info.expires_at {
        Some(at) => println!("  Expires: {}", at.to_rfc3339()),
        None => println!("  Expires: never"),
    }
    println!();
    println!("{}", serde_json::to_string_pretty(&info.claims)?);

    Ok(())
}

fn format_timestamp(exp: i64) -> String {
    chrono::DateTime::from_timestamp(exp, 0)
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| exp.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const NOW: i64 = 1_700_000_000;

    fn config_without_env() -> TokenConfig {
        TokenConfig {
            secret_key_env: None,
            ..TokenConfig::default()
        }
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("24h").unwrap(), Some(chrono::Duration::hours(24)));
        assert_eq!(parse_duration("7d").unwrap(), Some(chrono::Duration::days(7)));
        assert_eq!(parse_duration("30m").unwrap(), Some(chrono::Duration::minutes(30)));
        assert_eq!(parse_duration("60s").unwrap(), Some(chrono::Duration::seconds(60)));
        assert_eq!(parse_duration("90").unwrap(), Some(chrono::Duration::seconds(90)));
        assert_eq!(parse_duration("never").unwrap(), None);
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn test_parse_duration_out_of_range() {
        assert!(parse_duration("99999999999999999d").is_err());
        assert!(parse_duration("9223372036854775807h").is_err());
        assert!(parse_duration("9223372036854775807s").is_err());
    }

    #[test]
    fn test_parse_claim() {
        assert_eq!(
            parse_claim("name=alice").unwrap(),
            ("name".to_string(), ClaimValue::from("alice"))
        );
        assert_eq!(
            parse_claim("admin=1").unwrap(),
            ("admin".to_string(), ClaimValue::Integer(1))
        );
        assert_eq!(
            parse_claim("note=a=b").unwrap(),
            ("note".to_string(), ClaimValue::from("a=b"))
        );
        assert_eq!(
            parse_claim("id=\"42\"").unwrap(),
            ("id".to_string(), ClaimValue::from("42"))
        );
        assert_eq!(
            parse_claim("n=18446744073709551615").unwrap(),
            ("n".to_string(), ClaimValue::UInteger(u64::MAX))
        );
        assert!(parse_claim("novalue").is_err());
        assert!(parse_claim("=x").is_err());
    }

    #[test]
    fn test_build_claims_applies_default_ttl() {
        let args = IssueArgs {
            claims: vec!["name=ahmet".to_string(), "admin=1".to_string()],
            ..IssueArgs::default()
        };

        let claims = build_claims(&args, &config_without_env(), NOW).unwrap();
        assert_eq!(claims.get_str("name").unwrap(), "ahmet");
        assert_eq!(claims.expiry().unwrap(), Some(NOW + 60));
    }

    #[test]
    fn test_build_claims_keeps_explicit_exp() {
        let args = IssueArgs {
            claims: vec!["exp=1700000100".to_string()],
            ..IssueArgs::default()
        };

        let claims = build_claims(&args, &config_without_env(), NOW).unwrap();
        assert_eq!(claims.expiry().unwrap(), Some(1_700_000_100));
    }

    #[test]
    fn test_build_claims_without_expiry() {
        let args = IssueArgs {
            claims: vec!["exp=1".to_string()],
            expires: Some("none".to_string()),
            ..IssueArgs::default()
        };

        let claims = build_claims(&args, &config_without_env(), NOW).unwrap();
        assert_eq!(claims.expiry().unwrap(), None);
    }

    #[test]
    fn test_build_claims_from_file() {
        let dir = tempdir().unwrap();
        let claims_path = dir.path().join("claims.json");
        fs::write(&claims_path, r#"{"sub":"user:1","roles":["reader"]}"#).unwrap();

        let args = IssueArgs {
            claims_file: Some(claims_path),
            claims: vec!["sub=user:2".to_string()],
            expires: Some("1h".to_string()),
            ..IssueArgs::default()
        };

        let claims = build_claims(&args, &config_without_env(), NOW).unwrap();
        assert_eq!(claims.get_str("sub").unwrap(), "user:2");
        assert!(claims.get("roles").and_then(ClaimValue::as_array).is_some());
        assert_eq!(claims.expiry().unwrap(), Some(NOW + 3600));
    }

    #[test]
    fn test_issue_and_verify_with_key_file() {
        let dir = tempdir().unwrap();
        let key_path = dir.path().join("secret.key");
        let token_path = dir.path().join("token.txt");

        let key = SecretKey::generate();
        key.save_to_file(&key_path).unwrap();
        let key_arg = key_path.to_string_lossy().to_string();

        issue(
            IssueArgs {
                key: Some(key_arg.clone()),
                claims: vec!["name=alice".to_string()],
                expires: Some("1h".to_string()),
                output: Some(token_path.clone()),
                ..IssueArgs::default()
            },
            &config_without_env(),
        )
        .unwrap();

        let token = fs::read_to_string(&token_path).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let accepted = verify(
            Some(key_arg),
            token_path.to_string_lossy().to_string(),
            None,
            true,
            &config_without_env(),
        )
        .unwrap();
        assert!(accepted);
    }

    #[test]
    fn test_verify_rejections() {
        let key = SecretKey::generate();
        let key_arg = key.to_base64();
        let config = config_without_env();

        let expiring = tessera_token::encode(&Claims::new().with_expiry(NOW + 10), &key).unwrap();
        assert!(verify(Some(key_arg.clone()), expiring.clone(), Some(NOW), false, &config).unwrap());
        assert!(!verify(Some(key_arg.clone()), expiring, Some(NOW + 10), false, &config).unwrap());

        let open_ended = tessera_token::encode(&Claims::new().with("sub", "svc"), &key).unwrap();
        assert!(verify(Some(key_arg.clone()), open_ended.clone(), Some(NOW), false, &config).unwrap());
        assert!(!verify(Some(key_arg.clone()), open_ended, Some(NOW), true, &config).unwrap());

        let other = SecretKey::generate().to_base64();
        let token = tessera_token::encode(&Claims::new(), &key).unwrap();
        assert!(!verify(Some(other), token, Some(NOW), false, &config).unwrap());
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let result = verify(None, "a.b.c".to_string(), Some(NOW), false, &config_without_env());
        assert!(result.is_err());
    }

    #[test]
    fn test_inspect() {
        let key = SecretKey::generate();
        let token = tessera_token::encode(&Claims::new().with("name", "alice"), &key).unwrap();

        inspect(token).unwrap();
        assert!(inspect("not-a-token".to_string()).is_err());
    }
}
