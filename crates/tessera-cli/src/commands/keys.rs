//! Key management commands.
//!
//! `tessera keys generate` - Generate a new HS256 secret key.

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tessera_token::SecretKey;

/// File name used when writing a generated key to a directory.
pub const SECRET_KEY_FILE: &str = "secret.key";

/// Generate a new secret key.
pub fn generate(output: Option<PathBuf>) -> anyhow::Result<()> {
    let key = SecretKey::generate();

    if let Some(output_dir) = output {
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        let key_path = output_dir.join(SECRET_KEY_FILE);
        write_private(&key_path, &key)?;
        tracing::info!(path = %key_path.display(), "Generated secret key");

        println!("✔ Generated secret key:");
        println!("  Secret key: {}", key_path.display());
        println!();
        println!("⚠️  Keep this key secret! Anyone holding it can issue valid tokens.");
        println!();
        println!("Set as environment variable:");
        println!("  export TESSERA_SECRET_KEY=$(cat {})", key_path.display());
    } else {
        println!("Secret key (keep secure!):");
        println!("{}", key.to_base64());
        println!();
        println!("Use --output <dir> to save the key to a file.");
    }

    Ok(())
}

#[cfg(unix)]
fn write_private(path: &Path, key: &SecretKey) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    key.save_to_file(path)?;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn write_private(path: &Path, key: &SecretKey) -> anyhow::Result<()> {
    key.save_to_file(path)?;
    Ok(())
}
