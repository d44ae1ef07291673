//! Encrypted persistence of the authentication session
//!
//! The session is stored as JSON encrypted with AES-256-GCM in
//! ~/.config/bookswap/session.enc. The key is derived from machine-specific
//! identifiers, so the file is useless when copied to another machine.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::api::AuthSession;

const NONCE_SIZE: usize = 12;
const KEY_SALT: &[u8] = b"bookswap-session-v1";

/// Errors reading or writing the session file
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("session file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("session file is truncated")]
    Truncated,
    #[error("failed to encrypt session")]
    Encrypt,
    #[error("failed to decrypt session (written on another machine?)")]
    Decrypt,
    #[error("invalid session data: {0}")]
    Format(#[from] serde_json::Error),
}

/// Where and how the session is persisted
pub enum SessionVault {
    /// Encrypted file on disk
    File { path: PathBuf, key: [u8; 32] },
    /// Nothing is persisted (tests, demo)
    Ephemeral,
}

impl SessionVault {
    /// Vault at the default location with the machine-derived key
    pub fn open_default() -> anyhow::Result<Self> {
        Ok(Self::at(crate::paths::session_path()?))
    }

    /// Vault at a specific path with the machine-derived key
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self::File {
            path: path.into(),
            key: derive_key(),
        }
    }

    /// Vault at a specific path with an explicit key
    pub fn with_key(path: impl Into<PathBuf>, key: [u8; 32]) -> Self {
        Self::File {
            path: path.into(),
            key,
        }
    }

    /// Read the persisted session, `None` when nothing is stored
    pub fn load(&self) -> Result<Option<AuthSession>, VaultError> {
        let Self::File { path, key } = self else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }

        let encrypted = fs::read(path)?;
        if encrypted.len() < NONCE_SIZE {
            return Err(VaultError::Truncated);
        }
        let (nonce_bytes, ciphertext) = encrypted.split_at(NONCE_SIZE);

        let plaintext = cipher(key)
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| VaultError::Decrypt)?;

        Ok(Some(serde_json::from_slice(&plaintext)?))
    }

    /// Persist a session, replacing any previous one
    pub fn save(&self, session: &AuthSession) -> Result<(), VaultError> {
        let Self::File { path, key } = self else {
            return Ok(());
        };

        let json = serde_json::to_vec(session)?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rng().fill(&mut nonce_bytes);

        let ciphertext = cipher(key)
            .encrypt(Nonce::from_slice(&nonce_bytes), json.as_slice())
            .map_err(|_| VaultError::Encrypt)?;

        let mut output = nonce_bytes.to_vec();
        output.extend(ciphertext);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, output)?;
        restrict_permissions(path)?;

        Ok(())
    }

    /// Remove the persisted session
    pub fn clear(&self) -> Result<(), VaultError> {
        match self {
            Self::File { path, .. } if path.exists() => Ok(fs::remove_file(path)?),
            _ => Ok(()),
        }
    }
}

fn cipher(key: &[u8; 32]) -> Aes256Gcm {
    Aes256Gcm::new(key.into())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o600);
    fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Get machine ID for key derivation
fn machine_id() -> String {
    #[cfg(target_os = "linux")]
    {
        for candidate in ["/etc/machine-id", "/var/lib/dbus/machine-id"] {
            if let Ok(id) = fs::read_to_string(candidate) {
                return id.trim().to_string();
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(output) = std::process::Command::new("ioreg")
            .args(["-rd1", "-c", "IOPlatformExpertDevice"])
            .output()
        {
            let stdout = String::from_utf8_lossy(&output.stdout);
            if let Some(uuid) = stdout
                .lines()
                .find(|line| line.contains("IOPlatformUUID"))
                .and_then(|line| line.split('"').nth(3))
            {
                return uuid.to_string();
            }
        }
    }

    dirs::home_dir()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "bookswap-fallback-key".to_string())
}

/// Derive encryption key from machine-specific data
fn derive_key() -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(machine_id().as_bytes());
    if let Some(home) = dirs::home_dir() {
        hasher.update(home.to_string_lossy().as_bytes());
    }
    if let Some(data) = dirs::data_dir() {
        hasher.update(data.to_string_lossy().as_bytes());
    }
    hasher.update(KEY_SALT);
    hasher.finalize().into()
}
