//! # mc-auth-simple
//!
//! Argon2-based implementation of `AuthProvider`.
//! Handles password accounts and opaque bearer sessions. Only the SHA-256
//! digest of a session token is ever kept in memory.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use base64::Engine;
use chrono::{Duration, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use mc_core::validation::is_valid_email;
use mc_core::{
    AppError, AuthProvider, AuthSession, Profile, ProfileRepo, Result, Role, Session, SignUpRequest,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 6;

/// A stored credential. Keyed by the normalized e-mail.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Account {
    user_id: Uuid,
    email: String,
    password_hash: String,
}

pub struct SimpleAuthProvider {
    profiles: Arc<dyn ProfileRepo>,
    accounts: DashMap<String, Account>,
    /// sha256(token) hex → session
    sessions: DashMap<String, Session>,
    session_ttl: Duration,
    /// Where credentials are persisted across restarts, if anywhere.
    credentials_path: Option<PathBuf>,
    persist_lock: Mutex<()>,
}

impl SimpleAuthProvider {
    /// Accounts held in memory only.
    pub fn new(profiles: Arc<dyn ProfileRepo>, session_ttl: Duration) -> Self {
        Self {
            profiles,
            accounts: DashMap::new(),
            sessions: DashMap::new(),
            session_ttl,
            credentials_path: None,
            persist_lock: Mutex::new(()),
        }
    }

    /// Accounts loaded from, and written back to, a JSON file.
    pub async fn with_credentials_file(
        profiles: Arc<dyn ProfileRepo>,
        session_ttl: Duration,
        path: PathBuf,
    ) -> anyhow::Result<Self> {
        let mut provider = Self::new(profiles, session_ttl);

        match tokio::fs::read(&path).await {
            Ok(raw) => {
                let accounts: Vec<Account> = serde_json::from_slice(&raw)
                    .with_context(|| format!("parsing {}", path.display()))?;
                for account in accounts {
                    provider.accounts.insert(account.email.clone(), account);
                }
                info!(
                    count = provider.accounts.len(),
                    path = %path.display(),
                    "credentials loaded"
                );
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err).with_context(|| format!("reading {}", path.display())),
        }

        provider.credentials_path = Some(path);
        Ok(provider)
    }

    async fn persist(&self) -> anyhow::Result<()> {
        let Some(path) = &self.credentials_path else {
            return Ok(());
        };
        let _guard = self.persist_lock.lock().await;

        let accounts: Vec<Account> = self.accounts.iter().map(|e| e.value().clone()).collect();
        let json = serde_json::to_vec_pretty(&accounts)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn new_token() -> Result<String> {
    let mut raw = [0u8; 32];
    getrandom::getrandom(&mut raw)
        .map_err(|e| AppError::Internal(format!("token generation failed: {e}")))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(raw))
}

fn hash_password(password: &str) -> Result<String> {
    let mut salt = [0u8; 16];
    getrandom::getrandom(&mut salt)
        .map_err(|e| AppError::Internal(format!("salt generation failed: {e}")))?;
    let salt = SaltString::encode_b64(&salt).map_err(|e| AppError::Internal(e.to_string()))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// Verifies if a provided password matches a stored Argon2 hash.
fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(p) => p,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))
}

#[async_trait]
impl AuthProvider for SimpleAuthProvider {
    async fn sign_up(&self, request: SignUpRequest) -> Result<Profile> {
        let email = normalize_email(&request.email);

        // 1. Field checks
        let mut errors = Vec::new();
        if !is_valid_email(&email) {
            errors.push("Please enter a valid email address".to_string());
        }
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(format!("Password must be at least {MIN_PASSWORD_LEN} characters long"));
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        if self
            .profiles
            .find_profile_by_email(&email)
            .await
            .map_err(AppError::backend)?
            .is_some()
        {
            return Err(AppError::Conflict("an account with this email already exists".into()));
        }

        // 2. Hash off the async runtime
        let password = request.password;
        let password_hash = blocking(move || hash_password(&password)).await??;

        // 3. Claim the e-mail
        let user_id = Uuid::now_v7();
        match self.accounts.entry(email.clone()) {
            Entry::Occupied(_) => {
                return Err(AppError::Conflict("an account with this email already exists".into()));
            }
            Entry::Vacant(slot) => {
                slot.insert(Account {
                    user_id,
                    email: email.clone(),
                    password_hash,
                });
            }
        }

        // 4. Persist before the profile exists
        if let Err(err) = self.persist().await {
            self.accounts.remove(&email);
            warn!(error = %err, "failed to persist credentials");
            return Err(AppError::Internal(format!("could not store credentials: {err}")));
        }

        // 5. Create the profile; an account without one is rolled back
        let now = Utc::now();
        let text = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let profile = Profile {
            id: user_id,
            full_name: request.full_name.trim().to_string(),
            email: email.clone(),
            phone: text(request.phone),
            location: text(request.location),
            role: Role::User,
            is_verified: false,
            created_at: now,
            updated_at: now,
        };
        if let Err(err) = self.profiles.create_profile(profile.clone()).await {
            self.accounts.remove(&email);
            if let Err(persist_err) = self.persist().await {
                warn!(error = %persist_err, "failed to drop rolled-back credentials from disk");
            }
            return Err(AppError::backend(err));
        }

        Ok(profile)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let invalid = || AppError::Unauthorized("invalid email or password".into());

        let account = self
            .accounts
            .get(&normalize_email(email))
            .map(|a| a.value().clone())
            .ok_or_else(invalid)?;

        let password = password.to_string();
        let hash = account.password_hash.clone();
        if !blocking(move || verify_password(&password, &hash)).await? {
            return Err(invalid());
        }

        let role = self
            .profiles
            .get_profile(account.user_id)
            .await
            .map_err(AppError::backend)?
            .map(|p| p.role)
            .unwrap_or_default();

        let now = Utc::now();
        self.sessions.retain(|_, s| s.expires_at > now);

        let token = new_token()?;
        let session = Session {
            user_id: account.user_id,
            email: account.email,
            role,
            expires_at: now + self.session_ttl,
        };
        self.sessions.insert(token_digest(&token), session.clone());
        info!(user_id = %session.user_id, "signed in");

        Ok(AuthSession { token, session })
    }

    async fn current_user(&self, token: &str) -> Result<Option<Session>> {
        let digest = token_digest(token);
        let session = match self.sessions.get(&digest) {
            Some(entry) => entry.value().clone(),
            None => return Ok(None),
        };

        if session.expires_at <= Utc::now() {
            self.sessions.remove(&digest);
            return Ok(None);
        }
        Ok(Some(session))
    }

    async fn sign_out(&self, token: &str) -> Result<()> {
        self.sessions.remove(&token_digest(token));
        Ok(())
    }
}
