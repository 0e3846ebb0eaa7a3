//! Local sign-in state: known users, the active identity and the pending verification code.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Minutes a verification code stays valid.
pub const CODE_TTL_MINUTES: i64 = 10;

/// Known user.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
}

/// Code issued by [`SessionStore::request_code`].
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PendingCode {
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VerifyOutcome {
    SignedIn(User),
    NoPendingCode,
    /// Wrong code, or the code was issued for another address
    Mismatch,
    Expired,
}

/// Session records in SQLite.
#[derive(Clone)]
pub struct SessionStore {
    pool: SqlitePool,
}

impl SessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Issue a fresh 6-digit code for `email`, replacing any pending one.
    pub async fn request_code(&self, email: &str) -> Result<PendingCode> {
        let email = email.trim();
        if !is_valid_email(email) {
            bail!("'{}' is not a valid email address", email);
        }

        let code = rand::rng().random_range(100_000..1_000_000).to_string();
        let expires_at = Utc::now() + Duration::minutes(CODE_TTL_MINUTES);

        sqlx::query(
            r#"
            INSERT INTO verification_codes (id, email, code, expires_at)
            VALUES (1, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                email = excluded.email,
                code = excluded.code,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(email)
        .bind(&code)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .context("Failed to store verification code")?;

        debug!(email = %email, expires_at = %expires_at, "Verification code issued");

        Ok(PendingCode {
            email: email.to_string(),
            code,
            expires_at,
        })
    }

    pub async fn pending_code(&self) -> Result<Option<PendingCode>> {
        sqlx::query_as::<_, PendingCode>(
            "SELECT email, code, expires_at FROM verification_codes WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch verification code")
    }

    pub async fn verify(&self, email: &str, code: &str) -> Result<VerifyOutcome> {
        self.verify_at(email, code, Utc::now()).await
    }

    /// Check `code` against the pending one as of `now`. Success signs the user in and clears the code.
    pub async fn verify_at(&self, email: &str, code: &str, now: DateTime<Utc>) -> Result<VerifyOutcome> {
        let email = email.trim();
        let Some(pending) = self.pending_code().await? else {
            return Ok(VerifyOutcome::NoPendingCode);
        };

        if pending.email != email || pending.code != code.trim() {
            return Ok(VerifyOutcome::Mismatch);
        }
        if now > pending.expires_at {
            return Ok(VerifyOutcome::Expired);
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (email, created_at, last_login)
            VALUES (?, ?, ?)
            ON CONFLICT(email) DO UPDATE SET last_login = excluded.last_login
            "#,
        )
        .bind(email)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to save user")?;

        sqlx::query(
            r#"
            INSERT INTO session (id, email, signed_in_at)
            VALUES (1, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                email = excluded.email,
                signed_in_at = excluded.signed_in_at
            "#,
        )
        .bind(email)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to save session")?;

        sqlx::query("DELETE FROM verification_codes WHERE id = 1")
            .execute(&mut *tx)
            .await?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to load user")?;

        tx.commit().await?;

        info!(email = %email, "Signed in");
        Ok(VerifyOutcome::SignedIn(user))
    }

    /// The signed-in user, if any.
    pub async fn active_user(&self) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT users.* FROM session
            JOIN users ON users.email = session.email
            WHERE session.id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch session")
    }

    /// Returns whether someone was signed in.
    pub async fn sign_out(&self) -> Result<bool> {
        let result = sqlx::query("DELETE FROM session WHERE id = 1")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// `local@domain.tld` with no whitespace.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}
