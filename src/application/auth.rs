//! Account registration, login, and bearer-token authentication.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::application::repos::{CreateUserParams, RepoError, UsersRepo};
use crate::domain::entities::UserRecord;
use crate::domain::types::UserRole;

type HmacSha256 = Hmac<Sha256>;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("token is invalid or expired")]
    InvalidToken,
    #[error("account is disabled")]
    Disabled,
    #[error("email is already registered")]
    EmailTaken,
    #[error("registration rejected: {message}")]
    Rejected { message: String },
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Verified identity attached to authenticated requests.
#[derive(Debug, Clone)]
pub struct AuthPrincipal {
    pub user_id: Uuid,
    pub name: String,
    pub role: UserRole,
}

impl AuthPrincipal {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[derive(Debug, Clone)]
pub struct RegisterCommand {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

pub struct AuthService {
    repo: Arc<dyn UsersRepo>,
    token_secret: Vec<u8>,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(repo: Arc<dyn UsersRepo>, token_secret: &str, token_ttl: Duration) -> Self {
        Self {
            repo,
            token_secret: token_secret.as_bytes().to_vec(),
            token_ttl,
        }
    }

    pub async fn register(&self, cmd: RegisterCommand) -> Result<UserRecord, AuthError> {
        self.create_user(cmd, UserRole::User).await
    }

    /// Operator path for the bootstrap subcommand; otherwise identical to
    /// self-registration.
    pub async fn create_admin(&self, cmd: RegisterCommand) -> Result<UserRecord, AuthError> {
        self.create_user(cmd, UserRole::Admin).await
    }

    async fn create_user(
        &self,
        cmd: RegisterCommand,
        role: UserRole,
    ) -> Result<UserRecord, AuthError> {
        let name = cmd.name.trim();
        let email = cmd.email.trim().to_lowercase();
        if name.is_empty() {
            return Err(AuthError::Rejected {
                message: "name must not be empty".into(),
            });
        }
        if !email.contains('@') || email.len() < 5 {
            return Err(AuthError::Rejected {
                message: "email address is not valid".into(),
            });
        }
        if cmd.password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::Rejected {
                message: format!("password must be at least {MIN_PASSWORD_LEN} characters"),
            });
        }

        let salt = Self::generate_salt();
        let hash = Self::hash_password(&cmd.password, &salt);
        let created = self
            .repo
            .create(CreateUserParams {
                name: name.to_string(),
                email,
                password_hash: hash,
                password_salt: salt,
                phone: cmd.phone.filter(|p| !p.trim().is_empty()),
                role,
            })
            .await;
        match created {
            Ok(user) => Ok(user),
            Err(RepoError::Duplicate { .. }) => Err(AuthError::EmailTaken),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(UserRecord, String), AuthError> {
        let email = email.trim().to_lowercase();
        let user = self
            .repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        if !user.is_active {
            return Err(AuthError::Disabled);
        }

        let hashed_input = Self::hash_password(password, &user.password_salt);
        if user
            .password_hash
            .as_bytes()
            .ct_eq(hashed_input.as_bytes())
            .unwrap_u8()
            == 0
        {
            return Err(AuthError::InvalidCredentials);
        }

        // best-effort last_active update; do not block login
        let repo = Arc::clone(&self.repo);
        let user_id = user.id;
        tokio::spawn(async move {
            let _ = repo.touch_last_active(user_id).await;
        });

        let token = self.issue_token(user.id, OffsetDateTime::now_utc());
        Ok((user, token))
    }

    /// Validate a bearer token and load its principal from the store.
    pub async fn authenticate(&self, token: &str) -> Result<AuthPrincipal, AuthError> {
        let user_id = self.verify_token(token, OffsetDateTime::now_utc())?;
        let user = self
            .repo
            .find_by_id(user_id)
            .await
            .map_err(|_| AuthError::InvalidToken)?
            .ok_or(AuthError::InvalidToken)?;
        if !user.is_active {
            return Err(AuthError::Disabled);
        }
        debug!(user_id = %user.id, "token authenticated");
        Ok(AuthPrincipal {
            user_id: user.id,
            name: user.name,
            role: user.role,
        })
    }

    fn issue_token(&self, user_id: Uuid, now: OffsetDateTime) -> String {
        let expires_at = (now + self.token_ttl).unix_timestamp();
        let payload = format!("{}.{expires_at}", user_id.simple());
        let signature = self.sign(&payload);
        format!("{payload}.{}", URL_SAFE_NO_PAD.encode(signature))
    }

    fn verify_token(&self, token: &str, now: OffsetDateTime) -> Result<Uuid, AuthError> {
        let mut parts = token.splitn(3, '.');
        let user_part = parts.next().ok_or(AuthError::InvalidToken)?;
        let expiry_part = parts.next().ok_or(AuthError::InvalidToken)?;
        let signature_part = parts.next().ok_or(AuthError::InvalidToken)?;

        let payload = format!("{user_part}.{expiry_part}");
        let expected = self.sign(&payload);
        let provided = URL_SAFE_NO_PAD
            .decode(signature_part)
            .map_err(|_| AuthError::InvalidToken)?;
        if expected.ct_eq(&provided).unwrap_u8() == 0 {
            return Err(AuthError::InvalidToken);
        }

        let expires_at: i64 = expiry_part.parse().map_err(|_| AuthError::InvalidToken)?;
        if now.unix_timestamp() >= expires_at {
            return Err(AuthError::InvalidToken);
        }
        Uuid::parse_str(user_part).map_err(|_| AuthError::InvalidToken)
    }

    fn sign(&self, payload: &str) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.token_secret)
            .expect("hmac accepts any key length");
        mac.update(payload.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }

    fn generate_salt() -> String {
        Uuid::new_v4().simple().to_string()
    }

    fn hash_password(password: &str, salt: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(b":");
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::domain::types::PremiumPlan;

    #[derive(Default)]
    struct MemoryUsers {
        users: Mutex<Vec<UserRecord>>,
    }

    impl MemoryUsers {
        fn with_user(user: UserRecord) -> Arc<Self> {
            Arc::new(Self {
                users: Mutex::new(vec![user]),
            })
        }
    }

    #[async_trait]
    impl UsersRepo for MemoryUsers {
        async fn create(&self, params: CreateUserParams) -> Result<UserRecord, RepoError> {
            let mut users = self.users.lock().expect("lock");
            if users.iter().any(|u| u.email == params.email) {
                return Err(RepoError::Duplicate {
                    constraint: "users_email_key".into(),
                });
            }
            let now = OffsetDateTime::now_utc();
            let user = UserRecord {
                id: Uuid::new_v4(),
                name: params.name,
                email: params.email,
                password_hash: params.password_hash,
                password_salt: params.password_salt,
                phone: params.phone,
                role: params.role,
                is_active: true,
                is_premium: false,
                premium_plan: PremiumPlan::None,
                last_active: now,
                created_at: now,
                updated_at: now,
            };
            users.push(user.clone());
            Ok(user)
        }
        async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError> {
            Ok(self
                .users
                .lock()
                .expect("lock")
                .iter()
                .find(|u| u.email == email)
                .cloned())
        }
        async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
            Ok(self
                .users
                .lock()
                .expect("lock")
                .iter()
                .find(|u| u.id == id)
                .cloned())
        }
        async fn touch_last_active(&self, _id: Uuid) -> Result<(), RepoError> {
            Ok(())
        }
        async fn list_all(&self) -> Result<Vec<UserRecord>, RepoError> {
            Ok(self.users.lock().expect("lock").clone())
        }
        async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
            self.users.lock().expect("lock").retain(|u| u.id != id);
            Ok(())
        }
        async fn count_all(&self) -> Result<u64, RepoError> {
            Ok(self.users.lock().expect("lock").len() as u64)
        }
        async fn count_active_since(&self, _since: OffsetDateTime) -> Result<u64, RepoError> {
            Ok(0)
        }
        async fn admin_exists(&self) -> Result<bool, RepoError> {
            Ok(self
                .users
                .lock()
                .expect("lock")
                .iter()
                .any(|u| u.role.is_admin()))
        }
    }

    fn service(repo: Arc<MemoryUsers>) -> AuthService {
        AuthService::new(repo, "test-secret", Duration::from_secs(3600))
    }

    fn register_cmd(email: &str) -> RegisterCommand {
        RegisterCommand {
            name: "Tester".into(),
            email: email.into(),
            password: "hunter22".into(),
            phone: None,
        }
    }

    #[tokio::test]
    async fn register_then_login_round_trips() {
        let repo = Arc::new(MemoryUsers::default());
        let auth = service(Arc::clone(&repo));

        auth.register(register_cmd("a@example.com")).await.expect("register");
        let (user, token) = auth.login("A@Example.com", "hunter22").await.expect("login");
        assert_eq!(user.email, "a@example.com");

        let principal = auth.authenticate(&token).await.expect("authenticate");
        assert_eq!(principal.user_id, user.id);
        assert!(!principal.is_admin());
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let repo = Arc::new(MemoryUsers::default());
        let auth = service(Arc::clone(&repo));
        auth.register(register_cmd("a@example.com")).await.expect("register");

        let err = auth.login("a@example.com", "not-it").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn duplicate_email_maps_to_email_taken() {
        let repo = Arc::new(MemoryUsers::default());
        let auth = service(Arc::clone(&repo));
        auth.register(register_cmd("a@example.com")).await.expect("register");

        let err = auth.register(register_cmd("a@example.com")).await.unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn tampered_token_is_rejected() {
        let repo = Arc::new(MemoryUsers::default());
        let auth = service(Arc::clone(&repo));
        auth.register(register_cmd("a@example.com")).await.expect("register");
        let (_, token) = auth.login("a@example.com", "hunter22").await.expect("login");

        let mut forged = token.clone();
        forged.pop();
        forged.push(if token.ends_with('A') { 'B' } else { 'A' });
        assert!(auth.authenticate(&forged).await.is_err());
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let repo = Arc::new(MemoryUsers::default());
        let auth = AuthService::new(
            Arc::clone(&repo) as Arc<dyn UsersRepo>,
            "test-secret",
            Duration::ZERO,
        );
        auth.register(register_cmd("a@example.com")).await.expect("register");
        let (_, token) = auth.login("a@example.com", "hunter22").await.expect("login");
        assert!(auth.authenticate(&token).await.is_err());
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let repo = Arc::new(MemoryUsers::default());
        let auth = service(repo);
        let err = auth
            .register(RegisterCommand {
                password: "abc".into(),
                ..register_cmd("a@example.com")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Rejected { .. }));
    }

    #[tokio::test]
    async fn disabled_account_cannot_login() {
        let now = OffsetDateTime::now_utc();
        let salt = "somesalt".to_string();
        let user = UserRecord {
            id: Uuid::new_v4(),
            name: "Banned".into(),
            email: "b@example.com".into(),
            password_hash: AuthService::hash_password("hunter22", &salt),
            password_salt: salt,
            phone: None,
            role: UserRole::User,
            is_active: false,
            is_premium: false,
            premium_plan: PremiumPlan::None,
            last_active: now,
            created_at: now,
            updated_at: now,
        };
        let auth = service(MemoryUsers::with_user(user));
        let err = auth.login("b@example.com", "hunter22").await.unwrap_err();
        assert!(matches!(err, AuthError::Disabled));
    }
}
