//! Session authority
//!
//! Registration, login (multi-factor gated), opaque bearer tokens, session
//! listing and revocation. Tokens are stored only as SHA-256 digests; the
//! cleartext leaves this module exactly once, in the login response.

use chrono::Utc;
use rand::Rng;
use tracing::{info, instrument, warn};
use validator::Validate;

use harbor_common::auth::{
    generate_backup_codes, generate_session_token, generate_totp_secret, hash_token,
    validate_password_strength, verify_password, verify_totp,
};
use harbor_common::{hash_password, AppError};
use harbor_core::{MfaState, Session, Snowflake, User};

use crate::dto::{
    LoginRequest, LoginResponse, MfaEnabledResponse, RegisterRequest, SecondFactor,
    SessionResponse, UserResponse,
};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// A validated bearer token: the session and its user
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub session: Session,
    pub user: User,
}

/// Authentication service
pub struct AuthService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Register a new account
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: RegisterRequest) -> ServiceResult<UserResponse> {
        request
            .validate()
            .map_err(|e| ServiceError::validation(e.to_string()))?;
        validate_password_strength(&request.password)?;

        if self
            .ctx
            .user_repo()
            .find_by_email(&request.email)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("email already registered".to_string()).into());
        }

        let discriminator = self.pick_discriminator(&request.username).await?;
        let user = User::new(
            self.ctx.next_id(),
            request.username,
            discriminator,
            Some(request.email),
        );
        let password_hash = hash_password(&request.password)?;

        self.ctx.user_repo().create(&user).await?;
        self.ctx
            .user_repo()
            .set_password_hash(user.id, &password_hash)
            .await?;

        info!(user_id = %user.id, "user registered");
        Ok(UserResponse::from(user))
    }

    /// Log in and mint a session
    ///
    /// With multi-factor enabled, a missing second factor fails with
    /// `MfaRequired` and a wrong one with `MfaInvalid`; no session exists
    /// in either case.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<LoginResponse> {
        request
            .validate()
            .map_err(|e| ServiceError::validation(e.to_string()))?;

        let user = self
            .ctx
            .user_repo()
            .find_by_email(&request.email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let stored_hash = self
            .ctx
            .user_repo()
            .password_hash(user.id)
            .await?
            .ok_or(AppError::InvalidCredentials)?;
        if !verify_password(&request.password, &stored_hash)? {
            return Err(AppError::InvalidCredentials.into());
        }

        // Second factor gates session creation, never follows it
        if let Some(mfa) = self.ctx.mfa_repo().find_by_user(user.id).await? {
            if mfa.requires_second_factor() {
                self.check_second_factor(&mfa, request.second_factor.as_ref())
                    .await?;
            }
        }

        let token = generate_session_token();
        let session = Session::new(
            self.ctx.next_id(),
            user.id,
            hash_token(&token),
            Utc::now() + self.ctx.session_ttl(),
        );
        let session = match request.device {
            Some(device) => session.with_device(device),
            None => session,
        };
        self.ctx.session_repo().create(&session).await?;

        info!(user_id = %user.id, session_id = %session.id, "session created");
        Ok(LoginResponse {
            token,
            session: SessionResponse::from(session),
            user: UserResponse::from(user),
        })
    }

    /// Validate a presented bearer token
    ///
    /// Rejects unknown, revoked, and expired sessions, in that order of
    /// checking; a valid presentation advances the session's last-seen
    /// timestamp.
    #[instrument(skip_all)]
    pub async fn authenticate(&self, token: &str) -> ServiceResult<AuthenticatedSession> {
        let session = self
            .ctx
            .session_repo()
            .find_by_token_hash(&hash_token(token))
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if session.revoked {
            return Err(AppError::SessionRevoked.into());
        }
        if session.is_expired() {
            return Err(AppError::SessionExpired.into());
        }

        let user = self
            .ctx
            .user_repo()
            .find_by_id(session.user_id)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        self.ctx
            .session_repo()
            .touch(session.id, Utc::now())
            .await?;

        Ok(AuthenticatedSession { session, user })
    }

    /// Revoke one session; idempotent
    ///
    /// Any gateway connection bound to the session is closed before this
    /// returns.
    #[instrument(skip(self))]
    pub async fn logout(&self, session_id: Snowflake) -> ServiceResult<()> {
        self.ctx.session_repo().revoke(session_id).await?;
        self.ctx.event_sink().close_session(session_id).await;
        info!(%session_id, "session revoked");
        Ok(())
    }

    /// Revoke every session of a user
    #[instrument(skip(self))]
    pub async fn logout_all(&self, user_id: Snowflake) -> ServiceResult<u64> {
        let sessions = self.ctx.session_repo().list_for_user(user_id).await?;
        let revoked = self.ctx.session_repo().revoke_all_for_user(user_id).await?;
        for session in sessions {
            self.ctx.event_sink().close_session(session.id).await;
        }
        Ok(revoked)
    }

    /// List the user's sessions, token digests excluded
    pub async fn list_sessions(&self, user_id: Snowflake) -> ServiceResult<Vec<SessionResponse>> {
        let sessions = self.ctx.session_repo().list_for_user(user_id).await?;
        Ok(sessions.into_iter().map(SessionResponse::from).collect())
    }

    /// Enable multi-factor auth; returns the secret and backup codes once
    #[instrument(skip(self, password))]
    pub async fn enable_mfa(
        &self,
        user_id: Snowflake,
        password: &str,
    ) -> ServiceResult<MfaEnabledResponse> {
        let stored_hash = self
            .ctx
            .user_repo()
            .password_hash(user_id)
            .await?
            .ok_or(AppError::InvalidCredentials)?;
        if !verify_password(password, &stored_hash)? {
            return Err(AppError::InvalidCredentials.into());
        }

        let secret = generate_totp_secret();
        let (codes, hashes) = generate_backup_codes();

        let mut state = MfaState::new(user_id);
        state.totp_secret = Some(secret.clone());
        state.backup_code_hashes = hashes;
        state.enabled = true;
        self.ctx.mfa_repo().upsert(&state).await?;

        info!(%user_id, "multi-factor auth enabled");
        Ok(MfaEnabledResponse {
            secret,
            backup_codes: codes,
        })
    }

    /// Disable multi-factor auth
    #[instrument(skip(self))]
    pub async fn disable_mfa(&self, user_id: Snowflake) -> ServiceResult<()> {
        self.ctx.mfa_repo().disable(user_id).await?;
        info!(%user_id, "multi-factor auth disabled");
        Ok(())
    }

    async fn check_second_factor(
        &self,
        mfa: &MfaState,
        factor: Option<&SecondFactor>,
    ) -> ServiceResult<()> {
        let factor = factor.ok_or(AppError::MfaRequired)?;

        match factor {
            SecondFactor::Totp(code) => {
                let secret = mfa.totp_secret.as_deref().ok_or(AppError::MfaInvalid)?;
                let now = u64::try_from(Utc::now().timestamp()).unwrap_or(0);
                if !verify_totp(secret, code, now) {
                    warn!(user_id = %mfa.user_id, "rejected TOTP code");
                    return Err(AppError::MfaInvalid.into());
                }
            }
            SecondFactor::BackupCode(code) => {
                // Consumption is atomic in the store, so a code presented
                // twice concurrently succeeds at most once
                let consumed = self
                    .ctx
                    .mfa_repo()
                    .consume_backup_code(mfa.user_id, &hash_token(code))
                    .await?;
                if !consumed {
                    warn!(user_id = %mfa.user_id, "rejected backup code");
                    return Err(AppError::MfaInvalid.into());
                }
            }
        }
        Ok(())
    }

    async fn pick_discriminator(&self, username: &str) -> ServiceResult<String> {
        for _ in 0..10 {
            let candidate = format!("{:04}", rand::thread_rng().gen_range(1..=9999));
            if self
                .ctx
                .user_repo()
                .find_by_tag(username, &candidate)
                .await?
                .is_none()
            {
                return Ok(candidate);
            }
        }
        Err(ServiceError::validation(
            "username has no free discriminators",
        ))
    }
}
