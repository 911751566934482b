use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    auth::{
        code::CodeGenerator,
        delivery::CodeSender,
        dto::{LoginResponse, PublicUser, TOKEN_TYPE},
        jwt::TokenProvider,
        password::PasswordHasher,
        repo::{CodeTaken, EmailTaken, UserStore},
        repo_types::{NewUser, User},
    },
    error::AuthError,
};

const MAX_CODE_ATTEMPTS: usize = 5;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Signup, verification and login over injected providers.
#[derive(Clone)]
pub struct AuthService {
    pub users: Arc<dyn UserStore>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub tokens: Arc<dyn TokenProvider>,
    pub codes: Arc<dyn CodeGenerator>,
    pub sender: Arc<dyn CodeSender>,
    pub require_verified_login: bool,
}

impl AuthService {
    pub async fn signup(&self, email: &str, password: &str) -> Result<PublicUser, AuthError> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            warn!(%email, "invalid email");
            return Err(AuthError::InvalidEmail);
        }

        if self.users.find_by_email(&email).await?.is_some() {
            warn!(%email, "email already registered");
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = self.hasher.hash(password)?;
        let user = self.insert_with_fresh_code(email, password_hash).await?;

        // Undo the insert so the email can sign up again once delivery works.
        if let Err(e) = self.sender.send(&user.email, &user.verification_code).await {
            warn!(user_id = %user.id, error = %e, "code delivery failed; discarding signup");
            self.users.discard_unverified(user.id).await?;
            return Err(e.into());
        }

        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(user.into())
    }

    pub async fn verify(&self, code: &str) -> Result<PublicUser, AuthError> {
        let Some(user) = self.users.find_by_code(code).await? else {
            warn!("unknown verification code");
            return Err(AuthError::UnknownCode);
        };
        if user.verified {
            warn!(user_id = %user.id, "user already verified");
            return Err(AuthError::AlreadyVerified);
        }

        // A concurrent request may have consumed the code since the lookup.
        let user = self
            .users
            .mark_verified(code)
            .await?
            .ok_or(AuthError::AlreadyVerified)?;

        info!(user_id = %user.id, email = %user.email, "user verified");
        Ok(user.into())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let email = normalize_email(email);

        let Some(user) = self.users.find_by_email(&email).await? else {
            warn!(%email, "login unknown email");
            return Err(AuthError::UnknownEmail);
        };

        if !self.hasher.verify(password, &user.password_hash)? {
            warn!(%email, user_id = %user.id, "login invalid password");
            return Err(AuthError::InvalidPassword);
        }

        if self.require_verified_login && !user.verified {
            warn!(%email, user_id = %user.id, "login before verification");
            return Err(AuthError::NotVerified);
        }

        let access_token = self.tokens.issue(&user.email)?;
        info!(user_id = %user.id, email = %user.email, verified = user.verified, "user logged in");
        Ok(LoginResponse {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
        })
    }

    /// The store rejects a code held by another user; draw again when that happens.
    async fn insert_with_fresh_code(
        &self,
        email: String,
        password_hash: String,
    ) -> Result<User, AuthError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let res = self
                .users
                .create(NewUser {
                    email: email.clone(),
                    password_hash: password_hash.clone(),
                    verification_code: self.codes.generate(),
                })
                .await;
            match res {
                Ok(user) => return Ok(user),
                Err(e) if e.downcast_ref::<CodeTaken>().is_some() => {
                    warn!(%email, "verification code collision; regenerating");
                }
                Err(e) if e.downcast_ref::<EmailTaken>().is_some() => {
                    return Err(AuthError::DuplicateEmail);
                }
                Err(e) => return Err(AuthError::Internal(e)),
            }
        }
        Err(anyhow::anyhow!("could not generate an unused verification code").into())
    }
}
