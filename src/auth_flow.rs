//! `AuthFlow` — dispatches login/register by kind to a `UserStore`.
//!
//! Password hashing and user persistence live entirely behind
//! [`UserStore`]; this module only decides *which* `UserStore` method to
//! call and, for the `mobile`/`email` kinds, gates the call behind
//! [`CodeEngine::verify`].

use async_trait::async_trait;

use crate::code_engine::CodeEngine;
use crate::error::AuthError;

/// The dispatch key for a login/register request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Password,
    Mobile,
    Email,
}

impl Kind {
    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "password" => Some(Kind::Password),
            "mobile" => Some(Kind::Mobile),
            "email" => Some(Kind::Email),
            _ => None,
        }
    }
}

/// An opaque user identifier returned by `UserStore`.
pub type UserId = i64;

/// The external collaborator responsible for password hashing and user
/// persistence. `AuthFlow` never implements these itself.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Registers a new user authenticated by password.
    async fn register_by_password(&self, username: &str, password: &str) -> anyhow::Result<UserId>;
    /// Registers a new user identified by mobile number (code already verified).
    async fn register_by_mobile(&self, mobile: &str) -> anyhow::Result<UserId>;
    /// Registers a new user identified by email (code already verified).
    async fn register_by_email(&self, email: &str) -> anyhow::Result<UserId>;

    /// Authenticates a user by username/password.
    ///
    /// Returns `Ok(None)` on a wrong username/password pair so `AuthFlow`
    /// can distinguish that from a store failure.
    async fn login_by_password(
        &self,
        username: &str,
        password: &str,
    ) -> anyhow::Result<Option<UserId>>;
    /// Resolves a user by mobile number (code already verified).
    async fn login_by_mobile(&self, mobile: &str) -> anyhow::Result<Option<UserId>>;
    /// Resolves a user by email (code already verified).
    async fn login_by_email(&self, email: &str) -> anyhow::Result<Option<UserId>>;
}

/// Dispatches login/register requests by [`Kind`] to a [`UserStore`],
/// verifying a one-time code first for the `mobile`/`email` kinds.
pub struct AuthFlow<S: UserStore> {
    store: S,
    codes: CodeEngine,
}

impl<S: UserStore> AuthFlow<S> {
    /// Builds an `AuthFlow` over `store`, verifying codes through `codes`.
    pub fn new(store: S, codes: CodeEngine) -> Self {
        Self { store, codes }
    }

    /// Registers a user. For `mobile`/`email`, `secret` is the one-time
    /// code and `code_key` identifies the record `CodeEngine::make`
    /// stored it under; for `password`, `secret` is the password and
    /// `code_key` is ignored.
    ///
    /// # Errors
    ///
    /// [`AuthError::BadRequest`] for an unrecognized `kind`,
    /// [`AuthError::Code`] if code verification fails, or
    /// [`AuthError::Store`] if the `UserStore` call fails.
    pub async fn register(
        &self,
        kind: &str,
        identifier: &str,
        secret: &str,
        code_key: &str,
    ) -> Result<UserId, AuthError> {
        let kind = Kind::parse(kind)
            .ok_or_else(|| AuthError::BadRequest(format!("unsupported kind: {kind}")))?;

        match kind {
            Kind::Password => self
                .store
                .register_by_password(identifier, secret)
                .await
                .map_err(AuthError::Store),
            Kind::Mobile => {
                self.codes.verify(code_key, secret).await?;
                self.store
                    .register_by_mobile(identifier)
                    .await
                    .map_err(AuthError::Store)
            }
            Kind::Email => {
                self.codes.verify(code_key, secret).await?;
                self.store
                    .register_by_email(identifier)
                    .await
                    .map_err(AuthError::Store)
            }
        }
    }

    /// Logs a user in. See [`AuthFlow::register`] for the meaning of
    /// `secret`/`code_key` across kinds.
    ///
    /// # Errors
    ///
    /// [`AuthError::BadRequest`] for an unrecognized `kind`,
    /// [`AuthError::Code`] if code verification fails,
    /// [`AuthError::InvalidCredentials`] if the store reports no match,
    /// or [`AuthError::Store`] if the `UserStore` call itself fails.
    pub async fn login(
        &self,
        kind: &str,
        identifier: &str,
        secret: &str,
        code_key: &str,
    ) -> Result<UserId, AuthError> {
        let kind = Kind::parse(kind)
            .ok_or_else(|| AuthError::BadRequest(format!("unsupported kind: {kind}")))?;

        let resolved = match kind {
            Kind::Password => self
                .store
                .login_by_password(identifier, secret)
                .await
                .map_err(AuthError::Store)?,
            Kind::Mobile => {
                self.codes.verify(code_key, secret).await?;
                self.store
                    .login_by_mobile(identifier)
                    .await
                    .map_err(AuthError::Store)?
            }
            Kind::Email => {
                self.codes.verify(code_key, secret).await?;
                self.store
                    .login_by_email(identifier)
                    .await
                    .map_err(AuthError::Store)?
            }
        };

        resolved.ok_or(AuthError::InvalidCredentials)
    }
}
