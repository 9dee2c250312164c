//! Account service errors.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::email::EmailError;
use crate::services::oauth::OAuthError;
use crate::services::otp::OtpError;

/// Errors from account operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The email address failed validation.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] attire_core::EmailError),

    /// Another account already uses this email.
    #[error("email already registered")]
    EmailTaken,

    /// Password shorter than the minimum length.
    #[error("password must be at least {0} characters")]
    PasswordTooShort(usize),

    /// The verification code is wrong, expired, or was never issued.
    #[error("invalid or expired verification code")]
    InvalidOtp,

    /// No account exists for this email.
    #[error("user not found")]
    UserNotFound,

    /// The account has no password; it was created via OTP or OAuth.
    #[error("account has no password set")]
    NoPasswordSet,

    #[error("incorrect password")]
    IncorrectPassword,

    /// Password hashing failed.
    #[error("failed to hash password")]
    Hash,

    #[error(transparent)]
    Oauth(#[from] OAuthError),

    #[error(transparent)]
    Otp(#[from] OtpError),

    #[error(transparent)]
    Email(#[from] EmailError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
