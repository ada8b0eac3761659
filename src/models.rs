use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::logging::mask_secret;

pub mod auth;

/// Canonical user identity as recognized by the backend
///
/// This is the authoritative answer to "who is signed in"; provider-side
/// profile fields the backend does not echo back are not kept.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub name: String,
    pub image_url: String,
}

/// Raw result of a provider sign-in, before the server auth code is checked
#[derive(Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProviderProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub family_name: String,
    #[serde(default)]
    pub image_url: String,
    pub server_auth_code: Option<String>,
    pub id_token: Option<String>,
    pub access_token: Option<String>,
}

impl fmt::Debug for ProviderProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderProfile")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("given_name", &self.given_name)
            .field("family_name", &self.family_name)
            .field("image_url", &self.image_url)
            .field(
                "server_auth_code",
                &self.server_auth_code.as_deref().map(mask_secret),
            )
            .field("id_token", &self.id_token.as_deref().map(mask_secret))
            .field(
                "access_token",
                &self.access_token.as_deref().map(mask_secret),
            )
            .finish()
    }
}

/// One-time proof of identity for a single sign-in attempt
///
/// Only constructible through [`AuthorizationArtifact::from_profile`], which
/// guarantees a non-empty server auth code. It is not
/// `Clone`: it is consumed exactly once by [`VerificationRequest::from_artifact`].
pub struct AuthorizationArtifact {
    id: String,
    email: String,
    name: String,
    image_url: String,
    server_auth_code: String,
    id_token: String,
    access_token: String,
}

impl AuthorizationArtifact {
    /// Validate a provider profile into an artifact
    ///
    /// Returns `None` when the server auth code is missing or blank.
    #[must_use]
    pub fn from_profile(profile: ProviderProfile) -> Option<Self> {
        let server_auth_code = profile
            .server_auth_code
            .filter(|code| !code.trim().is_empty())?;

        Some(Self {
            id: profile.id,
            email: profile.email,
            name: profile.name,
            image_url: profile.image_url,
            server_auth_code,
            id_token: profile.id_token.unwrap_or_default(),
            access_token: profile.access_token.unwrap_or_default(),
        })
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn has_provider_tokens(&self) -> bool {
        !self.id_token.is_empty() || !self.access_token.is_empty()
    }
}

impl fmt::Debug for AuthorizationArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationArtifact")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("image_url", &self.image_url)
            .field("server_auth_code", &mask_secret(&self.server_auth_code))
            .finish_non_exhaustive()
    }
}

/// Payload sent to the backend verification endpoint
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub server_auth_code: String,
    pub email: String,
    pub name: String,
    pub image_url: String,
}

impl VerificationRequest {
    /// Build the wire request, consuming the single-use artifact
    #[must_use]
    pub fn from_artifact(artifact: AuthorizationArtifact) -> Self {
        Self {
            server_auth_code: artifact.server_auth_code,
            email: artifact.email,
            name: artifact.name,
            image_url: artifact.image_url,
        }
    }
}

impl fmt::Debug for VerificationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationRequest")
            .field("server_auth_code", &mask_secret(&self.server_auth_code))
            .field("email", &self.email)
            .field("name", &self.name)
            .field("image_url", &self.image_url)
            .finish()
    }
}

/// Backend verdict for a verification request
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct VerificationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl VerificationResult {
    /// Successful verdict carrying a token and user
    #[must_use]
    pub fn accepted(token: &str, user: UserRecord) -> Self {
        Self {
            success: true,
            token: Some(token.to_string()),
            user: Some(user),
            message: None,
        }
    }

    /// In-band rejection with an optional reason
    #[must_use]
    pub fn rejected(message: Option<&str>) -> Self {
        Self {
            success: false,
            token: None,
            user: None,
            message: message.map(ToString::to_string),
        }
    }

    /// Split an accepted verdict into its token and user
    ///
    /// # Errors
    ///
    /// Returns the rejection message when the verdict is negative, or when it
    /// claims success without both a token and a user.
    pub fn into_session_parts(self) -> Result<(String, UserRecord), String> {
        if !self.success {
            return Err(self
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_REJECTION_MESSAGE.to_string()));
        }

        match (self.token, self.user) {
            (Some(token), Some(user)) if !token.is_empty() => Ok((token, user)),
            (token, user) => Err(format!(
                "Backend reported success without a complete session (token: {}, user: {})",
                if token.is_some_and(|t| !t.is_empty()) { "present" } else { "missing" },
                if user.is_some() { "present" } else { "missing" },
            )),
        }
    }
}

/// Message used when the backend rejects without explanation
pub const DEFAULT_REJECTION_MESSAGE: &str = "Backend authentication failed";

/// The persisted unit of an authenticated session
///
/// Stored as two slots (token and serialized user) that are always written
/// and cleared together; see [`crate::store`].
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: UserRecord,
}

impl Session {
    #[must_use]
    pub const fn new(token: String, user: UserRecord) -> Self {
        Self { token, user }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &mask_secret(&self.token))
            .field("user", &self.user)
            .finish()
    }
}
