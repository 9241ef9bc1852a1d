//! AWS credential bundle owned by the context
//!
//! Credentials are constructed as a unit, never partially mutated, and wiped
//! on drop. Rotation replaces the whole bundle: the old one is destroyed
//! together with the client connection bound to it.

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

/// An owned {access key id, secret access key, session token} triple.
///
/// All three fields are secret and fixed at construction. Equality is
/// constant-time over the concatenated fields.
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: String,
}

impl Credentials {
    /// Creates a credential bundle from the given triple
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: session_token.into(),
        }
    }

    /// Returns the access key id
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Returns the secret access key
    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    /// Returns the session token
    pub fn session_token(&self) -> &str {
        &self.session_token
    }

    /// Returns true if any field of the triple is empty
    pub fn has_empty_field(&self) -> bool {
        self.access_key_id.is_empty()
            || self.secret_access_key.is_empty()
            || self.session_token.is_empty()
    }

    // Zeroize on String wipes the full capacity and truncates to empty.
    fn wipe(&mut self) {
        self.access_key_id.zeroize();
        self.secret_access_key.zeroize();
        self.session_token.zeroize();
    }
}

impl Drop for Credentials {
    fn drop(&mut self) {
        self.wipe();
    }
}

impl PartialEq for Credentials {
    fn eq(&self, other: &Self) -> bool {
        // Constant-time per field; combine without short-circuiting.
        let id = self
            .access_key_id
            .as_bytes()
            .ct_eq(other.access_key_id.as_bytes());
        let secret = self
            .secret_access_key
            .as_bytes()
            .ct_eq(other.secret_access_key.as_bytes());
        let token = self
            .session_token
            .as_bytes()
            .ct_eq(other.session_token.as_bytes());

        (id & secret & token).into()
    }
}

impl Eq for Credentials {}

impl fmt::Debug for Credentials {
    // Never render the secret fields.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &"<redacted>")
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .finish()
    }
}
