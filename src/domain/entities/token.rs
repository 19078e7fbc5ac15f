//! Discord authentication token value object.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Authentication token sent in the `Authorization` header.
///
/// The secret is wiped from memory on drop and never printed in full.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AuthToken {
    value: String,
}

impl AuthToken {
    const MIN_TOKEN_LENGTH: usize = 50;

    /// Parses a token, rejecting values that cannot be a Discord token.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();

        if value.len() < Self::MIN_TOKEN_LENGTH || value.split('.').count() != 3 {
            return None;
        }

        Some(Self {
            value: value.to_string(),
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Returns masked token for logs and error output.
    #[must_use]
    pub fn masked(&self) -> String {
        if self.value.len() <= 10 {
            return "*".repeat(self.value.len());
        }

        let prefix = &self.value[..4];
        let suffix = &self.value[self.value.len() - 4..];
        format!("{prefix}...{suffix}")
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AuthToken").field(&self.masked()).finish()
    }
}

impl fmt::Display for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}
