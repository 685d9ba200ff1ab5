//! Translation of repository addresses between the internal and public namespace.

use thiserror::Error;

/// An address that belongs to neither namespace known to the [`AddressTranslator`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("uri \"{address}\" must start with internal or external baseuri")]
pub struct TranslateError {
    /// The address that could not be translated.
    pub address: String,
}

/// Rewrites addresses handed out by the repository on its private network into addresses that
/// are reachable by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressTranslator {
    external_base: String,
    internal_base: String,
}

impl AddressTranslator {
    pub fn new(external_base: impl Into<String>, internal_base: impl Into<String>) -> Self {
        Self {
            external_base: external_base.into(),
            internal_base: internal_base.into(),
        }
    }

    /// Translates `address` into the public namespace.
    ///
    /// Addresses starting with the external base are already public and returned unchanged,
    /// even if they start with the internal base as well. Otherwise a leading internal base is
    /// replaced by the external base. An empty base never matches.
    pub fn to_public(&self, address: &str) -> Result<String, TranslateError> {
        if strip_base(address, &self.external_base).is_some() {
            return Ok(address.to_owned());
        }

        match strip_base(address, &self.internal_base) {
            Some(rest) if !self.external_base.is_empty() => {
                Ok(format!("{}{rest}", self.external_base))
            }
            _ => Err(TranslateError {
                address: address.to_owned(),
            }),
        }
    }
}

fn strip_base<'a>(address: &'a str, base: &str) -> Option<&'a str> {
    match base {
        "" => None,
        base => address.strip_prefix(base),
    }
}
