//! macOS Keychain credential store.
//!
//! Claude Code stores its OAuth payload as a generic password under the
//! service name "Claude Code-credentials" with an empty account name.

use security_framework::passwords::get_generic_password;

use super::CredentialStore;
use crate::error::CredentialError;

/// [`CredentialStore`] backed by the login Keychain.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeychainStore;

impl CredentialStore for KeychainStore {
    fn lookup(&self, service: &str) -> Result<Vec<u8>, CredentialError> {
        // Any Keychain failure (missing item, locked keychain, denied access)
        // means there is nothing we can use.
        get_generic_password(service, "").map_err(|_| CredentialError::NotFound)
    }
}
