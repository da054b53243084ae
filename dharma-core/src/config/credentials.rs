//! Access-point credentials for the configuration server
//!
//! Credentials are validated as a whole before they replace the current
//! ones, so a half-applied SSID/password pair can never be persisted.

use heapless::String;
use serde::{Deserialize, Serialize};

/// Maximum SSID length in bytes
pub const MAX_SSID_LEN: usize = 32;

/// Maximum WPA2 passphrase length in bytes
pub const MAX_PASSWORD_LEN: usize = 63;

/// Minimum WPA2 passphrase length in bytes
const MIN_PASSWORD_LEN: usize = 8;

/// Default access point name
const DEFAULT_SSID: &str = "Dharma Counter";

/// Credential validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CredentialsError {
    /// SSID is empty
    EmptySsid,
    /// SSID longer than 32 bytes
    SsidTooLong,
    /// Password shorter than 8 or longer than 63 bytes
    InvalidPasswordLength,
}

/// Access point name and password
///
/// An empty password means an open network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ApCredentials {
    ssid: String<MAX_SSID_LEN>,
    password: String<MAX_PASSWORD_LEN>,
}

impl Default for ApCredentials {
    fn default() -> Self {
        let mut ssid = String::new();
        let _ = ssid.push_str(DEFAULT_SSID);
        Self {
            ssid,
            password: String::new(),
        }
    }
}

impl ApCredentials {
    /// Validate and build a credential pair
    pub fn new(ssid: &str, password: &str) -> Result<Self, CredentialsError> {
        if ssid.is_empty() {
            return Err(CredentialsError::EmptySsid);
        }
        if !password.is_empty()
            && !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&password.len())
        {
            return Err(CredentialsError::InvalidPasswordLength);
        }

        let mut stored_ssid = String::new();
        stored_ssid
            .push_str(ssid)
            .map_err(|_| CredentialsError::SsidTooLong)?;
        let mut stored_password = String::new();
        stored_password
            .push_str(password)
            .map_err(|_| CredentialsError::InvalidPasswordLength)?;

        Ok(Self {
            ssid: stored_ssid,
            password: stored_password,
        })
    }

    /// Access point name
    pub fn ssid(&self) -> &str {
        self.ssid.as_str()
    }

    /// Passphrase, empty for an open network
    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    /// Check if the network is open
    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_open_network() {
        let creds = ApCredentials::default();
        assert_eq!(creds.ssid(), "Dharma Counter");
        assert!(creds.is_open());
    }

    #[test]
    fn test_valid_credentials() {
        let creds = ApCredentials::new("Retreat", "om mani padme").unwrap();
        assert_eq!(creds.ssid(), "Retreat");
        assert_eq!(creds.password(), "om mani padme");
        assert!(!creds.is_open());
    }

    #[test]
    fn test_rejects_bad_credentials() {
        assert_eq!(ApCredentials::new("", ""), Err(CredentialsError::EmptySsid));
        assert_eq!(
            ApCredentials::new("x", "short"),
            Err(CredentialsError::InvalidPasswordLength)
        );
        let long_ssid = "s".repeat(33);
        assert_eq!(
            ApCredentials::new(&long_ssid, ""),
            Err(CredentialsError::SsidTooLong)
        );
        let long_password = "p".repeat(64);
        assert_eq!(
            ApCredentials::new("x", &long_password),
            Err(CredentialsError::InvalidPasswordLength)
        );
    }
}
