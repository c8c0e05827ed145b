use serde::{Deserialize, Serialize};
use std::fmt;

/// Encryption algorithm selected for an encryptor instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// AES-CBC with PKCS#7 padding and an out-of-band IV (no MAC)
    Cbc,
    /// AES-GCM sealed boxes
    #[default]
    Gcm,
    /// ChaCha20-Poly1305 sealed boxes
    #[serde(rename = "chacha20poly1305")]
    ChaCha20Poly1305,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Cbc => write!(f, "cbc"),
            Algorithm::Gcm => write!(f, "gcm"),
            Algorithm::ChaCha20Poly1305 => write!(f, "chacha20poly1305"),
        }
    }
}

/// When a stored key may be read back from the secure store.
///
/// Maps onto platform accessibility classes where the backend supports them;
/// backends without such a notion record it as part of the query only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyAccess {
    /// Readable only while the device is unlocked
    WhenUnlocked,
    /// Readable after the first unlock following a restart
    #[default]
    AfterFirstUnlock,
    /// Like `WhenUnlocked`, never migrated to another device
    WhenUnlockedThisDeviceOnly,
    /// Readable while unlocked, and only if a passcode is set
    WhenPasscodeSetThisDeviceOnly,
    /// Like `AfterFirstUnlock`, never migrated to another device
    AfterFirstUnlockThisDeviceOnly,
}

impl KeyAccess {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyAccess::WhenUnlocked => "when_unlocked",
            KeyAccess::AfterFirstUnlock => "after_first_unlock",
            KeyAccess::WhenUnlockedThisDeviceOnly => "when_unlocked_this_device_only",
            KeyAccess::WhenPasscodeSetThisDeviceOnly => "when_passcode_set_this_device_only",
            KeyAccess::AfterFirstUnlockThisDeviceOnly => "after_first_unlock_this_device_only",
        }
    }
}

impl fmt::Display for KeyAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
