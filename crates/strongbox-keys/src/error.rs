use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("failed to fetch key {service}/{account}: {reason}")]
    Fetch {
        service: String,
        account: String,
        reason: String,
    },

    #[error("failed to store key {service}/{account}: {reason}")]
    Store {
        service: String,
        account: String,
        reason: String,
    },

    #[error("stored key material has invalid length: {len} bytes")]
    InvalidKeyMaterial { len: usize },
}
