use serde::{Deserialize, Serialize};

use super::domain::{DocumentKind, PartnerId};

/// Upload payload. `document_data` is opaque to the engine; it is handed to
/// the vault verbatim and only the returned reference is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUpload {
    pub document_type: DocumentKind,
    pub document_name: String,
    pub document_data: String,
}

/// External blob store. Implementations must only return once the payload
/// is durable: the ledger appends metadata strictly after `store` succeeds,
/// so a vault failure can never leave a partner claiming a document that
/// does not exist.
pub trait DocumentVault: Send + Sync {
    fn store(
        &self,
        partner_id: &PartnerId,
        document_name: &str,
        payload: &str,
    ) -> Result<String, VaultError>;
}

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("document storage failed: {0}")]
    Storage(String),
}
