use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Catalog row as seen by the assignment service. The product store is an
/// external collaborator; only the fields copied into commission snapshots
/// are modeled here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: String,
    pub name: String,
    pub base_commission_rate: Decimal,
}

/// Read-side abstraction over the product catalog.
pub trait ProductCatalog: Send + Sync {
    fn find(&self, product_id: &str) -> Result<Option<CatalogProduct>, CatalogError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("product catalog unavailable: {0}")]
    Unavailable(String),
}
