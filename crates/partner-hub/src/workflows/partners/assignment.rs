use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::catalog::{CatalogError, ProductCatalog};
use super::domain::{PartnerStatus, PayoutPeriod, ProductCommission};
use super::workflow::ValidationIssue;

/// One requested product with its partner-specific margin addend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAssignment {
    pub product_id: String,
    #[serde(default)]
    pub custom_margin: Decimal,
}

/// Full assignment payload. Applying it replaces the partner's commission
/// terms wholesale; this is deliberately "current state", not history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionAssignment {
    pub products: Vec<ProductAssignment>,
    pub payout_period: PayoutPeriod,
}

/// Statuses in which a tier may still be (re)assigned. Tiering is a
/// precondition for entering L1 review, not a review step itself.
pub const fn tier_assignable(status: PartnerStatus) -> bool {
    matches!(
        status,
        PartnerStatus::Draft | PartnerStatus::MoreInfoNeeded
    )
}

#[derive(Debug, thiserror::Error)]
pub enum AssignmentError {
    #[error(transparent)]
    Validation(#[from] ValidationIssue),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Resolves each requested product against the live catalog and snapshots
/// `base + margin` into the final rate. Rates are copied, not linked: a
/// later catalog change does not reprice existing assignments.
pub fn resolve_products(
    catalog: &dyn ProductCatalog,
    assignment: &CommissionAssignment,
) -> Result<Vec<ProductCommission>, AssignmentError> {
    if assignment.products.is_empty() {
        return Err(ValidationIssue::NoProductsInAssignment.into());
    }

    let mut resolved = Vec::with_capacity(assignment.products.len());
    for item in &assignment.products {
        let product = catalog
            .find(&item.product_id)?
            .ok_or_else(|| ValidationIssue::UnknownProduct(item.product_id.clone()))?;
        resolved.push(ProductCommission {
            product_id: product.id,
            product_name: product.name,
            base_commission_rate: product.base_commission_rate,
            custom_margin: item.custom_margin,
            final_rate: product.base_commission_rate + item.custom_margin,
        });
    }
    Ok(resolved)
}
