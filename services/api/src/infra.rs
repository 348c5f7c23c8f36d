use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

use partner_hub::workflows::partners::{
    CatalogError, CatalogProduct, DocumentVault, NotificationError, NotificationPublisher,
    PartnerId, PartnerNotification, PartnerRecord, PartnerRepository, PartnerStatus,
    ProductCatalog, RepositoryError, VaultError,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryPartnerRepository {
    records: Arc<Mutex<HashMap<PartnerId, PartnerRecord>>>,
}

impl PartnerRepository for InMemoryPartnerRepository {
    fn insert(&self, record: PartnerRecord) -> Result<PartnerRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(
        &self,
        mut record: PartnerRecord,
        expected_version: u64,
    ) -> Result<PartnerRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let stored = guard.get(&record.id).ok_or(RepositoryError::NotFound)?;
        if stored.version != expected_version {
            return Err(RepositoryError::VersionConflict {
                expected: expected_version,
                found: stored.version,
            });
        }
        record.version = expected_version + 1;
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &PartnerId) -> Result<Option<PartnerRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn by_status(&self, status: PartnerStatus) -> Result<Vec<PartnerRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| record.status == status)
            .cloned()
            .collect())
    }

    fn owned_by(&self, user_id: &str) -> Result<Vec<PartnerRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| record.owner_user_id.as_deref() == Some(user_id))
            .cloned()
            .collect())
    }

    fn all(&self) -> Result<Vec<PartnerRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

/// Logs notifications and keeps them for inspection. A production deployment
/// swaps this for an e-mail or webhook adapter.
#[derive(Default, Clone)]
pub(crate) struct InMemoryNotificationPublisher {
    events: Arc<Mutex<Vec<PartnerNotification>>>,
}

impl NotificationPublisher for InMemoryNotificationPublisher {
    fn publish(&self, notification: PartnerNotification) -> Result<(), NotificationError> {
        info!(
            template = %notification.template,
            partner = %notification.partner_id.0,
            "partner notification"
        );
        let mut guard = self.events.lock().expect("notification mutex poisoned");
        guard.push(notification);
        Ok(())
    }
}

impl InMemoryNotificationPublisher {
    pub(crate) fn events(&self) -> Vec<PartnerNotification> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

/// Seeded stand-in for the product catalog service.
pub(crate) struct StaticProductCatalog {
    products: HashMap<String, CatalogProduct>,
}

impl Default for StaticProductCatalog {
    fn default() -> Self {
        let mut products = HashMap::new();
        for (id, name, rate, scale) in [
            ("FW-100", "Perimeter Firewall", 5, 0),
            ("BK-210", "Backup Suite", 35, 1),
            ("VC-320", "Voice Connect", 4, 0),
        ] {
            products.insert(
                id.to_string(),
                CatalogProduct {
                    id: id.to_string(),
                    name: name.to_string(),
                    base_commission_rate: Decimal::new(rate, scale),
                },
            );
        }
        Self { products }
    }
}

impl ProductCatalog for StaticProductCatalog {
    fn find(&self, product_id: &str) -> Result<Option<CatalogProduct>, CatalogError> {
        Ok(self.products.get(product_id).cloned())
    }
}

/// Keeps uploaded blobs in memory and hands back stable references.
#[derive(Default)]
pub(crate) struct InMemoryDocumentVault {
    blobs: Arc<Mutex<Vec<String>>>,
}

impl DocumentVault for InMemoryDocumentVault {
    fn store(
        &self,
        partner_id: &PartnerId,
        document_name: &str,
        payload: &str,
    ) -> Result<String, VaultError> {
        let mut guard = self.blobs.lock().expect("vault mutex poisoned");
        guard.push(payload.to_string());
        Ok(format!(
            "vault://partners/{}/{}/{}",
            partner_id.0,
            guard.len(),
            document_name
        ))
    }
}
