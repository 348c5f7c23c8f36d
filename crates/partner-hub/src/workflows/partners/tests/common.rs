use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;

use crate::workflows::partners::catalog::{CatalogError, CatalogProduct, ProductCatalog};
use crate::workflows::partners::domain::{
    Actor, ContactPerson, PartnerId, PartnerProfile, PartnerRegistration, PartnerStatus,
    PartnerTier, Role,
};
use crate::workflows::partners::ledger::{DocumentVault, VaultError};
use crate::workflows::partners::repository::{
    NotificationError, NotificationPublisher, PartnerNotification, PartnerRecord,
    PartnerRepository, RepositoryError,
};
use crate::workflows::partners::service::PartnerService;

pub(super) fn admin() -> Actor {
    Actor {
        id: "usr-admin".to_string(),
        name: "Ada Admin".to_string(),
        role: Role::Admin,
    }
}

pub(super) fn manager() -> Actor {
    Actor {
        id: "usr-manager".to_string(),
        name: "Mel Manager".to_string(),
        role: Role::PartnerManager,
    }
}

pub(super) fn l1_approver() -> Actor {
    Actor {
        id: "usr-l1".to_string(),
        name: "Lena Levelone".to_string(),
        role: Role::L1Approver,
    }
}

pub(super) fn l2_approver() -> Actor {
    Actor {
        id: "usr-l2".to_string(),
        name: "Leo Leveltwo".to_string(),
        role: Role::L2Approver,
    }
}

pub(super) fn rep() -> Actor {
    Actor {
        id: "usr-rep".to_string(),
        name: "Rita Rep".to_string(),
        role: Role::Rep,
    }
}

pub(super) fn partner_actor(owner_id: &str) -> Actor {
    Actor {
        id: owner_id.to_string(),
        name: "Pat Partner".to_string(),
        role: Role::Partner,
    }
}

pub(super) fn registration() -> PartnerRegistration {
    PartnerRegistration {
        profile: PartnerProfile {
            company_name: "Northwind Integrations".to_string(),
            business_type: "Value-added reseller".to_string(),
            tax_id: "87-1234567".to_string(),
            years_in_business: 6,
            employee_count: 42,
            expected_monthly_volume: 25_000,
            business_address: "400 Commerce Way, Des Moines, IA".to_string(),
            website: Some("https://northwind.example".to_string()),
            contact: ContactPerson {
                name: "Pat Partner".to_string(),
                email: "pat@northwind.example".to_string(),
                phone: "+1-515-555-0142".to_string(),
                designation: "Channel Director".to_string(),
            },
        },
        tier: None,
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<PartnerId, PartnerRecord>>>,
}

impl PartnerRepository for MemoryRepository {
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

#[derive(Default, Clone)]
pub(super) struct MemoryNotifications {
    events: Arc<Mutex<Vec<PartnerNotification>>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<PartnerNotification> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

impl NotificationPublisher for MemoryNotifications {
    fn publish(&self, notification: PartnerNotification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) struct StaticCatalog {
    products: HashMap<String, CatalogProduct>,
}

impl Default for StaticCatalog {
    fn default() -> Self {
        let mut products = HashMap::new();
        products.insert(
            "P1".to_string(),
            CatalogProduct {
                id: "P1".to_string(),
                name: "Managed Firewall".to_string(),
                base_commission_rate: Decimal::new(5, 0),
            },
        );
        products.insert(
            "P2".to_string(),
            CatalogProduct {
                id: "P2".to_string(),
                name: "Backup Suite".to_string(),
                base_commission_rate: Decimal::new(35, 1),
            },
        );
        Self { products }
    }
}

impl ProductCatalog for StaticCatalog {
    fn find(&self, product_id: &str) -> Result<Option<CatalogProduct>, CatalogError> {
        Ok(self.products.get(product_id).cloned())
    }
}

#[derive(Default)]
pub(super) struct MemoryVault {
    pub(super) blobs: Arc<Mutex<Vec<(PartnerId, String)>>>,
}

impl DocumentVault for MemoryVault {
    fn store(
        &self,
        partner_id: &PartnerId,
        document_name: &str,
        _payload: &str,
    ) -> Result<String, VaultError> {
        let mut guard = self.blobs.lock().expect("vault mutex poisoned");
        guard.push((partner_id.clone(), document_name.to_string()));
        Ok(format!("vault://{}/{}", partner_id.0, guard.len()))
    }
}

pub(super) struct FailingVault;

impl DocumentVault for FailingVault {
    fn store(&self, _: &PartnerId, _: &str, _: &str) -> Result<String, VaultError> {
        Err(VaultError::Storage("blob store offline".to_string()))
    }
}

pub(super) type TestService = PartnerService<MemoryRepository, MemoryNotifications>;

pub(super) fn build_service() -> (TestService, Arc<MemoryRepository>, Arc<MemoryNotifications>) {
    let repository = Arc::new(MemoryRepository::default());
    let notifications = Arc::new(MemoryNotifications::default());
    let service = PartnerService::new(
        repository.clone(),
        notifications.clone(),
        Arc::new(StaticCatalog::default()),
        Arc::new(MemoryVault::default()),
    );
    (service, repository, notifications)
}

pub(super) fn build_service_with_vault(
    vault: Arc<dyn DocumentVault>,
) -> (TestService, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let notifications = Arc::new(MemoryNotifications::default());
    let service = PartnerService::new(
        repository.clone(),
        notifications,
        Arc::new(StaticCatalog::default()),
        vault,
    );
    (service, repository)
}

/// Draft partner created by the admin, no tier yet.
pub(super) fn draft_partner(service: &TestService) -> PartnerRecord {
    service
        .create_by_manager(&admin(), registration())
        .expect("partner creation succeeds")
}

/// Draft partner that self-registered, so it carries an owning user id.
pub(super) fn self_registered_partner(service: &TestService) -> PartnerRecord {
    service
        .self_register(registration())
        .expect("self-registration succeeds")
}

/// Partner advanced into the L1 queue.
pub(super) fn pending_l1_partner(service: &TestService) -> PartnerRecord {
    let record = draft_partner(service);
    service
        .assign_tier(&manager(), &record.id, PartnerTier::Silver, None)
        .expect("tier assignment succeeds");
    service
        .send_to_l1(&manager(), &record.id, None)
        .expect("send to L1 succeeds")
}

/// Partner advanced past L1 into the L2 queue.
pub(super) fn pending_l2_partner(service: &TestService) -> PartnerRecord {
    let record = pending_l1_partner(service);
    service
        .approve_l1(&l1_approver(), &record.id, Some("dossier complete".to_string()), None)
        .expect("L1 approval succeeds")
}

/// Fully approved partner, ready for commission assignment.
pub(super) fn approved_partner(service: &TestService) -> PartnerRecord {
    let record = pending_l2_partner(service);
    service
        .approve_l2(&l2_approver(), &record.id, None, None)
        .expect("L2 approval succeeds")
}
