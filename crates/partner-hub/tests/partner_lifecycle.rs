//! Integration specifications for the partner onboarding and approval
//! workflow.
//!
//! Scenarios exercise end-to-end behavior through the public service facade
//! and HTTP router so the state machine, capability gate, and assignment
//! logic are validated without reaching into private modules.

mod common {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use rust_decimal::Decimal;

    use partner_hub::workflows::partners::{
        Actor, CatalogError, CatalogProduct, ContactPerson, DocumentVault, NotificationError,
        NotificationPublisher, PartnerId, PartnerNotification, PartnerProfile, PartnerRecord,
        PartnerRegistration, PartnerRepository, PartnerService, PartnerStatus, ProductCatalog,
        RepositoryError, Role, VaultError,
    };

    pub(super) fn registration() -> PartnerRegistration {
        PartnerRegistration {
            profile: PartnerProfile {
                company_name: "Cedar Rapids Connectivity".to_string(),
                business_type: "Managed service provider".to_string(),
                tax_id: "42-7654321".to_string(),
                years_in_business: 11,
                employee_count: 87,
                expected_monthly_volume: 60_000,
                business_address: "12 Loop Drive, Cedar Rapids, IA".to_string(),
                website: None,
                contact: ContactPerson {
                    name: "Casey Chann".to_string(),
                    email: "casey@crconnect.example".to_string(),
                    phone: "+1-319-555-0199".to_string(),
                    designation: "COO".to_string(),
                },
            },
            tier: None,
        }
    }

    pub(super) fn actor(id: &str, role: Role) -> Actor {
        Actor {
            id: id.to_string(),
            name: id.to_string(),
            role,
        }
    }

    #[derive(Default, Clone)]
    pub(super) struct MemoryRepository {
        records: Arc<Mutex<HashMap<PartnerId, PartnerRecord>>>,
    }

    impl PartnerRepository for MemoryRepository {
        fn insert(&self, record: PartnerRecord) -> Result<PartnerRecord, RepositoryError> {
            let mut guard = self.records.lock().expect("lock");
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
            let mut guard = self.records.lock().expect("lock");
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
            let guard = self.records.lock().expect("lock");
            Ok(guard.get(id).cloned())
        }

        fn by_status(&self, status: PartnerStatus) -> Result<Vec<PartnerRecord>, RepositoryError> {
            let guard = self.records.lock().expect("lock");
            Ok(guard
                .values()
                .filter(|record| record.status == status)
                .cloned()
                .collect())
        }

        fn owned_by(&self, user_id: &str) -> Result<Vec<PartnerRecord>, RepositoryError> {
            let guard = self.records.lock().expect("lock");
            Ok(guard
                .values()
                .filter(|record| record.owner_user_id.as_deref() == Some(user_id))
                .cloned()
                .collect())
        }

        fn all(&self) -> Result<Vec<PartnerRecord>, RepositoryError> {
            let guard = self.records.lock().expect("lock");
            Ok(guard.values().cloned().collect())
        }
    }

    #[derive(Default, Clone)]
    pub(super) struct MemoryNotifications {
        events: Arc<Mutex<Vec<PartnerNotification>>>,
    }

    impl MemoryNotifications {
        pub(super) fn events(&self) -> Vec<PartnerNotification> {
            self.events.lock().expect("lock").clone()
        }
    }

    impl NotificationPublisher for MemoryNotifications {
        fn publish(&self, notification: PartnerNotification) -> Result<(), NotificationError> {
            self.events.lock().expect("lock").push(notification);
            Ok(())
        }
    }

    pub(super) struct StaticCatalog;

    impl ProductCatalog for StaticCatalog {
        fn find(&self, product_id: &str) -> Result<Option<CatalogProduct>, CatalogError> {
            match product_id {
                "FW-100" => Ok(Some(CatalogProduct {
                    id: "FW-100".to_string(),
                    name: "Perimeter Firewall".to_string(),
                    base_commission_rate: Decimal::new(5, 0),
                })),
                _ => Ok(None),
            }
        }
    }

    pub(super) struct MemoryVault;

    impl DocumentVault for MemoryVault {
        fn store(
            &self,
            partner_id: &PartnerId,
            document_name: &str,
            _payload: &str,
        ) -> Result<String, VaultError> {
            Ok(format!("vault://{}/{}", partner_id.0, document_name))
        }
    }

    pub(super) fn build_service() -> (
        PartnerService<MemoryRepository, MemoryNotifications>,
        Arc<MemoryRepository>,
        Arc<MemoryNotifications>,
    ) {
        let repository = Arc::new(MemoryRepository::default());
        let notifications = Arc::new(MemoryNotifications::default());
        let service = PartnerService::new(
            repository.clone(),
            notifications.clone(),
            Arc::new(StaticCatalog),
            Arc::new(MemoryVault),
        );
        (service, repository, notifications)
    }
}

mod lifecycle {
    use super::common::*;
    use partner_hub::workflows::partners::{
        CommissionAssignment, DocumentKind, DocumentUpload, PartnerStatus, PartnerTier,
        PayoutPeriod, ProductAssignment, Role, StepStatus,
    };
    use rust_decimal::Decimal;

    #[test]
    fn managed_partner_reaches_approved_with_commission_terms() {
        let (service, _, notifications) = build_service();
        let manager = actor("mgr-1", Role::PartnerManager);
        let l1 = actor("l1-1", Role::L1Approver);
        let l2 = actor("l2-1", Role::L2Approver);

        let record = service
            .create_by_manager(&manager, registration())
            .expect("creation succeeds");
        assert_eq!(record.status, PartnerStatus::Draft);

        for (kind, name) in [
            (DocumentKind::BusinessLicense, "license.pdf"),
            (DocumentKind::BankStatement, "statement.pdf"),
        ] {
            service
                .upload_document(
                    &manager,
                    &record.id,
                    DocumentUpload {
                        document_type: kind,
                        document_name: name.to_string(),
                        document_data: "b3BhcXVl".to_string(),
                    },
                    None,
                )
                .expect("upload succeeds");
        }

        service
            .assign_tier(&manager, &record.id, PartnerTier::Gold, None)
            .expect("tier assigned");
        service
            .send_to_l1(&manager, &record.id, None)
            .expect("sent to L1");
        service
            .approve_l1(&l1, &record.id, Some("financials verified".to_string()), None)
            .expect("L1 approves");
        let approved = service
            .approve_l2(&l2, &record.id, None, None)
            .expect("L2 approves");

        assert_eq!(approved.status, PartnerStatus::Approved);
        assert_eq!(approved.approval_workflow.len(), 2);
        assert!(approved
            .approval_workflow
            .iter()
            .all(|step| step.status == StepStatus::Approved));

        let terms = service
            .assign_products(
                &manager,
                &record.id,
                CommissionAssignment {
                    products: vec![ProductAssignment {
                        product_id: "FW-100".to_string(),
                        custom_margin: Decimal::new(25, 1),
                    }],
                    payout_period: PayoutPeriod::Monthly,
                },
                None,
            )
            .expect("commission assigned");

        assert_eq!(terms.assigned_products[0].final_rate, Decimal::new(75, 1));
        assert_eq!(terms.onboarding_progress, 100);

        let approvals: Vec<_> = notifications
            .events()
            .into_iter()
            .filter(|event| event.template == "partner_approved")
            .collect();
        assert_eq!(approvals.len(), 1);
    }
}

mod resubmission {
    use super::common::*;
    use partner_hub::workflows::partners::{
        PartnerStatus, PartnerTier, ProfileUpdate, Role,
    };

    #[test]
    fn self_registered_partner_survives_a_rejection_loop() {
        let (service, _, _) = build_service();
        let manager = actor("mgr-1", Role::PartnerManager);
        let l1 = actor("l1-1", Role::L1Approver);

        let record = service
            .self_register(registration())
            .expect("self-registration succeeds");
        let owner = actor(
            record.owner_user_id.as_deref().expect("owner id"),
            Role::Partner,
        );

        service
            .assign_tier(&manager, &record.id, PartnerTier::Bronze, None)
            .expect("tier assigned");
        service
            .send_to_l1(&manager, &record.id, None)
            .expect("sent to L1");
        service
            .reject_l1(&l1, &record.id, "tax id does not match registry".to_string(), None, None)
            .expect("L1 rejects");

        let corrected = ProfileUpdate {
            tax_id: Some("42-0000001".to_string()),
            ..Default::default()
        };
        let resubmitted = service
            .resubmit(&owner, &record.id, corrected, None)
            .expect("owner resubmits");

        assert_eq!(resubmitted.status, PartnerStatus::PendingL1);
        assert_eq!(resubmitted.profile.tax_id, "42-0000001");
        assert_eq!(resubmitted.rejection_count, 1);
        assert_eq!(resubmitted.approval_workflow.len(), 2);

        let approved_l1 = service
            .approve_l1(&l1, &record.id, None, None)
            .expect("second attempt clears L1");
        assert_eq!(approved_l1.status, PartnerStatus::PendingL2);
        assert_eq!(approved_l1.approval_workflow.len(), 3);
    }
}

mod routing {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::common::*;
    use partner_hub::workflows::partners::{partner_router, Role};

    #[tokio::test]
    async fn self_registration_and_queue_listing_over_http() {
        let (service, _, _) = build_service();
        let service = Arc::new(service);
        let router = partner_router(service.clone());

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/partners/self-register")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::to_vec(&registration()).expect("serialize"),
                    ))
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let payload: Value = serde_json::from_slice(&body).expect("json");
        let partner_id = payload
            .get("partner_id")
            .and_then(Value::as_str)
            .expect("partner id")
            .to_string();

        let manager = actor("mgr-1", Role::PartnerManager);
        service
            .assign_tier(
                &manager,
                &partner_hub::workflows::partners::PartnerId(partner_id.clone()),
                partner_hub::workflows::partners::PartnerTier::Silver,
                None,
            )
            .expect("tier assigned");
        service
            .send_to_l1(
                &manager,
                &partner_hub::workflows::partners::PartnerId(partner_id.clone()),
                None,
            )
            .expect("sent to L1");

        let queue_request = Request::builder()
            .method("GET")
            .uri("/api/v1/partners/l1-queue")
            .header("x-actor-id", "l1-1")
            .header("x-actor-name", "Lena")
            .header("x-actor-role", "l1_approver")
            .body(Body::empty())
            .expect("request");
        let response = router
            .oneshot(queue_request)
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let queue: Value = serde_json::from_slice(&body).expect("json");
        let rows = queue.as_array().expect("array");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("partner_id"), Some(&json!(partner_id)));
        assert_eq!(rows[0].get("status"), Some(&json!("pending_l1")));
    }
}
