use clap::Args;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::infra::{
    InMemoryDocumentVault, InMemoryNotificationPublisher, InMemoryPartnerRepository,
    StaticProductCatalog,
};
use partner_hub::error::AppError;
use partner_hub::workflows::partners::{
    Actor, CommissionAssignment, ContactPerson, DocumentKind, DocumentUpload, PartnerProfile,
    PartnerRecord, PartnerRegistration, PartnerService, PartnerTier, PayoutPeriod,
    ProductAssignment, ProfileUpdate, Role,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Skip the L2 rejection and resubmission detour
    #[arg(long)]
    pub(crate) skip_rejection: bool,
}

fn demo_registration() -> PartnerRegistration {
    PartnerRegistration {
        profile: PartnerProfile {
            company_name: "Prairie Peak Networks".to_string(),
            business_type: "Regional reseller".to_string(),
            tax_id: "42-5550123".to_string(),
            years_in_business: 8,
            employee_count: 63,
            expected_monthly_volume: 40_000,
            business_address: "77 Summit Ave, Ames, IA".to_string(),
            website: Some("https://prairiepeak.example".to_string()),
            contact: ContactPerson {
                name: "Jordan Vale".to_string(),
                email: "jordan@prairiepeak.example".to_string(),
                phone: "+1-515-555-0186".to_string(),
                designation: "VP Channel".to_string(),
            },
        },
        tier: None,
    }
}

fn actor(id: &str, name: &str, role: Role) -> Actor {
    Actor {
        id: id.to_string(),
        name: name.to_string(),
        role,
    }
}

fn print_status(label: &str, record: &PartnerRecord) {
    let view = record.status_view();
    println!(
        "  [{label}] status={} tier={} progress={}% steps={}",
        view.status,
        view.tier.unwrap_or("-"),
        view.onboarding_progress,
        view.workflow_steps,
    );
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let repository = Arc::new(InMemoryPartnerRepository::default());
    let notifications = Arc::new(InMemoryNotificationPublisher::default());
    let service = PartnerService::new(
        repository,
        notifications.clone(),
        Arc::new(StaticProductCatalog::default()),
        Arc::new(InMemoryDocumentVault::default()),
    );

    let manager = actor("usr-demo-mgr", "Mel Manager", Role::PartnerManager);
    let l1 = actor("usr-demo-l1", "Lena Levelone", Role::L1Approver);
    let l2 = actor("usr-demo-l2", "Leo Leveltwo", Role::L2Approver);

    println!("Partner onboarding demo");

    let record = service
        .self_register(demo_registration())?;
    let owner = actor(
        record.owner_user_id.as_deref().unwrap_or_default(),
        "Jordan Vale",
        Role::Partner,
    );
    println!("\nSelf-registration");
    print_status("registered", &record);

    println!("\nPaperwork");
    for (kind, name) in [
        (DocumentKind::BusinessLicense, "business-license.pdf"),
        (DocumentKind::BankStatement, "bank-statement.pdf"),
    ] {
        let updated = service
            .upload_document(
                &owner,
                &record.id,
                DocumentUpload {
                    document_type: kind,
                    document_name: name.to_string(),
                    document_data: "b3BhcXVlLWJsb2I=".to_string(),
                },
                None,
            )?;
        print_status(name, &updated);
    }

    println!("\nReview and tiering");
    let tiered = service
        .assign_tier(&manager, &record.id, PartnerTier::Silver, None)?;
    print_status("tier assigned", &tiered);
    let sent = service
        .send_to_l1(&manager, &record.id, None)?;
    print_status("sent to L1", &sent);

    println!("\nLevel 1 review");
    let l1_done = service
        .approve_l1(&l1, &record.id, Some("financials verified".to_string()), None)?;
    print_status("L1 approved", &l1_done);

    if !args.skip_rejection {
        println!("\nLevel 2 review (first pass)");
        let rejected = service
            .reject_l2(
                &l2,
                &record.id,
                "bank statement older than 90 days".to_string(),
                None,
                None,
            )?;
        print_status("L2 rejected", &rejected);
        if let Some(rejection) = &rejected.rejection {
            println!("  reason: {}", rejection.reason);
        }

        println!("\nResubmission");
        let resubmitted = service
            .resubmit(&owner, &record.id, ProfileUpdate::default(), None)?;
        print_status("resubmitted", &resubmitted);
        let l1_again = service
            .approve_l1(&l1, &record.id, Some("fresh statement on file".to_string()), None)?;
        print_status("L1 approved again", &l1_again);
    }

    println!("\nLevel 2 review (final)");
    let approved = service
        .approve_l2(&l2, &record.id, Some("welcome aboard".to_string()), None)?;
    print_status("L2 approved", &approved);

    println!("\nCommission assignment");
    let assigned = service
        .assign_products(
            &manager,
            &record.id,
            CommissionAssignment {
                products: vec![
                    ProductAssignment {
                        product_id: "FW-100".to_string(),
                        custom_margin: Decimal::new(2, 0),
                    },
                    ProductAssignment {
                        product_id: "BK-210".to_string(),
                        custom_margin: Decimal::new(5, 1),
                    },
                ],
                payout_period: PayoutPeriod::Monthly,
            },
            None,
        )?;
    print_status("products assigned", &assigned);
    for terms in &assigned.assigned_products {
        println!(
            "  {}: base {}% + margin {}% = {}%",
            terms.product_name, terms.base_commission_rate, terms.custom_margin, terms.final_rate,
        );
    }
    if let Some(period) = assigned.payout_period {
        println!("  payout period: {}", period.label());
    }

    println!("\nNotifications dispatched");
    for event in notifications.events() {
        println!("  {} -> {}", event.template, event.partner_id.0);
    }

    Ok(())
}
