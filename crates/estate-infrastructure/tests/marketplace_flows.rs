//! End-to-end flows over the in-process realtime store.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde_json::json;

use estate_core::domain::{
    AccountProfile, AccountType, Actor, NewProperty, PaymentDetails, PropertyFilter,
    PropertyPaymentRequest, PropertyUpdate, TransactionType, VerificationAction, VerificationState,
};
use estate_core::services::{
    AccountService, ChatService, IdentityService, LedgerService, MockPaymentGateway, PropertyService,
    VerificationService,
};
use estate_core::DomainError;
use estate_infrastructure::{
    AnonymousIdentityProvider, RealtimeStore, TreeAccountRepository, TreeChatRepository,
    TreePropertyRepository, TreeTransactionRepository,
};

struct Marketplace {
    store: Arc<RealtimeStore>,
    accounts: AccountService,
    properties: PropertyService,
    verification: VerificationService,
    chats: ChatService,
    ledger: Arc<LedgerService>,
}

fn marketplace() -> Marketplace {
    let store = Arc::new(RealtimeStore::new(64, Duration::from_millis(500)));
    let property_repo = Arc::new(TreePropertyRepository::new(store.clone()));
    let account_repo = Arc::new(TreeAccountRepository::new(store.clone()));
    let chat_repo = Arc::new(TreeChatRepository::new(store.clone()));
    let tx_repo = Arc::new(TreeTransactionRepository::new(store.clone()));
    let payments = Arc::new(MockPaymentGateway::new("XAF"));
    let ledger = Arc::new(LedgerService::new(tx_repo, property_repo.clone(), payments.clone()));

    Marketplace {
        store,
        accounts: AccountService::new(account_repo.clone()),
        properties: PropertyService::new(property_repo.clone(), ledger.clone(), payments, 1000, 64 * 1024),
        verification: VerificationService::new(property_repo.clone()),
        chats: ChatService::new(chat_repo, account_repo, property_repo),
        ledger,
    }
}

fn actor(id: &str, role: AccountType, name: &str) -> Actor {
    Actor {
        user_id: id.into(),
        account_type: role,
        display_name: Some(name.into()),
        email: None,
    }
}

fn mtn() -> PaymentDetails {
    serde_json::from_value(json!({"method": "mtn", "phoneNumber": "677123456"})).unwrap()
}

fn listing(name: &str) -> NewProperty {
    NewProperty {
        name: name.into(),
        city: "Douala".into(),
        price: Some(250_000),
        ..Default::default()
    }
}

#[tokio::test]
async fn landlord_listing_becomes_visible_after_council_approval() {
    let m = marketplace();
    let landlord = actor("l1", AccountType::Landlord, "Lan");
    let admin = actor("a1", AccountType::Admin, "Ada");
    let council = actor("c1", AccountType::Council, "Council");

    let created = m.properties.create(&landlord, listing("Villa A"), Some(mtn())).await.unwrap();
    assert_eq!(created.verification_state(), VerificationState::Draft);
    assert!(m.properties.tenant_listings().await.unwrap().is_empty());

    m.verification.apply(&landlord, &created.id, VerificationAction::Submit).await.unwrap();
    let queue = m.verification.admin_queue(&admin).await.unwrap();
    assert_eq!(queue.len(), 1);

    m.verification.apply(&admin, &created.id, VerificationAction::Forward).await.unwrap();
    assert!(m.verification.admin_queue(&admin).await.unwrap().is_empty());
    assert_eq!(m.verification.council_queue(&council).await.unwrap().len(), 1);

    let approved = m.verification.apply(&council, &created.id, VerificationAction::Approve).await.unwrap();
    assert_eq!(approved.verification_state(), VerificationState::Verified);

    let visible = m.properties.tenant_listings().await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, created.id);
    assert!(m.verification.council_queue(&council).await.unwrap().is_empty());

    let fees = m.ledger.view(&landlord).await.unwrap();
    assert_eq!(fees.transactions.len(), 1);
    assert_eq!(fees.transactions[0].kind, TransactionType::PlatformFee);
    assert_eq!(fees.transactions[0].amount, 1000);
}

#[tokio::test]
async fn price_update_round_trips_with_a_newer_stamp() {
    let m = marketplace();
    let landlord = actor("l1", AccountType::Landlord, "Lan");
    let created = m.properties.create(&landlord, listing("Villa H"), Some(mtn())).await.unwrap();
    let before = created.updated_at.unwrap_or(created.created_at);

    let patch = PropertyUpdate {
        price: Some(5_000_000),
        ..Default::default()
    };
    m.properties.update(&landlord, &created.id, patch).await.unwrap();

    let stored = m.properties.get(&created.id).await.unwrap();
    assert_eq!(stored.price, 5_000_000);
    assert!(stored.updated_at.unwrap() > before);
    assert_eq!(stored.created_at, created.created_at);
    assert_eq!(stored.name, "Villa H");

    m.properties.delete(&landlord, &created.id).await.unwrap();
    assert!(matches!(
        m.properties.delete(&landlord, &created.id).await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn government_rejection_is_terminal() {
    let m = marketplace();
    let landlord = actor("l1", AccountType::Landlord, "Lan");
    let admin = actor("a1", AccountType::Admin, "Ada");
    let council = actor("c1", AccountType::Council, "Council");

    let p = m.properties.create(&landlord, listing("Villa B"), Some(mtn())).await.unwrap();
    m.verification.apply(&landlord, &p.id, VerificationAction::Submit).await.unwrap();
    m.verification.apply(&admin, &p.id, VerificationAction::Forward).await.unwrap();
    let rejected = m
        .verification
        .apply(&council, &p.id, VerificationAction::GovernmentReject)
        .await
        .unwrap();
    assert_eq!(rejected.verification_state(), VerificationState::RejectedByGovernment);

    assert!(m.verification.admin_queue(&admin).await.unwrap().is_empty());
    assert!(m.verification.council_queue(&council).await.unwrap().is_empty());
    assert!(m.properties.tenant_listings().await.unwrap().is_empty());

    let err = m
        .verification
        .apply(&council, &p.id, VerificationAction::Approve)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidTransition { .. }));
    let err = m
        .verification
        .apply(&landlord, &p.id, VerificationAction::Submit)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidTransition { .. }));
}

#[tokio::test]
async fn admin_can_verify_and_unverify_directly() {
    let m = marketplace();
    let landlord = actor("l1", AccountType::Landlord, "Lan");
    let admin = actor("a1", AccountType::Admin, "Ada");

    let p = m.properties.create(&landlord, listing("Villa D"), Some(mtn())).await.unwrap();
    let err = m
        .verification
        .apply(&landlord, &p.id, VerificationAction::Verify)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::PermissionDenied(_)));

    let verified = m.verification.apply(&admin, &p.id, VerificationAction::Verify).await.unwrap();
    assert!(verified.is_verified);
    assert_eq!(verified.last_modified_by.as_deref(), Some("admin"));
    assert_eq!(m.properties.tenant_listings().await.unwrap().len(), 1);

    let hidden = m.verification.apply(&admin, &p.id, VerificationAction::Unverify).await.unwrap();
    assert!(!hidden.is_verified);
    assert!(hidden.updated_at > verified.updated_at);
    assert!(m.properties.tenant_listings().await.unwrap().is_empty());
}

#[tokio::test]
async fn blank_name_or_city_update_is_refused() {
    let m = marketplace();
    let admin = actor("a1", AccountType::Admin, "Ada");
    let landlord = actor("l1", AccountType::Landlord, "Lan");
    let p = m.properties.create(&landlord, listing("Villa E"), Some(mtn())).await.unwrap();

    let blank = PropertyUpdate {
        name: Some("   ".into()),
        city: Some("  ".into()),
        ..Default::default()
    };
    let err = m.properties.update(&admin, &p.id, blank).await.unwrap_err();
    assert!(matches!(err, DomainError::ValidationFailed(_)));

    let stored = m.properties.get(&p.id).await.unwrap();
    assert_eq!(stored.name, "Villa E");
    assert_eq!(stored.city, "Douala");
}

#[tokio::test]
async fn listings_stored_with_float_prices_stay_visible() {
    let m = marketplace();
    m.store
        .set(
            "properties/legacy1",
            json!({"name": "Old Villa", "city": "Kribi", "price": 25000000.0, "isVerified": true}),
        )
        .await
        .unwrap();

    let visible = m.properties.tenant_listings().await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].price, 25_000_000);
}

#[tokio::test]
async fn concurrent_chat_opens_converge_and_messages_stay_ordered() {
    let m = marketplace();
    let landlord = actor("l1", AccountType::Landlord, "Lan");
    let tenant = actor("t1", AccountType::Tenant, "Tess");
    let p = m.properties.create(&landlord, listing("Villa C"), Some(mtn())).await.unwrap();

    let (a, b) = tokio::join!(
        m.chats.open_or_create(&tenant, &p.id, None),
        m.chats.open_or_create(&tenant, &p.id, None)
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a.id, b.id);
    assert_eq!(a.id, format!("chat_t1_l1_{}", p.id));

    m.chats.send_message(&tenant, &a.id, "  Is it available?  ").await.unwrap();
    m.chats.send_message(&landlord, &a.id, "Yes").await.unwrap();
    m.chats.send_message(&tenant, &a.id, "Great").await.unwrap();

    let messages = m.chats.messages(&landlord, &a.id).await.unwrap();
    let texts: Vec<&str> = messages.iter().map(|msg| msg.text.as_str()).collect();
    assert_eq!(texts, vec!["Is it available?", "Yes", "Great"]);
    assert!(messages.windows(2).all(|w| w[0].timestamp < w[1].timestamp));

    let chats = m.chats.list_chats(&landlord).await.unwrap();
    assert_eq!(chats.len(), 1);
    assert_eq!(chats[0].last_message.as_deref(), Some("Great"));
    assert_eq!(chats[0].tenant_name.as_deref(), Some("Tess"));

    let outsider = actor("t2", AccountType::Tenant, "Other");
    assert!(matches!(
        m.chats.messages(&outsider, &a.id).await,
        Err(DomainError::PermissionDenied(_))
    ));
}

#[tokio::test]
async fn chat_names_follow_profile_changes() {
    let m = marketplace();
    let landlord = actor("l1", AccountType::Landlord, "Lan");
    let tenant = actor("t1", AccountType::Tenant, "Tess");
    let p = m.properties.create(&landlord, listing("Villa D"), Some(mtn())).await.unwrap();
    let chat = m.chats.open_or_create(&tenant, &p.id, None).await.unwrap();

    let profile = AccountProfile {
        display_name: Some("Teresa".into()),
        ..Default::default()
    };
    m.accounts.update_profile(&tenant, profile).await.unwrap();

    let chats = m.chats.list_chats(&landlord).await.unwrap();
    assert_eq!(chats[0].id, chat.id);
    assert_eq!(chats[0].tenant_name.as_deref(), Some("Teresa"));
}

#[tokio::test]
async fn repeated_payment_with_same_key_records_once() {
    let m = marketplace();
    let landlord = actor("l1", AccountType::Landlord, "Lan");
    let admin = actor("a1", AccountType::Admin, "Ada");
    let council = actor("c1", AccountType::Council, "Council");
    let tenant = actor("t1", AccountType::Tenant, "Tess");

    let p = m.properties.create(&landlord, listing("Villa E"), Some(mtn())).await.unwrap();
    m.verification.apply(&landlord, &p.id, VerificationAction::Submit).await.unwrap();
    m.verification.apply(&admin, &p.id, VerificationAction::Forward).await.unwrap();
    m.verification.apply(&council, &p.id, VerificationAction::Approve).await.unwrap();

    let request = || PropertyPaymentRequest {
        property_id: p.id.clone(),
        payment: mtn(),
        phone: None,
        idempotency_key: Some("checkout-1".into()),
    };
    let first = m.ledger.record_property_payment(&tenant, request()).await.unwrap();
    let second = m.ledger.record_property_payment(&tenant, request()).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(first.payment_reference, second.payment_reference);

    let mine = m.ledger.view(&tenant).await.unwrap();
    assert_eq!(mine.transactions.len(), 1);
    assert_eq!(mine.summary.pending, 1);

    let all = m.ledger.view(&admin).await.unwrap();
    assert_eq!(all.transactions.len(), 2);
}

#[tokio::test]
async fn filtered_subscription_tracks_verification() {
    let m = marketplace();
    let landlord = actor("l1", AccountType::Landlord, "Lan");
    let admin = actor("a1", AccountType::Admin, "Ada");

    let mut queue = m
        .verification
        .subscribe_queue(&admin, PropertyFilter::AdminQueue)
        .unwrap();
    assert!(queue.next().await.unwrap().unwrap().is_empty());

    let p = m.properties.create(&landlord, listing("Villa F"), Some(mtn())).await.unwrap();
    m.verification.apply(&landlord, &p.id, VerificationAction::Submit).await.unwrap();

    let mut latest = Vec::new();
    while latest.is_empty() {
        latest = tokio::time::timeout(Duration::from_secs(1), queue.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }
    assert_eq!(latest[0].id, p.id);
}

#[tokio::test]
async fn offline_store_surfaces_unavailable() {
    let m = marketplace();
    let landlord = actor("l1", AccountType::Landlord, "Lan");
    m.store.set_online(false);

    let err = m.properties.create(&landlord, listing("Villa G"), Some(mtn())).await.unwrap_err();
    assert!(matches!(err, DomainError::StoreUnavailable(_)));
    assert!(matches!(
        m.properties.tenant_listings().await,
        Err(DomainError::StoreUnavailable(_))
    ));

    m.store.set_online(true);
    assert!(m.properties.tenant_listings().await.unwrap().is_empty());
}

#[tokio::test]
async fn anonymous_caller_gets_an_account_on_first_profile_save() {
    let store = Arc::new(RealtimeStore::new(16, Duration::from_millis(500)));
    let accounts = Arc::new(TreeAccountRepository::new(store.clone()));
    let provider = Arc::new(AnonymousIdentityProvider::new("secret".into(), 3600));
    let identity = IdentityService::new(provider, accounts.clone(), Duration::from_millis(500));
    let account_service = AccountService::new(accounts);

    let caller = identity.resolve_caller(None).await.unwrap();
    let token = caller.issued_token.clone().unwrap();
    assert_eq!(caller.actor.account_type, AccountType::Tenant);

    let profile = AccountProfile {
        username: Some("lan".into()),
        account_type: Some(AccountType::Landlord),
        ..Default::default()
    };
    account_service.update_profile(&caller.actor, profile).await.unwrap();

    let again = identity.resolve_caller(Some(&token)).await.unwrap();
    assert_eq!(again.actor.user_id, caller.actor.user_id);
    assert_eq!(again.actor.account_type, AccountType::Landlord);
    assert!(again.issued_token.is_none());
}
