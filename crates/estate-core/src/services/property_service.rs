// ============================================================================
// Estate Core - Property Service
// File: crates/estate-core/src/services/property_service.rs
// ============================================================================
//! Listing lifecycle: create (with the platform fee), edit, delete, and the
//! filtered views.

use std::sync::Arc;

use estate_shared::utils::is_valid_key_segment;
use estate_shared::EntityId;
use futures::StreamExt;
use tracing::{debug, error, info, warn};

use crate::domain::{
    sanitize_inline_image, AccountType, Actor, NewProperty, PaymentDetails, Property, PropertyFilter,
    PropertyUpdate,
};
use crate::error::DomainError;
use crate::repositories::{PropertyRepository, SnapshotStream};
use crate::services::{LedgerService, MockPaymentGateway};

pub struct PropertyService {
    properties: Arc<dyn PropertyRepository>,
    ledger: Arc<LedgerService>,
    payments: Arc<MockPaymentGateway>,
    platform_fee: i64,
    max_inline_image_bytes: usize,
}

impl PropertyService {
    pub fn new(
        properties: Arc<dyn PropertyRepository>,
        ledger: Arc<LedgerService>,
        payments: Arc<MockPaymentGateway>,
        platform_fee: i64,
        max_inline_image_bytes: usize,
    ) -> Self {
        Self {
            properties,
            ledger,
            payments,
            platform_fee,
            max_inline_image_bytes,
        }
    }

    /// Landlords pay the platform fee before the listing is written; admins
    /// list for free. Either way a ledger entry records the creation.
    pub async fn create(
        &self,
        actor: &Actor,
        input: NewProperty,
        payment: Option<PaymentDetails>,
    ) -> Result<Property, DomainError> {
        if !matches!(actor.account_type, AccountType::Landlord | AccountType::Admin) {
            warn!(user_id = %actor.user_id, role = actor.account_type.as_str(), "Property creation refused");
            return Err(DomainError::denied("Only landlords and admins can list properties"));
        }

        let mut input = input.normalized()?;
        let id = self.resolve_id(input.id.take()).await?;
        input.main_image = sanitize_inline_image(input.main_image, self.max_inline_image_bytes);
        input.land_title = sanitize_inline_image(input.land_title, self.max_inline_image_bytes);
        let now = estate_shared::now_millis();

        if actor.is_admin() {
            let property = Property::new(id, input, None, AccountType::Admin, now);
            let created = self.properties.create(&property).await?;
            if let Err(e) = self.ledger.record_admin_creation(&created).await {
                error!(property_id = %created.id, "Failed to record admin creation: {}", e);
            }
            info!(property_id = %created.id, "Property created by admin");
            return Ok(created);
        }

        let details = payment.ok_or_else(|| DomainError::invalid("Platform fee payment is required"))?;
        let receipt = self.payments.charge(&details, self.platform_fee)?;
        let owner = (actor.user_id.clone(), actor.name_or("Landlord"));
        let property = Property::new(id, input, Some(owner), AccountType::Landlord, now);
        let created = self.properties.create(&property).await?;
        if let Err(e) = self.ledger.record_platform_fee(&created, &receipt).await {
            error!(
                property_id = %created.id,
                payment_reference = %receipt.reference,
                "Failed to record platform fee: {}", e
            );
        }
        info!(property_id = %created.id, landlord_id = %actor.user_id, "Property created");
        Ok(created)
    }

    /// Merge-patches listing fields. Workflow flags are never touched here.
    pub async fn update(
        &self,
        actor: &Actor,
        id: &str,
        update: PropertyUpdate,
    ) -> Result<Property, DomainError> {
        let update = update.normalized()?;
        let existing = self.get(id).await?;
        if !actor.can_manage(&existing) {
            warn!(user_id = %actor.user_id, property_id = %id, "Property update refused");
            return Err(DomainError::denied("You can only edit your own properties"));
        }

        let mut patch = update.into_patch();
        // A rejected image leaves the stored one in place.
        patch.main_image = sanitize_inline_image(patch.main_image, self.max_inline_image_bytes);
        patch.land_title = sanitize_inline_image(patch.land_title, self.max_inline_image_bytes);
        let now = estate_shared::next_timestamp(existing.updated_at.max(existing.last_modified_at));
        let patch = patch.stamped(now, actor.account_type);

        self.properties.update_fields(id, patch.to_fields()).await?;
        info!(property_id = %id, user_id = %actor.user_id, "Property updated");
        self.get(id).await
    }

    pub async fn delete(&self, actor: &Actor, id: &str) -> Result<(), DomainError> {
        let existing = self.get(id).await?;
        if !actor.can_manage(&existing) {
            warn!(user_id = %actor.user_id, property_id = %id, "Property delete refused");
            return Err(DomainError::denied("You can only delete your own properties"));
        }
        self.properties.delete(id).await?;
        info!(property_id = %id, user_id = %actor.user_id, "Property deleted");
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<Property, DomainError> {
        self.properties
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Property", id))
    }

    /// Single listing as seen by `actor`: unverified listings are visible to
    /// their managers and reviewers only.
    pub async fn get_for(&self, actor: &Actor, id: &str) -> Result<Property, DomainError> {
        let property = self.get(id).await?;
        if property.is_tenant_visible() || actor.can_manage(&property) || actor.account_type.is_government() {
            Ok(property)
        } else {
            Err(DomainError::not_found("Property", id))
        }
    }

    pub async fn list(&self, filter: PropertyFilter) -> Result<Vec<Property>, DomainError> {
        let all = self.properties.list().await?;
        let matched = filter.apply(all);
        debug!(?filter, count = matched.len(), "Listed properties");
        Ok(matched)
    }

    pub async fn tenant_listings(&self) -> Result<Vec<Property>, DomainError> {
        self.list(PropertyFilter::TenantVisible).await
    }

    pub async fn owned_by(&self, actor: &Actor) -> Result<Vec<Property>, DomainError> {
        self.list(PropertyFilter::OwnedBy(actor.user_id.clone())).await
    }

    /// Live filtered view. Each item is the full matching set.
    pub fn subscribe(&self, filter: PropertyFilter) -> SnapshotStream<Vec<Property>> {
        self.properties
            .subscribe()
            .map(move |snapshot| snapshot.map(|all| filter.apply(all)))
            .boxed()
    }

    async fn resolve_id(&self, requested: Option<EntityId>) -> Result<EntityId, DomainError> {
        match requested.map(|id| id.trim().to_string()).filter(|id| !id.is_empty()) {
            Some(id) if is_valid_key_segment(&id) => {
                if self.properties.find_by_id(&id).await?.is_some() {
                    return Err(DomainError::invalid(format!("Property {} already exists", id)));
                }
                Ok(id)
            }
            Some(id) => {
                warn!("Ignoring unusable property id {:?}", id);
                Ok(self.properties.next_id())
            }
            None => Ok(self.properties.next_id()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{MockPropertyRepository, MockTransactionRepository};

    fn actor(id: &str, role: AccountType) -> Actor {
        Actor {
            user_id: id.into(),
            account_type: role,
            display_name: Some("Lan".into()),
            email: None,
        }
    }

    fn input() -> NewProperty {
        NewProperty {
            name: "Villa A".into(),
            city: "Douala".into(),
            price: Some(25_000_000),
            ..Default::default()
        }
    }

    fn service(props: MockPropertyRepository, txs: MockTransactionRepository) -> PropertyService {
        let props: Arc<dyn PropertyRepository> = Arc::new(props);
        let payments = Arc::new(MockPaymentGateway::new("XAF"));
        let ledger = Arc::new(LedgerService::new(Arc::new(txs), props.clone(), payments.clone()));
        PropertyService::new(props, ledger, payments, 1000, 1024)
    }

    #[tokio::test]
    async fn tenants_cannot_create() {
        let svc = service(MockPropertyRepository::new(), MockTransactionRepository::new());
        let err = svc.create(&actor("t1", AccountType::Tenant), input(), None).await.unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn landlord_create_requires_payment() {
        let mut props = MockPropertyRepository::new();
        props.expect_next_id().returning(|| "p1".into());
        props.expect_create().never();
        let svc = service(props, MockTransactionRepository::new());

        let err = svc.create(&actor("l1", AccountType::Landlord), input(), None).await.unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn landlord_create_records_platform_fee() {
        let mut props = MockPropertyRepository::new();
        props.expect_next_id().returning(|| "p1".into());
        props.expect_create().times(1).returning(|p| Ok(p.clone()));
        let mut txs = MockTransactionRepository::new();
        txs.expect_insert_if_absent()
            .withf(|tx| tx.amount == 1000 && tx.landlord_id.as_deref() == Some("l1"))
            .times(1)
            .returning(|tx| Ok((tx.clone(), true)));
        let svc = service(props, txs);

        let payment = PaymentDetails::Mtn { phone_number: "677123456".into() };
        let created = svc
            .create(&actor("l1", AccountType::Landlord), input(), Some(payment))
            .await
            .unwrap();
        assert_eq!(created.id, "p1");
        assert_eq!(created.landlord_name.as_deref(), Some("Lan"));
        assert!(!created.is_verified);
    }

    #[tokio::test]
    async fn store_failure_on_create_is_reported() {
        let mut props = MockPropertyRepository::new();
        props.expect_next_id().returning(|| "p1".into());
        props
            .expect_create()
            .returning(|_| Err(DomainError::StoreUnavailable("offline".into())));
        let svc = service(props, MockTransactionRepository::new());

        let err = svc.create(&actor("a1", AccountType::Admin), input(), None).await.unwrap_err();
        assert!(matches!(err, DomainError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn caller_id_must_be_unused() {
        let mut props = MockPropertyRepository::new();
        props.expect_find_by_id().returning(|id| {
            let mut p = Property::new(id.to_string(), input(), None, AccountType::Admin, 1);
            p.id = id.to_string();
            Ok(Some(p))
        });
        let svc = service(props, MockTransactionRepository::new());

        let mut taken = input();
        taken.id = Some("villa-a".into());
        let err = svc.create(&actor("a1", AccountType::Admin), taken, None).await.unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn landlords_cannot_edit_others_listings() {
        let mut props = MockPropertyRepository::new();
        props.expect_find_by_id().returning(|id| {
            Ok(Some(Property::new(
                id.to_string(),
                input(),
                Some(("l2".into(), "Other".into())),
                AccountType::Landlord,
                1,
            )))
        });
        props.expect_update_fields().never();
        let svc = service(props, MockTransactionRepository::new());

        let update = PropertyUpdate {
            price: Some(1),
            ..Default::default()
        };
        let err = svc.update(&actor("l1", AccountType::Landlord), "p1", update).await.unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn delete_of_missing_property_is_not_found() {
        let mut props = MockPropertyRepository::new();
        props.expect_find_by_id().returning(|_| Ok(None));
        let svc = service(props, MockTransactionRepository::new());
        let err = svc.delete(&actor("a1", AccountType::Admin), "nope").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }
}
