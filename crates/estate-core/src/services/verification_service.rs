// ============================================================================
// Estate Core - Verification Service
// File: crates/estate-core/src/services/verification_service.rs
// ============================================================================
//! Drives properties through admin and council review.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{info, warn};

use crate::domain::{plan_transition, AccountType, Actor, Property, PropertyFilter, VerificationAction};
use crate::error::DomainError;
use crate::repositories::{PropertyRepository, SnapshotStream};

pub struct VerificationService {
    properties: Arc<dyn PropertyRepository>,
}

impl VerificationService {
    pub fn new(properties: Arc<dyn PropertyRepository>) -> Self {
        Self { properties }
    }

    /// Reads the current record, validates the transition against it and
    /// writes the resulting patch. Nothing is written on rejection.
    pub async fn apply(
        &self,
        actor: &Actor,
        property_id: &str,
        action: VerificationAction,
    ) -> Result<Property, DomainError> {
        let property = self
            .properties
            .find_by_id(property_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Property", property_id))?;

        if action == VerificationAction::Submit
            && actor.account_type == AccountType::Landlord
            && !property.is_owned_by(&actor.user_id)
        {
            warn!(user_id = %actor.user_id, property_id, "Submission for a foreign property refused");
            return Err(DomainError::denied("You can only submit your own properties"));
        }

        let now = estate_shared::next_timestamp(property.updated_at.max(property.last_modified_at));
        let transition = plan_transition(&property, action, actor.account_type, now).map_err(|e| {
            warn!(property_id, action = %action, user_id = %actor.user_id, "Verification action rejected: {}", e);
            e
        })?;

        self.properties
            .update_fields(property_id, transition.patch.to_fields())
            .await?;
        info!(
            property_id,
            from = %transition.from,
            to = %transition.to,
            action = %action,
            actor = %actor.user_id,
            role = actor.account_type.as_str(),
            "Verification state changed"
        );

        self.properties
            .find_by_id(property_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Property", property_id))
    }

    pub async fn admin_queue(&self, actor: &Actor) -> Result<Vec<Property>, DomainError> {
        require_reviewer(actor, PropertyFilter::AdminQueue)?;
        Ok(PropertyFilter::AdminQueue.apply(self.properties.list().await?))
    }

    pub async fn council_queue(&self, actor: &Actor) -> Result<Vec<Property>, DomainError> {
        require_reviewer(actor, PropertyFilter::CouncilQueue)?;
        Ok(PropertyFilter::CouncilQueue.apply(self.properties.list().await?))
    }

    /// Live review queue for the actor's stage.
    pub fn subscribe_queue(
        &self,
        actor: &Actor,
        queue: PropertyFilter,
    ) -> Result<SnapshotStream<Vec<Property>>, DomainError> {
        require_reviewer(actor, queue.clone())?;
        Ok(self
            .properties
            .subscribe()
            .map(move |snapshot| snapshot.map(|all| queue.apply(all)))
            .boxed())
    }
}

fn require_reviewer(actor: &Actor, queue: PropertyFilter) -> Result<(), DomainError> {
    let allowed = match queue {
        PropertyFilter::AdminQueue => actor.is_admin(),
        PropertyFilter::CouncilQueue => actor.is_admin() || actor.account_type.is_government(),
        _ => false,
    };
    if allowed {
        Ok(())
    } else {
        warn!(user_id = %actor.user_id, ?queue, "Review queue access refused");
        Err(DomainError::denied("Reviewer access required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewProperty, VerificationState};
    use crate::repositories::MockPropertyRepository;

    fn actor(id: &str, role: AccountType) -> Actor {
        Actor {
            user_id: id.into(),
            account_type: role,
            display_name: None,
            email: None,
        }
    }

    fn draft() -> Property {
        let input = NewProperty {
            name: "Villa A".into(),
            city: "Douala".into(),
            price: Some(1),
            ..Default::default()
        };
        Property::new("p1".into(), input, Some(("l1".into(), "L".into())), AccountType::Landlord, 1)
    }

    #[tokio::test]
    async fn illegal_transition_writes_nothing() {
        let mut props = MockPropertyRepository::new();
        props.expect_find_by_id().returning(|_| Ok(Some(draft())));
        props.expect_update_fields().never();
        let svc = VerificationService::new(Arc::new(props));

        let err = svc
            .apply(&actor("g1", AccountType::Council), "p1", VerificationAction::Approve)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidTransition {
                from: VerificationState::Draft,
                action: VerificationAction::Approve
            }
        );
    }

    #[tokio::test]
    async fn foreign_landlord_cannot_submit() {
        let mut props = MockPropertyRepository::new();
        props.expect_find_by_id().returning(|_| Ok(Some(draft())));
        props.expect_update_fields().never();
        let svc = VerificationService::new(Arc::new(props));

        let err = svc
            .apply(&actor("l2", AccountType::Landlord), "p1", VerificationAction::Submit)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn failed_write_is_propagated() {
        let mut props = MockPropertyRepository::new();
        props.expect_find_by_id().returning(|_| Ok(Some(draft())));
        props
            .expect_update_fields()
            .returning(|_, _| Err(DomainError::Timeout("write".into())));
        let svc = VerificationService::new(Arc::new(props));

        let err = svc
            .apply(&actor("l1", AccountType::Landlord), "p1", VerificationAction::Submit)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Timeout(_)));
    }

    #[tokio::test]
    async fn queues_are_role_gated() {
        let svc = VerificationService::new(Arc::new(MockPropertyRepository::new()));
        assert!(svc.admin_queue(&actor("c1", AccountType::Council)).await.is_err());
        assert!(svc.council_queue(&actor("t1", AccountType::Tenant)).await.is_err());
    }
}
