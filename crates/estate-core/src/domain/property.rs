// ============================================================================
// Estate Core - Property Entity
// File: crates/estate-core/src/domain/property.rs
// Description: Property listing with workflow flags
// ============================================================================

use estate_shared::{EntityId, Timestamp};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;
use validator::Validate;

use super::account::AccountType;
use super::verification::{VerificationState, VerificationStatus, Verifier};

/// Property type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    #[default]
    House,
    Apartment,
    Land,
    Villa,
    Commercial,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::House => "house",
            PropertyType::Apartment => "apartment",
            PropertyType::Land => "land",
            PropertyType::Villa => "villa",
            PropertyType::Commercial => "commercial",
        }
    }
}

/// Listing type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ListingType {
    #[default]
    Sale,
    Rent,
    Pledge,
}

impl ListingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingType::Sale => "sale",
            ListingType::Rent => "rent",
            ListingType::Pledge => "pledge",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    #[default]
    Listed,
    Unlisted,
    Sold,
    Rented,
}

/// Platform fee sub-object embedded by older clients. New fees are written to
/// the ledger collection instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedPlatformFee {
    #[serde(default)]
    pub amount: i64,
    pub status: super::transaction::TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub is_admin_created: bool,
}

/// Accepts integers and integral floats (`25000000.0`) written by older
/// clients.
fn whole_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let number = serde_json::Number::deserialize(deserializer)?;
    if let Some(n) = number.as_i64() {
        return Ok(n);
    }
    match number.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
        _ => Err(de::Error::custom(format!("expected a whole amount, got {}", number))),
    }
}

/// Property entity as stored at `properties/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    #[serde(default)]
    pub id: EntityId,
    pub name: String,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(deserialize_with = "whole_amount")]
    pub price: i64,
    #[serde(default)]
    pub property_type: PropertyType,
    #[serde(default)]
    pub listing_type: ListingType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub bedrooms: f64,
    #[serde(default)]
    pub bathrooms: f64,
    #[serde(default)]
    pub area: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub land_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landlord_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landlord_name: Option<String>,
    #[serde(default)]
    pub status: ListingStatus,

    // Workflow flags
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub verification_requested: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_requested_at: Option<Timestamp>,
    #[serde(default)]
    pub verification_status: VerificationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<Verifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forwarded_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forwarded_by: Option<String>,
    #[serde(default)]
    pub government_requested: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub government_requested_at: Option<Timestamp>,
    #[serde(default)]
    pub government_approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub government_approved_at: Option<Timestamp>,
    #[serde(default)]
    pub government_rejected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub government_rejected_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub withdrawn_at: Option<Timestamp>,

    // Audit fields
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_fee: Option<EmbeddedPlatformFee>,

    /// Fields written by other clients that this service does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Property {
    pub fn new(
        id: EntityId,
        input: NewProperty,
        owner: Option<(EntityId, String)>,
        created_by: AccountType,
        now: Timestamp,
    ) -> Self {
        let city = input.city.trim().to_string();
        let (landlord_id, landlord_name) = match owner {
            Some((id, name)) => (Some(id), Some(name)),
            None => (None, None),
        };
        Self {
            id,
            name: input.name.trim().to_string(),
            location: Some(city.clone()),
            city,
            price: input.price.unwrap_or_default(),
            property_type: input.property_type,
            listing_type: input.listing_type,
            description: input.description,
            bedrooms: input.bedrooms,
            bathrooms: input.bathrooms,
            area: input.area,
            size_unit: Some(input.size_unit.unwrap_or_else(|| "sqm".to_string())),
            main_image: input.main_image,
            land_title: input.land_title,
            landlord_id,
            landlord_name,
            status: ListingStatus::Listed,
            is_verified: false,
            verification_requested: false,
            verification_requested_at: None,
            verification_status: VerificationStatus::None,
            verified_at: None,
            verified_by: None,
            forwarded_at: None,
            forwarded_by: None,
            government_requested: false,
            government_requested_at: None,
            government_approved: false,
            government_approved_at: None,
            government_rejected: false,
            government_rejected_at: None,
            withdrawn_at: None,
            created_at: now,
            updated_at: Some(now),
            last_modified_at: Some(now),
            last_modified_by: Some(created_by.as_str().to_string()),
            platform_fee: None,
            extra: Map::new(),
        }
    }

    /// A property is visible to tenants only once verified.
    pub fn is_tenant_visible(&self) -> bool {
        self.is_verified
    }

    pub fn verification_state(&self) -> VerificationState {
        VerificationState::of(self)
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.landlord_id.as_deref() == Some(user_id)
    }

    /// Surfaced in the admin review queue: a pending request that was never
    /// forwarded, or one that came back from the government.
    pub fn in_admin_queue(&self) -> bool {
        (self.verification_requested && !self.is_verified && !self.government_requested)
            || (self.verification_status == VerificationStatus::WithdrawnFromGovernment
                && self.verification_requested)
    }

    /// Surfaced in the council review queue.
    pub fn in_council_queue(&self) -> bool {
        self.government_requested
            && self.verification_status == VerificationStatus::ForwardedToGovernment
    }
}

/// Property creation payload
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewProperty {
    #[serde(default)]
    pub id: Option<EntityId>,

    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    #[serde(default)]
    pub name: String,

    #[validate(length(min = 1, max = 100, message = "City is required"))]
    #[serde(default)]
    pub city: String,

    #[validate(required(message = "Price is required"), range(min = 1, message = "Price must be positive"))]
    #[serde(default)]
    pub price: Option<i64>,

    #[serde(default)]
    pub property_type: PropertyType,
    #[serde(default)]
    pub listing_type: ListingType,
    #[serde(default)]
    pub description: Option<String>,

    #[validate(range(min = 0.0, message = "Bedrooms cannot be negative"))]
    #[serde(default)]
    pub bedrooms: f64,
    #[validate(range(min = 0.0, message = "Bathrooms cannot be negative"))]
    #[serde(default)]
    pub bathrooms: f64,
    #[validate(range(min = 0.0, message = "Area cannot be negative"))]
    #[serde(default)]
    pub area: f64,

    #[serde(default)]
    pub size_unit: Option<String>,
    #[serde(default)]
    pub main_image: Option<String>,
    #[serde(default)]
    pub land_title: Option<String>,
}

impl NewProperty {
    /// Trims the free-text fields and validates the result.
    pub fn normalized(mut self) -> Result<Self, validator::ValidationErrors> {
        self.name = self.name.trim().to_string();
        self.city = self.city.trim().to_string();
        self.description = self.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty());
        self.validate()?;
        Ok(self)
    }
}

/// Owner-editable listing fields. Workflow flags only change through
/// verification transitions.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PropertyUpdate {
    #[validate(length(min = 1, max = 200, message = "Name cannot be blank"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "City cannot be blank"))]
    pub city: Option<String>,
    #[validate(range(min = 1))]
    pub price: Option<i64>,
    pub property_type: Option<PropertyType>,
    pub listing_type: Option<ListingType>,
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub bedrooms: Option<f64>,
    #[validate(range(min = 0.0))]
    pub bathrooms: Option<f64>,
    #[validate(range(min = 0.0))]
    pub area: Option<f64>,
    pub size_unit: Option<String>,
    pub main_image: Option<String>,
    pub land_title: Option<String>,
    pub status: Option<ListingStatus>,
}

impl PropertyUpdate {
    /// Trims the free-text fields, then validates, so a blank name or city
    /// is refused rather than stored empty.
    pub fn normalized(mut self) -> Result<Self, validator::ValidationErrors> {
        self.name = self.name.map(|n| n.trim().to_string());
        self.city = self.city.map(|c| c.trim().to_string());
        self.description = self.description.map(|d| d.trim().to_string());
        self.validate()?;
        Ok(self)
    }

    pub fn into_patch(self) -> PropertyPatch {
        PropertyPatch {
            name: self.name,
            location: self.city.clone(),
            city: self.city,
            price: self.price,
            property_type: self.property_type,
            listing_type: self.listing_type,
            description: self.description,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            area: self.area,
            size_unit: self.size_unit,
            main_image: self.main_image,
            land_title: self.land_title,
            status: self.status,
            ..Default::default()
        }
    }
}

/// Partial-field merge patch for `properties/{id}`. `None` leaves the stored
/// field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type: Option<PropertyType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_type: Option<ListingType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub land_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ListingStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_requested: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_requested_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<VerificationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<Verifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forwarded_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forwarded_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub government_requested: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub government_requested_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub government_approved: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub government_approved_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub government_rejected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub government_rejected_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub withdrawn_at: Option<Timestamp>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
}

impl PropertyPatch {
    pub fn stamped(mut self, now: Timestamp, by: AccountType) -> Self {
        self.updated_at = Some(now);
        self.last_modified_at = Some(now);
        self.last_modified_by = Some(by.as_str().to_string());
        self
    }

    /// Renders the patch as the top-level field map written to the store.
    pub fn to_fields(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Which properties a listing or subscription should return.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyFilter {
    All,
    TenantVisible,
    OwnedBy(EntityId),
    AdminQueue,
    CouncilQueue,
}

impl PropertyFilter {
    pub fn matches(&self, property: &Property) -> bool {
        match self {
            PropertyFilter::All => true,
            PropertyFilter::TenantVisible => property.is_tenant_visible(),
            PropertyFilter::OwnedBy(owner) => property.is_owned_by(owner),
            PropertyFilter::AdminQueue => property.in_admin_queue(),
            PropertyFilter::CouncilQueue => property.in_council_queue(),
        }
    }

    /// Sorts newest-first by the timestamp that matters for this view.
    pub fn sort(&self, properties: &mut [Property]) {
        match self {
            PropertyFilter::AdminQueue => properties.sort_by(|a, b| {
                b.verification_requested_at
                    .unwrap_or(0)
                    .cmp(&a.verification_requested_at.unwrap_or(0))
            }),
            PropertyFilter::CouncilQueue => properties.sort_by(|a, b| {
                b.government_requested_at
                    .unwrap_or(0)
                    .cmp(&a.government_requested_at.unwrap_or(0))
            }),
            _ => properties.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
    }

    pub fn apply(&self, properties: Vec<Property>) -> Vec<Property> {
        let mut matched: Vec<Property> = properties.into_iter().filter(|p| self.matches(p)).collect();
        self.sort(&mut matched);
        matched
    }
}

/// Keeps an embedded `data:` image only when it is well formed and within the
/// size limit. Anything else degrades to `None` so the save still goes through.
pub fn sanitize_inline_image(value: Option<String>, max_bytes: usize) -> Option<String> {
    let value = value?.trim().to_string();
    if value.is_empty() {
        return None;
    }
    if !value.starts_with("data:") {
        return Some(value);
    }
    let well_formed = value
        .split_once(',')
        .map(|(header, body)| header.starts_with("data:image/") && !body.is_empty())
        .unwrap_or(false);
    if !well_formed {
        warn!("Dropping malformed inline image");
        return None;
    }
    if value.len() > max_bytes {
        warn!("Dropping inline image of {} bytes (limit {})", value.len(), max_bytes);
        return None;
    }
    Some(value)
}
