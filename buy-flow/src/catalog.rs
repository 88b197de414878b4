//! Phone and plan catalog documents as served by the product services.

use serde::{Deserialize, Serialize};

use crate::state::{PhoneDetailsPatch, set};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageOption {
    pub capacity: String,
    pub price: String,
    pub monthly_price: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorOption {
    pub name: String,
    pub hex_code: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeInOption {
    pub condition: String,
    pub savings: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accessory {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub price: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoneImages {
    pub main: String,
    #[serde(default)]
    pub gallery: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhonePricing {
    pub full_price: String,
    pub monthly_price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_monthly_price: Option<String>,
    pub financing_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promo_text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AvailabilityStatus {
    #[serde(rename = "In Stock")]
    InStock,
    #[serde(rename = "Out of Stock")]
    OutOfStock,
    Backorder,
    #[serde(rename = "Pre-order")]
    PreOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub status: AvailabilityStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_ship_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOptions {
    pub add_new_line: bool,
    pub upgrade_existing_line: bool,
    pub trade_in_available: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trade_in_options: Vec<TradeInOption>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneFeatures {
    #[serde(default)]
    pub key_features: Vec<Feature>,
    /// Free-form spec sheet (chip, display, camera, battery, ...)
    #[serde(default)]
    pub specs: serde_json::Map<String, serde_json::Value>,
}

/// Full product record for a handset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phone {
    pub id: String,
    pub brand: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    pub images: PhoneImages,
    pub colors: Vec<ColorOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_color: Option<String>,
    pub storage_options: Vec<StorageOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_storage: Option<String>,
    pub pricing: PhonePricing,
    pub availability: Availability,
    pub purchase_options: PurchaseOptions,
    #[serde(default)]
    pub features: PhoneFeatures,
    #[serde(default)]
    pub accessories: Vec<Accessory>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub badges: Vec<String>,
    #[serde(rename = "is5G")]
    pub is_5g: bool,
    pub free_shipping: bool,
}

/// Flattened phone card for listing pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneListItem {
    pub id: String,
    pub brand: String,
    pub model: String,
    pub image: String,
    pub monthly_price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_monthly_price: Option<String>,
    pub full_price: String,
    pub financing: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion: Option<String>,
    /// Swatch hex codes
    pub colors: Vec<String>,
    #[serde(rename = "is5G")]
    pub is_5g: bool,
}

impl From<&Phone> for PhoneListItem {
    fn from(phone: &Phone) -> Self {
        Self {
            id: phone.id.clone(),
            brand: phone.brand.clone(),
            model: phone.model.clone(),
            image: phone.images.main.clone(),
            monthly_price: format!("${}/mo", phone.pricing.monthly_price),
            original_monthly_price: phone
                .pricing
                .original_monthly_price
                .as_ref()
                .map(|price| format!("${price}/mo")),
            full_price: phone.pricing.full_price.clone(),
            financing: phone.pricing.financing_text.clone(),
            promotion: phone.pricing.promo_text.clone(),
            colors: phone.colors.iter().map(|c| c.hex_code.clone()).collect(),
            is_5g: phone.is_5g,
        }
    }
}

impl Phone {
    pub fn default_color(&self) -> Option<&str> {
        self.selected_color
            .as_deref()
            .or_else(|| self.colors.first().map(|c| c.name.as_str()))
    }

    pub fn default_storage(&self) -> Option<&str> {
        self.selected_storage
            .as_deref()
            .or_else(|| self.storage_options.first().map(|s| s.capacity.as_str()))
    }

    pub fn color(&self, name: &str) -> Option<&ColorOption> {
        self.colors.iter().find(|c| c.name == name)
    }

    pub fn storage(&self, capacity: &str) -> Option<&StorageOption> {
        self.storage_options.iter().find(|s| s.capacity == capacity)
    }

    pub fn has_promotion(&self) -> bool {
        self.pricing.promo_text.is_some()
    }

    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.model.to_lowercase().contains(&term) || self.brand.to_lowercase().contains(&term)
    }
}

impl PhoneDetailsPatch {
    /// Patch describing `phone` configured with the given colour and storage.
    ///
    /// Missing choices fall back to the phone's preselected or first option; the
    /// image follows the colour and the prices follow the storage option.
    pub fn from_selection(phone: &Phone, color: Option<&str>, storage: Option<&str>) -> Self {
        let color_name = color.or_else(|| phone.default_color());
        let capacity = storage.or_else(|| phone.default_storage());
        let color_option = color_name.and_then(|name| phone.color(name));
        let storage_option = capacity.and_then(|cap| phone.storage(cap));

        Self {
            phone_id: set(&phone.id),
            phone_brand: set(&phone.brand),
            phone_model: set(&phone.model),
            phone_image: set(
                color_option
                    .map(|c| c.image.as_str())
                    .unwrap_or(phone.images.main.as_str()),
            ),
            selected_color: Some(color_name.map(str::to_string)),
            selected_color_hex: Some(color_option.map(|c| c.hex_code.clone())),
            selected_storage: Some(capacity.map(str::to_string)),
            full_price: set(
                storage_option
                    .map(|s| s.price.as_str())
                    .unwrap_or(phone.pricing.full_price.as_str()),
            ),
            monthly_price: set(
                storage_option
                    .map(|s| s.monthly_price.as_str())
                    .unwrap_or(phone.pricing.monthly_price.as_str()),
            ),
        }
    }
}

/// Price block of a plan option; catalogs use either field name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanPrice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_charge: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_recurring_charge: Option<f64>,
}

impl PlanPrice {
    /// `monthlyCharge`, else `monthlyRecurringCharge`, else zero.
    pub fn monthly(&self) -> f64 {
        self.monthly_charge
            .filter(|charge| *charge != 0.0)
            .or(self.monthly_recurring_charge)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOption {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub price: PlanPrice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanGroup {
    #[serde(rename = "type")]
    pub plan_type: String,
    #[serde(default)]
    pub options: Vec<PlanOption>,
}

pub const RATE_PLAN: &str = "RatePlan";
pub const INSURANCE_PLAN: &str = "InsurancePlan";

/// Plan catalog: groups of options keyed by plan type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanCatalog {
    pub groups: Vec<PlanGroup>,
}

impl PlanCatalog {
    fn options(&self, plan_type: &str) -> &[PlanOption] {
        self.groups
            .iter()
            .find(|group| group.plan_type == plan_type)
            .map(|group| group.options.as_slice())
            .unwrap_or_default()
    }

    /// Options for the data-plan cards.
    pub fn rate_plans(&self) -> &[PlanOption] {
        self.options(RATE_PLAN)
    }

    /// Options for the protection choices.
    pub fn insurance_plans(&self) -> &[PlanOption] {
        self.options(INSURANCE_PLAN)
    }

    pub fn rate_plan(&self, id: &str) -> Option<&PlanOption> {
        self.rate_plans().iter().find(|opt| opt.id == id)
    }

    pub fn insurance_plan(&self, id: &str) -> Option<&PlanOption> {
        self.insurance_plans().iter().find(|opt| opt.id == id)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use serde_json::json;

    pub fn phone() -> Phone {
        serde_json::from_value(json!({
            "id": "1",
            "brand": "Apple",
            "model": "iPhone 15 Pro",
            "images": { "main": "main.png", "gallery": ["g1.png"] },
            "colors": [
                { "name": "Natural Titanium", "hexCode": "#8F8A81", "image": "natural.png" },
                { "name": "Blue Titanium", "hexCode": "#2F4452", "image": "blue.png" }
            ],
            "storageOptions": [
                { "capacity": "128GB", "price": "$999", "monthlyPrice": "41.62" },
                { "capacity": "256GB", "price": "$1099", "monthlyPrice": "45.79" }
            ],
            "pricing": {
                "fullPrice": "$999",
                "monthlyPrice": "41.62",
                "originalMonthlyPrice": "45.83",
                "financingText": "0% APR for 24 months",
                "promoText": "Trade-in offer available"
            },
            "availability": { "status": "In Stock" },
            "purchaseOptions": {
                "addNewLine": true,
                "upgradeExistingLine": true,
                "tradeInAvailable": true
            },
            "is5G": true,
            "freeShipping": true
        }))
        .unwrap()
    }

    pub fn plans() -> PlanCatalog {
        serde_json::from_value(json!([
            {
                "type": "RatePlan",
                "options": [
                    { "id": "PLAN_A", "name": "Unlimited", "description": "Unlimited data",
                      "price": { "monthlyCharge": 30 } },
                    { "id": "PLAN_B", "name": "By the Gig",
                      "price": { "monthlyRecurringCharge": 14 } }
                ]
            },
            {
                "type": "InsurancePlan",
                "options": [
                    { "id": "INS_1", "name": "Mobile Care", "price": { "monthlyCharge": 12.99 } }
                ]
            }
        ]))
        .unwrap()
    }
}
