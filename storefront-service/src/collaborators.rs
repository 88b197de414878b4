//! Outbound services the buy flow depends on: the cart service and the
//! trade-in quote service. Each has an HTTP client for a real deployment and an
//! in-process mock used when no URL is configured.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use buy_flow::{CartPayload, PlanCatalog, TradeInOffer, TradeInRequest};
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

const MOCK_DEVICE_MONTHLY: f64 = 22.19;
const MOCK_ACTIVATION_FEE: f64 = 35.0;
const MOCK_ONE_TIME_TAX: f64 = 3.15;

#[async_trait]
pub trait CartService: Send + Sync {
    /// Add the device and its plans to the cart; returns the cart document.
    async fn add_to_cart(&self, payload: &CartPayload) -> Result<Value>;
}

#[async_trait]
pub trait TradeInService: Send + Sync {
    async fn quote(&self, request: &TradeInRequest) -> Result<TradeInOffer>;
}

fn http_client() -> Result<Client> {
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))
}

pub struct HttpCartService {
    client: Client,
    url: String,
}

impl HttpCartService {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl CartService for HttpCartService {
    async fn add_to_cart(&self, payload: &CartPayload) -> Result<Value> {
        debug!(url = %self.url, "Posting cart payload");
        let response = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| anyhow!("Cart request failed: {}", e))?
            .error_for_status()
            .map_err(|e| anyhow!("Cart service returned an error: {}", e))?;

        response
            .json::<Value>()
            .await
            .map_err(|e| anyhow!("Failed to parse cart response: {}", e))
    }
}

pub struct HttpTradeInService {
    client: Client,
    url: String,
}

impl HttpTradeInService {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl TradeInService for HttpTradeInService {
    async fn quote(&self, request: &TradeInRequest) -> Result<TradeInOffer> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| anyhow!("Trade-in request failed: {}", e))?
            .error_for_status()
            .map_err(|e| anyhow!("Trade-in service returned an error: {}", e))?;

        response
            .json::<TradeInOffer>()
            .await
            .map_err(|e| anyhow!("Failed to parse trade-in offer: {}", e))
    }
}

/// Cart service stand-in that prices the payload against the plan catalog
pub struct MockCartService {
    plans: PlanCatalog,
}

impl MockCartService {
    pub fn new(plans: PlanCatalog) -> Self {
        Self { plans }
    }

    fn service_plans(&self, payload: &CartPayload) -> Vec<Value> {
        let mut plans = Vec::new();

        plans.push(json!({
            "type": "PaymentPlan",
            "options": [{ "id": "RECURRING", "name": "Device Payment", "term": 36 }],
            "selectedPlanId": "RECURRING",
            "price": { "monthlyRecurringCharge": MOCK_DEVICE_MONTHLY, "oneTimeCharge": 0 }
        }));

        if let Some(selected) = payload.selected_plan_id("RatePlan") {
            plans.push(self.catalog_plan("RatePlan", self.plans.rate_plans(), selected));
        }
        if let Some(selected) = payload.selected_plan_id("InsurancePlan") {
            plans.push(self.catalog_plan("InsurancePlan", self.plans.insurance_plans(), selected));
        }

        plans.push(json!({
            "type": "ActivationFee",
            "options": [{ "id": "ActivationFee", "name": "Activation Fee" }],
            "selectedPlanId": "ActivationFee",
            "price": { "monthlyRecurringCharge": 0, "oneTimeCharge": MOCK_ACTIVATION_FEE }
        }));
        plans.push(json!({
            "type": "WaiveActivationFee",
            "options": [{ "id": "WaiveActivationFee", "name": "Activation Fee Waiver" }],
            "selectedPlanId": "WaiveActivationFee",
            "price": { "monthlyRecurringCharge": 0, "oneTimeCharge": -MOCK_ACTIVATION_FEE }
        }));

        plans
    }

    fn catalog_plan(
        &self,
        plan_type: &str,
        options: &[buy_flow::PlanOption],
        selected: &str,
    ) -> Value {
        let charge = options
            .iter()
            .find(|opt| opt.id == selected)
            .map(|opt| opt.price.monthly())
            .unwrap_or_default();
        json!({
            "type": plan_type,
            "options": options
                .iter()
                .map(|opt| json!({ "id": opt.id, "name": opt.name }))
                .collect::<Vec<_>>(),
            "selectedPlanId": selected,
            "price": { "monthlyRecurringCharge": charge, "oneTimeCharge": 0 }
        })
    }
}

#[async_trait]
impl CartService for MockCartService {
    async fn add_to_cart(&self, payload: &CartPayload) -> Result<Value> {
        let item = payload
            .items
            .first()
            .ok_or_else(|| anyhow!("Cart payload has no items"))?;

        let service_plans = self.service_plans(payload);
        let monthly_total: f64 = service_plans
            .iter()
            .filter_map(|plan| plan.pointer("/price/monthlyRecurringCharge")?.as_f64())
            .sum::<f64>()
            - 5.0;

        let cart_id = Uuid::new_v4().to_string();
        info!(cart_id = %cart_id, sku = %item.sku, "Mock cart created");

        Ok(json!({
            "id": cart_id,
            "price": {
                "monthlyRecurringCharge": monthly_total,
                "monthlyRecurringTax": 0,
                "oneTimeCharge": 0,
                "oneTimeTax": MOCK_ONE_TIME_TAX,
                "monthlyRecurringTotal": monthly_total,
                "oneTimeTotal": MOCK_ONE_TIME_TAX
            },
            "items": [{
                "sku": item.sku,
                "name": "iPhone 15",
                "brand": "Apple",
                "variants": [{
                    "capacity": "128GB",
                    "color": { "name": "Black" },
                    "images": { "primary": { "url": "/images/iphone15.png" } }
                }],
                "productDetail": {
                    "nickname": item.product_detail.nickname,
                    "portInfo": { "portingFlag": item.product_detail.port_info.porting_flag },
                    "simType": item.sim_type,
                    "servicePlans": service_plans,
                    "promotions": [{
                        "promoDisplayable": true,
                        "durationOfServicePromotion": 24,
                        "price": { "monthlyRecurringCharge": -5 }
                    }]
                }
            }],
            "fulfillmentMethod": payload.fulfillment_method,
            "addaline": true
        }))
    }
}

/// Trade-in stand-in with flat per-brand values
#[derive(Default)]
pub struct MockTradeInService;

impl MockTradeInService {
    fn base_value(brand: &str) -> u32 {
        match brand.to_ascii_lowercase().as_str() {
            "apple" => 400,
            "samsung" => 300,
            "google" => 250,
            _ => 100,
        }
    }
}

#[async_trait]
impl TradeInService for MockTradeInService {
    async fn quote(&self, request: &TradeInRequest) -> Result<TradeInOffer> {
        if request.tradein_brand.trim().is_empty() || request.tradein_model.trim().is_empty() {
            return Err(anyhow!("Trade-in brand and model are required"));
        }

        let value = Self::base_value(&request.tradein_brand);
        Ok(TradeInOffer {
            tradein_value: value.to_string(),
            tradein_promotion: (value / 2).to_string(),
            tradein_phone_brand: request.tradein_brand.trim().to_string(),
            tradein_model: request.tradein_model.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::products::ProductCatalog;
    use buy_flow::{NumberChoice, PlanSelectionForm, assemble_cart_view, prepare_plan_submission};

    #[tokio::test]
    async fn test_mock_cart_prices_selected_plans() {
        let catalog = ProductCatalog::bundled().unwrap();
        let form = PlanSelectionForm {
            rate_plan_id: Some("PLAN_A".to_string()),
            number_choice: Some(NumberChoice::Keep),
            mobile_number: Some("5551234567".to_string()),
            device_for: "Dana".to_string(),
            protection_plan_id: Some("INS_BASIC".to_string()),
        };
        let submission = prepare_plan_submission(catalog.plans(), &form).unwrap();

        let cart = MockCartService::new(catalog.plans().clone())
            .add_to_cart(&submission.payload)
            .await
            .unwrap();
        let view = assemble_cart_view(&cart);
        let summary = view.summary().unwrap();

        assert_eq!(summary.nickname, "Dana");
        assert!(summary.keeps_number);
        assert_eq!(summary.rate_plan.as_ref().map(|p| p.monthly_charge), Some(30.0));
        assert_eq!(
            summary.insurance_plan.as_ref().map(|p| p.name.as_str()),
            Some("Mobile Care")
        );
        assert_eq!(summary.one_time_total_display(), "$3.15");
    }

    #[tokio::test]
    async fn test_mock_trade_in_quote() {
        let offer = MockTradeInService
            .quote(&TradeInRequest {
                phone_id: "1".to_string(),
                tradein_brand: "Samsung".to_string(),
                tradein_model: "Galaxy S21".to_string(),
                condition: None,
            })
            .await
            .unwrap();

        assert_eq!(offer.tradein_value, "300");
        assert_eq!(offer.device_name(), "Samsung Galaxy S21");
    }

    #[tokio::test]
    async fn test_mock_trade_in_requires_model() {
        let result = MockTradeInService
            .quote(&TradeInRequest {
                phone_id: "1".to_string(),
                tradein_brand: "Samsung".to_string(),
                tradein_model: " ".to_string(),
                condition: None,
            })
            .await;
        assert!(result.is_err());
    }
}
