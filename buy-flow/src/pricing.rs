//! Cart display model derived from a cart-service response.
//!
//! The response is treated as an opaque JSON document. Every lookup is
//! optional and falls back to a default, so any input shape produces a view.

use serde::Serialize;
use serde_json::Value;

const DEFAULT_NICKNAME: &str = "test67";
const DEFAULT_PORTING_FLAG: &str = "N";
const DEFAULT_DEVICE_NAME: &str = "iPhone 15";
const DEFAULT_BRAND: &str = "Apple";
const DEFAULT_CAPACITY: &str = "128GB";
const DEFAULT_SIM_TYPE: &str = "eSIM";
const DEFAULT_COLOR: &str = "Black";
const DEFAULT_IMAGE: &str = "/images/iphone15.png";
const DEFAULT_PAYMENT_TERM: u64 = 36;

/// Promotions running this many months or longer have no end date.
pub const INDEFINITE_PROMOTION_MONTHS: u64 = 999;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum CartView {
    Empty,
    Populated(CartSummary),
}

impl CartView {
    pub fn is_empty(&self) -> bool {
        matches!(self, CartView::Empty)
    }

    pub fn summary(&self) -> Option<&CartSummary> {
        match self {
            CartView::Empty => None,
            CartView::Populated(summary) => Some(summary),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LineKind {
    DevicePayment,
    RatePlan,
    Promotion,
    Insurance,
    ActivationFee,
    ActivationFeeWaiver,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub kind: LineKind,
    pub label: String,
    /// Right-hand column, e.g. `$35`; empty for discount rows
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedPlan {
    pub id: String,
    pub name: String,
    pub monthly_charge: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub nickname: String,
    pub porting_flag: String,
    pub keeps_number: bool,
    pub device_name: String,
    pub brand: String,
    pub capacity: String,
    pub sim_type: String,
    pub color: String,
    pub image: String,
    pub rate_plan: Option<SelectedPlan>,
    pub insurance_plan: Option<SelectedPlan>,
    pub line_items: Vec<LineItem>,
    pub one_time_tax: f64,
    pub one_time_total: f64,
}

impl CartSummary {
    /// `Apple iPhone 15, Black, 128GB with eSIM`
    pub fn device_description(&self) -> String {
        format!(
            "{} {}, {}, {} with {}",
            self.brand, self.device_name, self.color, self.capacity, self.sim_type
        )
    }

    pub fn one_time_tax_display(&self) -> String {
        format!("${:.2}", self.one_time_tax)
    }

    pub fn one_time_total_display(&self) -> String {
        format!("${:.2}", self.one_time_total)
    }

    pub fn promotions(&self) -> impl Iterator<Item = &LineItem> {
        self.line_items
            .iter()
            .filter(|line| line.kind == LineKind::Promotion)
    }
}

/// Build the cart page model from a cart response.
pub fn assemble_cart_view(cart: &Value) -> CartView {
    let Some(item) = cart.pointer("/items/0") else {
        return CartView::Empty;
    };

    let detail = item.get("productDetail").unwrap_or(&Value::Null);
    let variant = item.pointer("/variants/0").unwrap_or(&Value::Null);
    let porting_flag = text(detail.pointer("/portInfo/portingFlag"), DEFAULT_PORTING_FLAG);

    let plans: &[Value] = detail
        .get("servicePlans")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let payment_plan = find_plan(plans, "PaymentPlan");
    let rate_plan = find_plan(plans, "RatePlan");
    let insurance_plan = find_plan(plans, "InsurancePlan");
    let activation_fee = find_plan(plans, "ActivationFee");
    let waive_fee = find_plan(plans, "WaiveActivationFee");

    let selected_rate = rate_plan.and_then(selected_plan);
    let selected_insurance = insurance_plan.and_then(selected_plan);

    let mut line_items = Vec::new();

    if let Some(plan) = payment_plan {
        let charge = monthly_charge(plan);
        let term = plan
            .pointer("/options/0/term")
            .and_then(as_number)
            .filter(|term| *term > 0.0)
            .map(|term| term as u64)
            .unwrap_or(DEFAULT_PAYMENT_TERM);
        line_items.push(LineItem {
            kind: LineKind::DevicePayment,
            label: format!(
                "Device Payment, ${}/mo for {term} months, 0% APR",
                amount(charge)
            ),
            amount: format!("${}", amount(charge)),
            note: None,
        });
    }

    if let Some(plan) = &selected_rate {
        line_items.push(LineItem {
            kind: LineKind::RatePlan,
            label: format!("{} ${}/line", plan.name, amount(plan.monthly_charge)),
            amount: format!("${}", amount(plan.monthly_charge)),
            note: None,
        });
    }

    line_items.extend(
        detail
            .get("promotions")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter(|promo| promo.get("promoDisplayable").and_then(Value::as_bool) == Some(true))
            .map(promotion_line),
    );

    if let Some(plan) = &selected_insurance {
        line_items.push(LineItem {
            kind: LineKind::Insurance,
            label: format!("{}, ${}/mo", plan.name, amount(plan.monthly_charge)),
            amount: format!("${}", amount(plan.monthly_charge)),
            note: None,
        });
    }

    if let Some(fee) = activation_fee {
        line_items.push(LineItem {
            kind: LineKind::ActivationFee,
            label: "One Time Activation Charge".to_string(),
            amount: format!("${}", amount(one_time_charge(fee))),
            note: None,
        });
    }

    if let Some(waiver) = waive_fee {
        let charge = one_time_charge(waiver);
        if charge < 0.0 {
            line_items.push(LineItem {
                kind: LineKind::ActivationFeeWaiver,
                label: format!("${} discount applied", amount(charge.abs())),
                amount: String::new(),
                note: None,
            });
        }
    }

    CartView::Populated(CartSummary {
        nickname: text(detail.get("nickname"), DEFAULT_NICKNAME),
        keeps_number: porting_flag == "Y",
        porting_flag,
        device_name: text(item.get("name"), DEFAULT_DEVICE_NAME),
        brand: text(item.get("brand"), DEFAULT_BRAND),
        capacity: text(variant.get("capacity"), DEFAULT_CAPACITY),
        sim_type: text(detail.get("simType"), DEFAULT_SIM_TYPE),
        color: text(variant.pointer("/color/name"), DEFAULT_COLOR),
        image: text(variant.pointer("/images/primary/url"), DEFAULT_IMAGE),
        rate_plan: selected_rate,
        insurance_plan: selected_insurance,
        line_items,
        one_time_tax: cart.pointer("/price/oneTimeTax").and_then(as_number).unwrap_or_default(),
        one_time_total: cart
            .pointer("/price/oneTimeTotal")
            .and_then(as_number)
            .unwrap_or_default(),
    })
}

fn promotion_line(promo: &Value) -> LineItem {
    let discount = promo
        .pointer("/price/monthlyRecurringCharge")
        .and_then(as_number)
        .unwrap_or_default()
        .abs();
    let note = promo
        .get("durationOfServicePromotion")
        .and_then(as_number)
        .filter(|months| *months < INDEFINITE_PROMOTION_MONTHS as f64)
        .map(|months| format!("Ends {} months after activation", amount(months)));

    LineItem {
        kind: LineKind::Promotion,
        label: format!("${}/mo discount applied", amount(discount)),
        amount: String::new(),
        note,
    }
}

fn find_plan<'a>(plans: &'a [Value], plan_type: &str) -> Option<&'a Value> {
    plans
        .iter()
        .find(|plan| plan.get("type").and_then(Value::as_str) == Some(plan_type))
}

fn selected_plan(plan: &Value) -> Option<SelectedPlan> {
    let selected_id = plan.get("selectedPlanId")?;
    let option = plan
        .get("options")?
        .as_array()?
        .iter()
        .find(|opt| opt.get("id") == Some(selected_id))?;

    Some(SelectedPlan {
        id: scalar_string(selected_id),
        name: option
            .get("name")
            .map(scalar_string)
            .unwrap_or_default(),
        monthly_charge: monthly_charge(plan),
    })
}

fn monthly_charge(plan: &Value) -> f64 {
    plan.pointer("/price/monthlyRecurringCharge")
        .and_then(as_number)
        .unwrap_or_default()
}

fn one_time_charge(plan: &Value) -> f64 {
    plan.pointer("/price/oneTimeCharge")
        .and_then(as_number)
        .unwrap_or_default()
}

/// Numbers may arrive as JSON numbers or numeric strings.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Non-empty string, else `default`.
fn text(value: Option<&Value>, default: &str) -> String {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
        .to_string()
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `35` stays `35`, `17.49` stays `17.49`.
fn amount(value: f64) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cart() -> Value {
        json!({
            "items": [{
                "name": "iPhone 15 Pro",
                "brand": "Apple",
                "variants": [{
                    "capacity": "256GB",
                    "color": { "name": "Blue Titanium" },
                    "images": { "primary": { "url": "/images/blue.png" } }
                }],
                "productDetail": {
                    "nickname": "Dana",
                    "portInfo": { "portingFlag": "Y" },
                    "simType": "eSIM",
                    "servicePlans": [
                        { "type": "PaymentPlan", "options": [{ "id": "RECURRING", "term": 24 }],
                          "selectedPlanId": "RECURRING",
                          "price": { "monthlyRecurringCharge": 41.62 } },
                        { "type": "RatePlan",
                          "options": [{ "id": "PLAN_A", "name": "Unlimited" },
                                      { "id": "PLAN_B", "name": "By the Gig" }],
                          "selectedPlanId": "PLAN_A",
                          "price": { "monthlyRecurringCharge": 30 } },
                        { "type": "RatePlan",
                          "options": [{ "id": "PLAN_X", "name": "Ignored" }],
                          "selectedPlanId": "PLAN_X",
                          "price": { "monthlyRecurringCharge": 99 } },
                        { "type": "InsurancePlan",
                          "options": [{ "id": "INS_1", "name": "Mobile Care" }],
                          "selectedPlanId": "INS_1",
                          "price": { "monthlyRecurringCharge": 12.99 } },
                        { "type": "ActivationFee", "price": { "oneTimeCharge": 35 } },
                        { "type": "WaiveActivationFee", "price": { "oneTimeCharge": -35 } }
                    ],
                    "promotions": [
                        { "promoDisplayable": true, "durationOfServicePromotion": 24,
                          "price": { "monthlyRecurringCharge": -10 } },
                        { "promoDisplayable": true, "durationOfServicePromotion": 999,
                          "price": { "monthlyRecurringCharge": -5 } },
                        { "promoDisplayable": false, "durationOfServicePromotion": 12,
                          "price": { "monthlyRecurringCharge": -20 } }
                    ]
                }
            }],
            "price": { "oneTimeTotal": 3.5, "oneTimeTax": 0.5 }
        })
    }

    fn labels(summary: &CartSummary) -> Vec<&str> {
        summary.line_items.iter().map(|l| l.label.as_str()).collect()
    }

    #[test]
    fn test_empty_carts() {
        assert!(assemble_cart_view(&json!({ "items": [] })).is_empty());
        assert!(assemble_cart_view(&Value::Null).is_empty());
        assert!(assemble_cart_view(&json!({})).is_empty());
        assert!(assemble_cart_view(&json!({ "items": "nope" })).is_empty());
    }

    #[test]
    fn test_full_cart() {
        let view = assemble_cart_view(&cart());
        let summary = view.summary().unwrap();

        assert_eq!(summary.nickname, "Dana");
        assert!(summary.keeps_number);
        assert_eq!(
            summary.device_description(),
            "Apple iPhone 15 Pro, Blue Titanium, 256GB with eSIM"
        );
        assert_eq!(summary.image, "/images/blue.png");
        assert_eq!(
            labels(summary),
            vec![
                "Device Payment, $41.62/mo for 24 months, 0% APR",
                "Unlimited $30/line",
                "$10/mo discount applied",
                "$5/mo discount applied",
                "Mobile Care, $12.99/mo",
                "One Time Activation Charge",
                "$35 discount applied",
            ]
        );
        assert_eq!(summary.rate_plan.as_ref().map(|p| p.id.as_str()), Some("PLAN_A"));
        assert_eq!(summary.one_time_total_display(), "$3.50");
        assert_eq!(summary.one_time_tax_display(), "$0.50");
    }

    #[test]
    fn test_promotion_end_note() {
        let view = assemble_cart_view(&cart());
        let notes: Vec<Option<&str>> = view
            .summary()
            .unwrap()
            .promotions()
            .map(|p| p.note.as_deref())
            .collect();

        assert_eq!(notes, vec![Some("Ends 24 months after activation"), None]);
    }

    #[test]
    fn test_defaults_for_bare_item() {
        let view = assemble_cart_view(&json!({ "items": [{}] }));
        let summary = view.summary().unwrap();

        assert_eq!(summary.nickname, "test67");
        assert_eq!(summary.porting_flag, "N");
        assert!(!summary.keeps_number);
        assert_eq!(
            summary.device_description(),
            "Apple iPhone 15, Black, 128GB with eSIM"
        );
        assert_eq!(summary.image, "/images/iphone15.png");
        assert!(summary.line_items.is_empty());
        assert_eq!(summary.one_time_total_display(), "$0.00");
    }

    #[test]
    fn test_unmatched_selection_and_positive_waiver_are_omitted() {
        let cart = json!({
            "items": [{
                "productDetail": {
                    "servicePlans": [
                        { "type": "PaymentPlan", "price": { "monthlyRecurringCharge": 20 } },
                        { "type": "RatePlan", "options": [{ "id": "PLAN_A", "name": "Unlimited" }],
                          "selectedPlanId": "PLAN_Z", "price": { "monthlyRecurringCharge": 30 } },
                        { "type": "WaiveActivationFee", "price": { "oneTimeCharge": 0 } }
                    ]
                }
            }]
        });
        let view = assemble_cart_view(&cart);
        let summary = view.summary().unwrap();

        assert_eq!(
            labels(summary),
            vec!["Device Payment, $20/mo for 36 months, 0% APR"]
        );
        assert!(summary.rate_plan.is_none());
    }

    #[test]
    fn test_malformed_fields_fall_back() {
        let cart = json!({
            "items": [{
                "name": 42,
                "variants": "none",
                "productDetail": { "servicePlans": { "type": "RatePlan" }, "promotions": [1, null] }
            }],
            "price": { "oneTimeTotal": "12.5", "oneTimeTax": [] }
        });
        let view = assemble_cart_view(&cart);
        let summary = view.summary().unwrap();

        assert_eq!(summary.device_name, "iPhone 15");
        assert!(summary.line_items.is_empty());
        assert_eq!(summary.one_time_total_display(), "$12.50");
        assert_eq!(summary.one_time_tax, 0.0);
    }

    #[test]
    fn test_view_json_shape() {
        let value = serde_json::to_value(assemble_cart_view(&json!({ "items": [] }))).unwrap();
        assert_eq!(value, json!({ "status": "empty" }));

        let value = serde_json::to_value(assemble_cart_view(&cart())).unwrap();
        assert_eq!(value["status"], json!("populated"));
        assert_eq!(value["lineItems"][0]["kind"], json!("devicePayment"));
    }
}
