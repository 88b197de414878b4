//! Plan selection submission: validate the plans form, record the choice in the
//! buy-flow state and build the add-to-cart payload.

use serde::{Deserialize, Serialize};

use crate::{
    catalog::{PlanCatalog, PlanOption},
    state::{
        BuyFlowState, InsurancePlanDetailsPatch, PlanDetailsPatch, PortInDetailsPatch, set,
    },
    validation::{SelectionError, is_valid_mobile_number},
};

pub const DEFAULT_DEVICE_SKU: &str = "195949035005";
pub const FULFILLMENT_SHIP_TO_HOME: &str = "SHIP_TO_HOME";
pub const NO_PROTECTION: &str = "none";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NumberChoice {
    /// Assign a new number
    New,
    /// Port the customer's existing number
    Keep,
}

/// The plans page form as submitted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSelectionForm {
    #[serde(default)]
    pub rate_plan_id: Option<String>,
    #[serde(default)]
    pub number_choice: Option<NumberChoice>,
    #[serde(default)]
    pub mobile_number: Option<String>,
    #[serde(default)]
    pub device_for: String,
    /// Protection plan id, or `"none"`
    #[serde(default)]
    pub protection_plan_id: Option<String>,
}

impl PlanSelectionForm {
    fn keeps_number(&self) -> bool {
        self.number_choice == Some(NumberChoice::Keep)
    }

    fn protection(&self) -> Option<&str> {
        self.protection_plan_id
            .as_deref()
            .filter(|id| !id.is_empty() && *id != NO_PROTECTION)
    }

    /// Checks run in page order; the first failure is reported.
    pub fn validate(&self) -> Result<(), SelectionError> {
        if self.rate_plan_id.as_deref().is_none_or(str::is_empty) {
            return Err(SelectionError::MissingRatePlan);
        }
        if self.number_choice.is_none() {
            return Err(SelectionError::MissingNumberOption);
        }
        if self.keeps_number()
            && !self
                .mobile_number
                .as_deref()
                .is_some_and(is_valid_mobile_number)
        {
            return Err(SelectionError::InvalidMobileNumber);
        }
        if self.device_for.trim().is_empty() {
            return Err(SelectionError::MissingDeviceFor);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortInfo {
    pub porting_flag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePlanSelection {
    pub plan_type: String,
    pub selected_plan_id: String,
}

impl ServicePlanSelection {
    fn new(plan_type: &str, selected_plan_id: &str) -> Self {
        Self {
            plan_type: plan_type.to_string(),
            selected_plan_id: selected_plan_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    pub nickname: String,
    pub port_info: PortInfo,
    pub service_plans: Vec<ServicePlanSelection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub item_type: String,
    #[serde(rename = "type")]
    pub sale_type: String,
    pub sku: String,
    pub product_detail: ProductDetail,
    pub sim_type: String,
}

/// Body of the add-to-cart request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartPayload {
    pub fulfillment_method: String,
    pub items: Vec<CartItem>,
}

impl CartPayload {
    pub fn selected_plan_id(&self, plan_type: &str) -> Option<&str> {
        self.items
            .first()?
            .product_detail
            .service_plans
            .iter()
            .find(|plan| plan.plan_type == plan_type)
            .map(|plan| plan.selected_plan_id.as_str())
    }
}

/// Everything a valid plans form produces
#[derive(Debug, Clone, PartialEq)]
pub struct PlanSubmission {
    pub plan: PlanDetailsPatch,
    pub port_in: PortInDetailsPatch,
    pub insurance: InsurancePlanDetailsPatch,
    pub payload: CartPayload,
}

impl PlanSubmission {
    /// State with the plan, port-in and protection choices recorded.
    pub fn apply_to(&self, state: &BuyFlowState) -> BuyFlowState {
        state
            .update_plan_details(&self.plan)
            .update_port_in_details(&self.port_in)
            .update_insurance_plan_details(&self.insurance)
    }
}

fn price_string(option: &PlanOption) -> String {
    option.price.monthly().to_string()
}

/// Validate `form` against the catalog and derive the state patches and cart
/// payload. The state itself is not touched.
pub fn prepare_plan_submission(
    catalog: &PlanCatalog,
    form: &PlanSelectionForm,
) -> Result<PlanSubmission, SelectionError> {
    form.validate()?;

    let rate_plan_id = form.rate_plan_id.as_deref().unwrap_or_default();
    let rate_plan = catalog
        .rate_plan(rate_plan_id)
        .ok_or_else(|| SelectionError::UnknownRatePlan(rate_plan_id.to_string()))?;

    let protection = form
        .protection()
        .map(|id| {
            catalog
                .insurance_plan(id)
                .ok_or_else(|| SelectionError::UnknownProtectionPlan(id.to_string()))
        })
        .transpose()?;

    let keeps_number = form.keeps_number();

    let plan = PlanDetailsPatch {
        plan_id: set(&rate_plan.id),
        plan_name: set(&rate_plan.name),
        plan_price: set(price_string(rate_plan)),
        data_allowance: set(rate_plan.description.as_deref().unwrap_or_default()),
    };

    let port_in = PortInDetailsPatch {
        is_porting_number: Some(keeps_number),
        current_carrier: set(""),
        phone_number: set(if keeps_number {
            form.mobile_number.as_deref().unwrap_or_default()
        } else {
            ""
        }),
        account_number: set(""),
        pin: None,
    };

    let insurance = match protection {
        Some(option) => InsurancePlanDetailsPatch {
            has_insurance: Some(true),
            insurance_plan_id: set(&option.id),
            insurance_plan_name: set(&option.name),
            insurance_price: set(price_string(option)),
        },
        None => InsurancePlanDetailsPatch {
            has_insurance: Some(false),
            insurance_plan_id: set(""),
            insurance_plan_name: set(""),
            insurance_price: set("0"),
        },
    };

    let mut service_plans = vec![
        ServicePlanSelection::new("RatePlan", &rate_plan.id),
        ServicePlanSelection::new("PaymentPlan", "RECURRING"),
        ServicePlanSelection::new("ActivationFee", "ActivationFee"),
        ServicePlanSelection::new("WaiveActivationFee", "WaiveActivationFee"),
    ];
    if let Some(option) = protection {
        service_plans.push(ServicePlanSelection::new("InsurancePlan", &option.id));
    }

    let payload = CartPayload {
        fulfillment_method: FULFILLMENT_SHIP_TO_HOME.to_string(),
        items: vec![CartItem {
            item_type: "DEVICE".to_string(),
            sale_type: "SALES".to_string(),
            sku: DEFAULT_DEVICE_SKU.to_string(),
            product_detail: ProductDetail {
                nickname: form.device_for.clone(),
                port_info: PortInfo {
                    porting_flag: if keeps_number { "Y" } else { "N" }.to_string(),
                },
                service_plans,
            },
            sim_type: "eSIM".to_string(),
        }],
    };

    Ok(PlanSubmission {
        plan,
        port_in,
        insurance,
        payload,
    })
}
