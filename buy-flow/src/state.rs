//! Buy-flow state: six independent sections updated through shallow-merge patches.
//!
//! A [`BuyFlowState`] is a plain value. Every update returns a new snapshot and
//! leaves the receiver untouched, so callers decide when a snapshot becomes the
//! current one (the session runner does that in a single load, apply, save step).
//!
//! Patches distinguish "leave untouched" from "set to null": a nullable field is
//! `Option<Option<String>>`, where `None` keeps the current value and `Some(None)`
//! clears it. In JSON an absent key keeps the value and an explicit `null` clears it.

use serde::{Deserialize, Deserializer, Serialize};

/// Shorthand for a patch value that overwrites a nullable field.
pub fn set(value: impl Into<String>) -> Option<Option<String>> {
    Some(Some(value.into()))
}

/// Shorthand for a patch value that resets a nullable field to null.
pub fn unset() -> Option<Option<String>> {
    Some(None)
}

fn nullable<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

macro_rules! section {
    (
        $(#[$meta:meta])*
        $name:ident, $patch:ident {
            flags: [$($flag:ident),*],
            fields: [$($field:ident),* $(,)?] $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $name {
            $(pub $flag: bool,)*
            $(pub $field: Option<String>,)*
        }

        #[doc = concat!("Partial update for [`", stringify!($name), "`].")]
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $patch {
            $(
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $flag: Option<bool>,
            )*
            $(
                #[serde(
                    default,
                    skip_serializing_if = "Option::is_none",
                    deserialize_with = "nullable"
                )]
                pub $field: Option<Option<String>>,
            )*
        }

        impl $name {
            /// Shallow merge: fields absent from the patch keep their current value.
            pub fn merged(&self, patch: &$patch) -> Self {
                let mut next = self.clone();
                $(
                    if let Some(value) = patch.$flag {
                        next.$flag = value;
                    }
                )*
                $(
                    if let Some(value) = &patch.$field {
                        next.$field = value.clone();
                    }
                )*
                next
            }
        }
    };
}

section! {
    /// The handset being bought and the options picked for it
    PhoneDetails, PhoneDetailsPatch {
        flags: [],
        fields: [
            phone_id,
            phone_brand,
            phone_model,
            phone_image,
            selected_color,
            selected_color_hex,
            selected_storage,
            full_price,
            monthly_price,
        ],
    }
}

section! {
    /// Device the customer hands in for credit
    TradeInDetails, TradeInDetailsPatch {
        flags: [has_trade_in],
        fields: [trade_in_device, trade_in_value, trade_in_condition],
    }
}

section! {
    /// Selected rate plan
    PlanDetails, PlanDetailsPatch {
        flags: [],
        fields: [plan_id, plan_name, plan_price, data_allowance],
    }
}

section! {
    /// Number carried over from another carrier
    PortInDetails, PortInDetailsPatch {
        flags: [is_porting_number],
        fields: [current_carrier, phone_number, account_number, pin],
    }
}

section! {
    /// Device protection choice
    InsurancePlanDetails, InsurancePlanDetailsPatch {
        flags: [has_insurance],
        fields: [insurance_plan_id, insurance_plan_name, insurance_price],
    }
}

section! {
    CustomerDetails, CustomerDetailsPatch {
        flags: [is_existing_customer],
        fields: [first_name, last_name, email, phone_number],
    }
}

/// Everything the customer has chosen so far in one browsing session.
///
/// No cross-section consistency is enforced: `has_trade_in == false` with a
/// populated `trade_in_device` is a valid snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyFlowState {
    pub phone_details: PhoneDetails,
    pub trade_in_details: TradeInDetails,
    pub plan_details: PlanDetails,
    pub port_in_details: PortInDetails,
    pub insurance_plan_details: InsurancePlanDetails,
    pub customer_details: CustomerDetails,
}

impl BuyFlowState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_phone_details(&self, patch: &PhoneDetailsPatch) -> Self {
        Self {
            phone_details: self.phone_details.merged(patch),
            ..self.clone()
        }
    }

    pub fn update_trade_in_details(&self, patch: &TradeInDetailsPatch) -> Self {
        Self {
            trade_in_details: self.trade_in_details.merged(patch),
            ..self.clone()
        }
    }

    pub fn update_plan_details(&self, patch: &PlanDetailsPatch) -> Self {
        Self {
            plan_details: self.plan_details.merged(patch),
            ..self.clone()
        }
    }

    pub fn update_port_in_details(&self, patch: &PortInDetailsPatch) -> Self {
        Self {
            port_in_details: self.port_in_details.merged(patch),
            ..self.clone()
        }
    }

    pub fn update_insurance_plan_details(&self, patch: &InsurancePlanDetailsPatch) -> Self {
        Self {
            insurance_plan_details: self.insurance_plan_details.merged(patch),
            ..self.clone()
        }
    }

    pub fn update_customer_details(&self, patch: &CustomerDetailsPatch) -> Self {
        Self {
            customer_details: self.customer_details.merged(patch),
            ..self.clone()
        }
    }

    /// Drops the trade-in section back to its defaults.
    pub fn remove_trade_in(&self) -> Self {
        Self {
            trade_in_details: TradeInDetails::default(),
            ..self.clone()
        }
    }

    /// Start over: every section back to its defaults.
    pub fn clear_buy_flow(&self) -> Self {
        Self::default()
    }

    pub fn apply(&self, update: &BuyFlowUpdate) -> Self {
        match update {
            BuyFlowUpdate::PhoneDetails(patch) => self.update_phone_details(patch),
            BuyFlowUpdate::TradeInDetails(patch) => self.update_trade_in_details(patch),
            BuyFlowUpdate::PlanDetails(patch) => self.update_plan_details(patch),
            BuyFlowUpdate::PortInDetails(patch) => self.update_port_in_details(patch),
            BuyFlowUpdate::InsurancePlanDetails(patch) => self.update_insurance_plan_details(patch),
            BuyFlowUpdate::CustomerDetails(patch) => self.update_customer_details(patch),
            BuyFlowUpdate::Clear => self.clear_buy_flow(),
        }
    }
}

/// One section-scoped mutation, serializable so it can travel over HTTP.
///
/// JSON shape: `{"section": "planDetails", "data": {"planId": "PLAN_A"}}`,
/// or `{"section": "clear"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "section", content = "data", rename_all = "camelCase")]
pub enum BuyFlowUpdate {
    PhoneDetails(PhoneDetailsPatch),
    TradeInDetails(TradeInDetailsPatch),
    PlanDetails(PlanDetailsPatch),
    PortInDetails(PortInDetailsPatch),
    InsurancePlanDetails(InsurancePlanDetailsPatch),
    CustomerDetails(CustomerDetailsPatch),
    Clear,
}
