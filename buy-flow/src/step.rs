use serde::{Deserialize, Serialize};

/// Pages of the buy flow, in the order a customer walks through them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowStep {
    #[default]
    PhoneSelection,
    Plans,
    Cart,
    CustomerCheck,
    SignIn,
    IdentityProtection,
    Checkout,
}

impl FlowStep {
    pub const ORDER: [FlowStep; 7] = [
        FlowStep::PhoneSelection,
        FlowStep::Plans,
        FlowStep::Cart,
        FlowStep::CustomerCheck,
        FlowStep::SignIn,
        FlowStep::IdentityProtection,
        FlowStep::Checkout,
    ];

    fn position(self) -> usize {
        Self::ORDER
            .iter()
            .position(|step| *step == self)
            .unwrap_or_default()
    }

    /// Following step; `None` once checkout is reached.
    pub fn next(self) -> Option<FlowStep> {
        Self::ORDER.get(self.position() + 1).copied()
    }

    /// Step the "back" link leads to; `None` on the first page.
    pub fn previous(self) -> Option<FlowStep> {
        self.position()
            .checked_sub(1)
            .and_then(|idx| Self::ORDER.get(idx).copied())
    }
}
