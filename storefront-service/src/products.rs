use anyhow::{Context, Result};
use buy_flow::{Phone, PlanCatalog};

const PHONES_JSON: &str = include_str!("../data/phones.json");
const PLANS_JSON: &str = include_str!("../data/plans.json");

/// Phones and plans offered by the storefront
#[derive(Debug, Clone)]
pub struct ProductCatalog {
    phones: Vec<Phone>,
    plans: PlanCatalog,
}

impl ProductCatalog {
    pub fn new(phones: Vec<Phone>, plans: PlanCatalog) -> Self {
        Self { phones, plans }
    }

    /// Catalog shipped with the binary.
    pub fn bundled() -> Result<Self> {
        let phones = serde_json::from_str(PHONES_JSON).context("Failed to parse phone catalog")?;
        let plans = serde_json::from_str(PLANS_JSON).context("Failed to parse plan catalog")?;
        Ok(Self::new(phones, plans))
    }

    pub fn phones(&self) -> &[Phone] {
        &self.phones
    }

    pub fn plans(&self) -> &PlanCatalog {
        &self.plans
    }

    pub fn phone(&self, id: &str) -> Option<&Phone> {
        self.phones.iter().find(|phone| phone.id == id)
    }

    pub fn by_brand(&self, brand: &str) -> Vec<&Phone> {
        self.phones
            .iter()
            .filter(|phone| phone.brand.eq_ignore_ascii_case(brand))
            .collect()
    }

    /// Distinct brands in catalog order.
    pub fn brands(&self) -> Vec<&str> {
        let mut brands: Vec<&str> = Vec::new();
        for phone in &self.phones {
            if !brands.contains(&phone.brand.as_str()) {
                brands.push(&phone.brand);
            }
        }
        brands
    }

    pub fn search(&self, term: &str) -> Vec<&Phone> {
        let term = term.trim();
        if term.is_empty() {
            return Vec::new();
        }
        self.phones
            .iter()
            .filter(|phone| phone.matches_search(term))
            .collect()
    }

    pub fn with_promotions(&self) -> Vec<&Phone> {
        self.phones
            .iter()
            .filter(|phone| phone.has_promotion())
            .collect()
    }
}
