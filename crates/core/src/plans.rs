//! Static subscription plan catalogue.

use serde::Serialize;

pub const PLAN_STARTER: &str = "starter";
pub const PLAN_PRO: &str = "pro";
pub const PLAN_SCALE: &str = "scale";

/// A purchasable subscription tier.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub id: &'static str,
    pub name: &'static str,
    /// Monthly price in whole currency units.
    pub price: u32,
    pub currency: &'static str,
    /// Credits granted when a subscription payment completes.
    pub credits: i32,
    pub features: &'static [&'static str],
    pub popular: bool,
}

pub const PLANS: &[Plan] = &[
    Plan {
        id: PLAN_STARTER,
        name: "Starter",
        price: 47,
        currency: "BRL",
        credits: 500,
        features: &[
            "5 projects",
            "Unlimited deploys",
            "Automatic SSL",
            "Email support",
        ],
        popular: false,
    },
    Plan {
        id: PLAN_PRO,
        name: "Pro",
        price: 97,
        currency: "BRL",
        credits: 2000,
        features: &[
            "20 projects",
            "Unlimited deploys",
            "Automatic SSL",
            "Custom domain",
            "Priority support",
            "Code export",
        ],
        popular: true,
    },
    Plan {
        id: PLAN_SCALE,
        name: "Scale",
        price: 297,
        currency: "BRL",
        credits: 10000,
        features: &[
            "Unlimited projects",
            "Unlimited deploys",
            "Automatic SSL",
            "Custom domain",
            "Dedicated support",
            "Code export",
            "GitHub integration",
            "White label",
        ],
        popular: false,
    },
];

/// Look up a plan by id.
pub fn find_plan(id: &str) -> Option<&'static Plan> {
    PLANS.iter().find(|p| p.id == id)
}

/// `true` if `id` names a known plan tier.
pub fn is_valid_plan(id: &str) -> bool {
    find_plan(id).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_lists_three_tiers() {
        let ids: Vec<&str> = PLANS.iter().map(|p| p.id).collect();
        assert_eq!(ids, [PLAN_STARTER, PLAN_PRO, PLAN_SCALE]);
    }

    #[test]
    fn exactly_one_plan_is_popular() {
        assert_eq!(PLANS.iter().filter(|p| p.popular).count(), 1);
    }

    #[test]
    fn find_plan_by_id() {
        assert_eq!(find_plan(PLAN_PRO).map(|p| p.credits), Some(2000));
        assert!(find_plan("enterprise").is_none());
        assert!(!is_valid_plan(""));
    }
}
