//! Addresses and plans served by the local fixture pricing site.

use crate::FuelType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressSuggestion {
    pub label: String,
    pub postcode: String,
}

/// One row of the pricing results table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRow {
    pub plan_name: String,
    pub fuel: FuelType,
    /// Plan BPID/EFS identifier, also the fact sheet's file name.
    pub bpid: String,
    pub distributor: String,
    pub postcode: String,
}

impl PlanRow {
    pub fn pdf_path(&self) -> String {
        format!("/plans/{}.pdf", self.bpid)
    }
}

// The site formats addresses without the comma before the state, so an
// exact search for "..., Balwyn North, VIC 3104" only matches fuzzily.
const ADDRESSES: &[(&str, &str)] = &[
    ("17 Bolinda Road, Balwyn North VIC 3104", "3104"),
    ("17 Bolinda Court, Balwyn North VIC 3104", "3104"),
    ("1 Bolinda Street, Bundoora VIC 3083", "3083"),
    ("42 Wallaby Way, Sydney NSW 2000", "2000"),
];

const PLANS: &[(&str, FuelType, &str, &str, &str)] = &[
    ("Origin Go Variable", FuelType::Electricity, "ORI2201EE", "CitiPower", "3104"),
    ("Origin Solar Boost", FuelType::Electricity, "ORI2202EE", "CitiPower", "3104"),
    ("Origin Basic Gas", FuelType::Gas, "ORI2201GS", "Multinet", "3104"),
    ("Origin Everyday Gas Saver", FuelType::Gas, "ORI2202GS", "Multinet", "3104"),
    ("Origin Go Variable", FuelType::Electricity, "ORI2301EE", "Jemena", "3083"),
    ("Origin Basic Gas", FuelType::Gas, "ORI2301GS", "AusNet", "3083"),
    ("Origin Go Variable", FuelType::Electricity, "ORI2401EE", "Ausgrid", "2000"),
];

/// Addresses whose label contains the street part of `query`, ignoring case.
pub fn suggest_addresses(query: &str) -> Vec<AddressSuggestion> {
    let street = query.split(',').next().unwrap_or_default().trim().to_lowercase();
    if street.len() < 3 {
        return Vec::new();
    }
    ADDRESSES
        .iter()
        .filter(|(label, _)| label.to_lowercase().contains(&street))
        .map(|(label, postcode)| AddressSuggestion {
            label: label.to_string(),
            postcode: postcode.to_string(),
        })
        .collect()
}

/// Plans available at `postcode`, electricity plans first.
pub fn plans_for(postcode: &str, electricity: bool, gas: bool) -> Vec<PlanRow> {
    all_plans()
        .filter(|plan| plan.postcode == postcode)
        .filter(|plan| match plan.fuel {
            FuelType::Electricity => electricity,
            FuelType::Gas => gas,
        })
        .collect()
}

pub fn find_plan(bpid: &str) -> Option<PlanRow> {
    all_plans().find(|plan| plan.bpid.eq_ignore_ascii_case(bpid))
}

fn all_plans() -> impl Iterator<Item = PlanRow> {
    PLANS
        .iter()
        .map(|&(plan_name, fuel, bpid, distributor, postcode)| PlanRow {
            plan_name: plan_name.to_string(),
            fuel,
            bpid: bpid.to_string(),
            distributor: distributor.to_string(),
            postcode: postcode.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{match_suggestion, SuggestionMatch, DEFAULT_ADDRESS};

    #[test]
    fn default_address_matches_fuzzily() {
        let labels: Vec<_> = suggest_addresses(DEFAULT_ADDRESS)
            .into_iter()
            .map(|suggestion| suggestion.label)
            .collect();
        assert_eq!(labels, ["17 Bolinda Road, Balwyn North VIC 3104"]);
        assert_eq!(
            match_suggestion(&labels, DEFAULT_ADDRESS),
            Some(SuggestionMatch::StreetAndSuburb(0))
        );
    }

    #[test]
    fn short_queries_suggest_nothing() {
        assert!(suggest_addresses("17").is_empty());
        assert_eq!(suggest_addresses("bolinda").len(), 3);
    }

    #[test]
    fn electricity_rows_come_first() {
        let plans = plans_for("3104", true, true);
        assert_eq!(plans.len(), 4);
        assert_eq!(plans[0].fuel, FuelType::Electricity);

        let gas_only = plans_for("3104", false, true);
        assert_eq!(gas_only[0].bpid, "ORI2201GS");
        assert!(gas_only.iter().all(|plan| plan.fuel == FuelType::Gas));

        assert!(plans_for("3104", false, false).is_empty());
    }

    #[test]
    fn finds_plans_case_insensitively() {
        let plan = find_plan("ori2201gs").unwrap();
        assert_eq!(plan.pdf_path(), "/plans/ORI2201GS.pdf");
        assert_eq!(find_plan("nope"), None);
    }
}
