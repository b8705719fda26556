//! Browser-free pieces of the pricing page suite, shared by the test runner
//! and the local fixture site.

pub mod address;
pub mod files;
pub mod fixtures;
pub mod pdf_fixture;
pub mod pdf_text;
pub mod plan_profile;

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Fuel a retail plan is sold for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuelType {
    Electricity,
    Gas,
}

impl FuelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FuelType::Electricity => "Electricity",
            FuelType::Gas => "Gas",
        }
    }

    pub fn other(&self) -> FuelType {
        match self {
            FuelType::Electricity => FuelType::Gas,
            FuelType::Gas => FuelType::Electricity,
        }
    }
}

impl Display for FuelType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
