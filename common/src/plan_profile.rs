//! Decides whether extracted fact sheet text describes a gas or an
//! electricity plan.

use crate::FuelType;
use regex::{Regex, RegexBuilder};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileMismatch {
    #[error("PDF is missing required {fuel}-plan marker: {pattern}")]
    MissingRequired { fuel: FuelType, pattern: String },

    #[error("PDF did not contain any strong {fuel}-plan markers. Looked for: {patterns}")]
    NoStrongMarker { fuel: FuelType, patterns: String },

    #[error("PDF appears to be {found} (should be {fuel}). Matched: {pattern}")]
    WrongFuel {
        fuel: FuelType,
        found: FuelType,
        pattern: String,
    },
}

/// Markers a plan's fact sheet must, may and must not contain.
#[derive(Debug, Clone)]
pub struct PlanProfile {
    fuel: FuelType,
    must_have_all: Vec<Regex>,
    must_have_any: Vec<Regex>,
    must_not_have: Vec<Regex>,
}

impl PlanProfile {
    pub fn gas() -> Self {
        PlanProfile {
            fuel: FuelType::Gas,
            must_have_all: patterns(&[r"fuel\s*type\s*gas"]),
            must_have_any: patterns(&[
                r"estimated\s*gas\s*cost",
                r"this\s+gas\s+offer",
                r"gas\s+charges",
                r"\bnatural\s+gas\b",
            ]),
            must_not_have: patterns(&[r"fuel\s*type\s*electricity"]),
        }
    }

    pub fn electricity() -> Self {
        PlanProfile {
            fuel: FuelType::Electricity,
            must_have_all: patterns(&[r"fuel\s*type\s*electricity"]),
            must_have_any: patterns(&[
                r"estimated\s*electricity\s*cost",
                r"this\s+electricity\s+offer",
                r"electricity\s+charges",
            ]),
            must_not_have: patterns(&[r"fuel\s*type\s*gas"]),
        }
    }

    /// Reports the first rule `text` breaks.
    pub fn check(&self, text: &str) -> Result<(), ProfileMismatch> {
        let text = text.to_lowercase();

        if let Some(missing) = self.must_have_all.iter().find(|p| !p.is_match(&text)) {
            return Err(ProfileMismatch::MissingRequired {
                fuel: self.fuel,
                pattern: display_pattern(missing),
            });
        }

        if !self.must_have_any.iter().any(|p| p.is_match(&text)) {
            return Err(ProfileMismatch::NoStrongMarker {
                fuel: self.fuel,
                patterns: self
                    .must_have_any
                    .iter()
                    .map(display_pattern)
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }

        if let Some(forbidden) = self.must_not_have.iter().find(|p| p.is_match(&text)) {
            return Err(ProfileMismatch::WrongFuel {
                fuel: self.fuel,
                found: self.fuel.other(),
                pattern: display_pattern(forbidden),
            });
        }

        Ok(())
    }

    pub fn matches(&self, text: &str) -> bool {
        self.check(text).is_ok()
    }
}

/// The fuel whose profile `text` satisfies, if exactly one does.
pub fn classify(text: &str) -> Option<FuelType> {
    match (
        PlanProfile::gas().matches(text),
        PlanProfile::electricity().matches(text),
    ) {
        (true, false) => Some(FuelType::Gas),
        (false, true) => Some(FuelType::Electricity),
        _ => None,
    }
}

/// `/source/i`, the way markers appear in mismatch messages.
fn display_pattern(pattern: &Regex) -> String {
    format!("/{}/i", pattern)
}

fn patterns(sources: &[&str]) -> Vec<Regex> {
    sources
        .iter()
        .map(|source| {
            RegexBuilder::new(source)
                .case_insensitive(true)
                .build()
                .expect("static plan marker is a valid pattern")
        })
        .collect()
}
