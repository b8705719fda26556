pub mod pricing_page;

pub use pricing_page::{PlanTab, PricingPage};
