//! Page Components

mod pricing;

pub use pricing::PricingPage;
