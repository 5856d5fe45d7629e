//! Backend and provider wiring for the browser

use checkout_core::Product;
use checkout_http::{HttpBackendConfig, HttpPaymentBackend};

/// Stripe publishable key baked in at build time
pub fn publishable_key() -> &'static str {
    option_env!("STRIPE_PUBLISHABLE_KEY").unwrap_or("pk_test_placeholder")
}

/// Payment service on the page's own origin
pub fn payment_backend() -> HttpPaymentBackend {
    let origin = web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_else(|| "http://localhost:3000".into());

    HttpPaymentBackend::from_config(HttpBackendConfig {
        base_url: format!("{origin}/api/payments"),
        bearer_token: None,
    })
}

/// Upgrade offers shown on the pricing page
pub fn catalogue() -> Vec<Product> {
    vec![
        Product::subscription("proMonthly", "plan_pro_monthly", 1500)
            .with_description("PRO access, billed monthly"),
        Product::subscription("proQuarterly", "plan_pro_quarterly", 3500)
            .with_description("PRO access, billed every 3 months"),
        Product::order("proLifetime", "sku_pro_lifetime", 25000)
            .with_description("Lifetime PRO access"),
    ]
}
