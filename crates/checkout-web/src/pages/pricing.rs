//! Pricing Page

use checkout_core::{pricing, Product, ProductKind, ProductSelection};
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api;
use crate::components::PaymentForm;

fn price_label(product: &Product) -> String {
    let suffix = match (&product.kind, product.id.as_str()) {
        (ProductKind::Subscription, "proQuarterly") => "/quarter",
        (ProductKind::Subscription, _) => "/month",
        _ => " once",
    };
    format!("${}{suffix}", pricing::format_major_units(product.price))
}

#[component]
pub fn PricingPage() -> impl IntoView {
    let products = ProductSelection::new();
    let selection = StoredValue::new_local(products.clone());

    // Follow the shared channel so the checkout's post-success clear shows up
    let (selected, set_selected) = signal(None::<String>);
    let mut published = products.subscribe();
    spawn_local(async move {
        while published.changed().await.is_ok() {
            let id = published.borrow_and_update().as_ref().map(|p| p.id.clone());
            set_selected.set(id);
        }
    });

    let choose = move |product: Product| {
        selection.with_value(|s| s.select(Some(product)));
    };

    let plans = api::catalogue()
        .into_iter()
        .map(|product| {
            let id = product.id.clone();
            let price = price_label(&product);
            let description = product.description.clone();
            view! {
                <div class="plan" class:selected=move || selected.get().as_deref() == Some(id.as_str())>
                    <h2>{description}</h2>
                    <div class="price">{price}</div>
                    <button class="btn btn-primary" on:click=move |_| choose(product.clone())>
                        "Select"
                    </button>
                </div>
            }
        })
        .collect_view();

    view! {
        <div class="pricing">
            <h1>"Upgrade to PRO"</h1>
            <p class="subtitle">"Pick a plan, then pay by card or PayPal"</p>

            <div class="plans">{plans}</div>

            <Show when=move || selected.with(Option::is_some)>
                <p class="hint">"Enter your card below"</p>
            </Show>
            <PaymentForm products=products allow_coupons=true />
        </div>
    }
}
