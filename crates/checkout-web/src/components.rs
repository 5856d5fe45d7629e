//! UI Components

use std::rc::Rc;

use checkout_core::{
    Checkout, CheckoutAction, CheckoutConfig, CheckoutError, CheckoutModel, Notification,
    ProductSelection,
};
use futures::future::{abortable, AbortHandle};
use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api;
use crate::paypal::PaypalWalletAdapter;
use crate::services::{FirebaseAnalytics, ToastNotifier};
use crate::stripe::StripeCardAdapter;

fn build_checkout(
    config: CheckoutConfig,
    products: ProductSelection,
    toast: RwSignal<Option<Notification>>,
) -> checkout_core::Result<Rc<Checkout>> {
    let card = StripeCardAdapter::new(api::publishable_key())
        .map_err(|e| CheckoutError::Adapter(e.0))?;

    Checkout::builder()
        .config(config)
        .backend(Rc::new(api::payment_backend()))
        .card(Rc::new(card))
        .wallet(Rc::new(PaypalWalletAdapter::new()))
        .notifier(Rc::new(ToastNotifier::new(toast)))
        .analytics(Rc::new(FirebaseAnalytics))
        .products(products)
        .build()
        .map(Rc::new)
}

/// Wrap `task` so it can be stopped from a cleanup hook; stopping drops the
/// task and everything it owns
fn abortable_task<F>(task: F) -> (impl Future<Output = ()>, AbortHandle)
where
    F: Future<Output = ()>,
{
    let (task, handle) = abortable(task);
    let task = async move {
        if task.await.is_err() {
            tracing::debug!("Payment form task stopped");
        }
    };
    (task, handle)
}

/// Card / PayPal payment form for the selected product
#[component]
pub fn PaymentForm(
    products: ProductSelection,
    #[prop(optional)] action: CheckoutAction,
    #[prop(optional)] allow_coupons: bool,
) -> impl IntoView {
    let toast = RwSignal::new(None::<Notification>);
    let config = CheckoutConfig {
        action,
        allow_coupons,
        ..Default::default()
    };

    let checkout = match build_checkout(config, products, toast) {
        Ok(checkout) => checkout,
        Err(e) => {
            tracing::error!(error = %e, "Payment form unavailable");
            return view! { <p class="error">{e.user_message()}</p> }.into_any();
        }
    };

    // Mirror the checkout model into a signal for rendering
    let (model, set_model) = signal(checkout.snapshot());
    let mut updates = checkout.subscribe();
    let (mirror, mirror_handle) = abortable_task(async move {
        while updates.changed().await.is_ok() {
            set_model.set(updates.borrow_and_update().clone());
        }
    });
    spawn_local(mirror);

    let runner = Rc::clone(&checkout);
    let (pumps, pumps_handle) = abortable_task(async move { runner.run().await });
    spawn_local(pumps);

    let checkout = StoredValue::new_local(checkout);

    Effect::new(move |_| {
        checkout.with_value(|c| {
            if let Err(e) = c.mount_card() {
                tracing::error!(error = %e, "Card element not mounted");
            }
        });
    });
    on_cleanup(move || {
        pumps_handle.abort();
        mirror_handle.abort();
        checkout.try_with_value(|c| c.unmount());
    });

    let (coupon_code, set_coupon_code) = signal(String::new());

    let apply_coupon = move |ev: SubmitEvent| {
        ev.prevent_default();
        let code = coupon_code.get_untracked();
        let c = checkout.get_value();
        spawn_local(async move {
            if let Err(e) = c.apply_coupon(&code).await {
                tracing::info!(error = %e, "Coupon not applied");
            }
        });
    };

    let submit_card = move |ev: SubmitEvent| {
        ev.prevent_default();
        let c = checkout.get_value();
        spawn_local(async move {
            if let Err(e) = c.submit_card_payment().await {
                tracing::info!(error = %e, "Card payment not completed");
            }
        });
    };

    let total = move || {
        model.track();
        checkout
            .with_value(|c| c.display_total().ok())
            .map(|t| format!("${t}"))
            .unwrap_or_default()
    };

    let button_label = match action {
        CheckoutAction::Purchase => "Pay",
        CheckoutAction::Source => "Update card",
    };

    view! {
        <div class="payment-form">
            <Show when=move || allow_coupons>
                <form class="coupon-form" on:submit=apply_coupon>
                    <input
                        type="text"
                        placeholder="Coupon code"
                        prop:value=move || coupon_code.get()
                        on:input=move |ev| set_coupon_code.set(event_target_value(&ev))
                    />
                    <button type="submit" disabled=move || model.with(|m| m.coupon.is_loading())>
                        "Apply"
                    </button>
                    <Show when=move || model.with(|m| m.coupon.is_rejected())>
                        <p class="coupon-error">"Invalid coupon"</p>
                    </Show>
                    {move || {
                        model
                            .with(|m| m.coupon.coupon_id().map(str::to_string))
                            .map(|id| view! { <p class="coupon-applied">"Applied " {id}</p> })
                    }}
                </form>
            </Show>

            <p class="total">{total}</p>

            <form class="card-form" on:submit=submit_card>
                <div id="card-element"></div>
                <button type="submit" disabled=move || model.with(|m| m.phase.is_in_flight())>
                    {button_label}
                </button>
            </form>

            <div id="paypal-element"></div>

            {move || {
                model
                    .with(CheckoutModel::loading_state)
                    .map(|state| view! { <p class="loading">{state}</p> })
            }}
            {move || {
                model
                    .with(|m| m.server_error().map(str::to_string))
                    .map(|message| view! { <p class="error">{message}</p> })
            }}
            <Show when=move || model.with(CheckoutModel::success)>
                <p class="success">"Payment complete, PRO access is active."</p>
            </Show>
            {move || {
                toast
                    .get()
                    .map(|n| {
                        view! {
                            <div class="toast" on:click=move |_| toast.set(None)>
                                <strong>{n.title}</strong>
                                <span>{n.text}</span>
                            </div>
                        }
                    })
            }}
        </div>
    }
    .into_any()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_aborted_task_releases_what_it_owns() {
        let shared = Rc::new(());
        let held = Rc::clone(&shared);
        let (task, handle) = abortable_task(async move {
            let _held = held;
            futures::future::pending::<()>().await;
        });

        handle.abort();
        task.await;

        assert_eq!(Rc::strong_count(&shared), 1);
    }

    #[tokio::test]
    async fn test_unaborted_task_runs_to_completion() {
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();
        let (task, _handle) = abortable_task(async move {
            done_tx.send(()).unwrap();
        });

        task.await;

        assert!(done_rx.await.is_ok());
    }
}
