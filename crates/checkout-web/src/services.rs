//! Notification and analytics sinks for the browser

use checkout_core::{Analytics, AnalyticsEvent, Notification, Notifier};
use leptos::prelude::*;
use serde::Serialize;

use crate::bindings;
use crate::interop::{js_message, to_js};

/// Shows notifications through a toast signal
#[derive(Clone, Copy)]
pub struct ToastNotifier {
    toast: RwSignal<Option<Notification>>,
}

impl ToastNotifier {
    pub const fn new(toast: RwSignal<Option<Notification>>) -> Self {
        Self { toast }
    }
}

impl Notifier for ToastNotifier {
    fn notify(&self, notification: &Notification) {
        self.toast.set(Some(notification.clone()));
    }
}

#[derive(Serialize)]
struct EventParams<'a> {
    value: &'a str,
    product: Option<&'a str>,
}

/// Forwards events to `firebase.analytics().logEvent`
#[derive(Clone, Copy, Default)]
pub struct FirebaseAnalytics;

impl Analytics for FirebaseAnalytics {
    fn log_event(&self, event: &AnalyticsEvent) {
        let analytics = match bindings::firebase_analytics() {
            Ok(analytics) => analytics,
            Err(e) => {
                tracing::warn!(error = %js_message(&e), event = %event.name, "Analytics unavailable");
                return;
            }
        };

        let params = EventParams {
            value: &event.value,
            product: event.product.as_deref(),
        };
        match to_js(&params) {
            Ok(params) => analytics.log_event(&event.name, &params),
            Err(e) => tracing::warn!(error = %e, "Analytics params not serializable"),
        }
    }
}
