//! Router shell

use leptos::prelude::*;
use leptos_router::{components::*, path};

use crate::pages::PricingPage;

/// Upgrade flow root; every known path lands on the pricing page
#[component]
pub fn App() -> impl IntoView {
    view! {
        <Router>
            <main class="upgrade">
                <Routes fallback=|| view! { <p class="error">"Nothing here. Try /upgrade"</p> }>
                    <Route path=path!("/") view=PricingPage />
                    <Route path=path!("/upgrade") view=PricingPage />
                    <Route path=path!("/pricing") view=PricingPage />
                </Routes>
            </main>
        </Router>
    }
}
