use leptos::*;

#[component]
pub fn Header() -> impl IntoView {
    view! {
        <header>
            <div class="header-left">
                <a href="#" class="logo">"SENDTRACK"</a>
                <span class="badge">"Bulk applications"</span>
            </div>
        </header>
    }
}
