//! Recipient picker and job submission.

use leptos::*;

use crate::config::BACKEND_URL;
use crate::progress::ProgressStreamClient;
use crate::services::{fetch_recipients, submit_bulk_job};

#[component]
pub fn RecipientPicker(client: ProgressStreamClient) -> impl IntoView {
    let recipients = create_local_resource(|| (), |_| async move { fetch_recipients(BACKEND_URL).await });
    let selected = create_rw_signal(Vec::<String>::new());
    let (warning, set_warning) = create_signal(None::<String>);

    let toggle = move |id: String, checked: bool| {
        selected.update(|ids| {
            if checked {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            } else {
                ids.retain(|other| other != &id);
            }
        });
    };

    let select_all = move |_| {
        if let Some(Ok(list)) = recipients.get() {
            selected.set(list.iter().map(|r| r.id.clone()).collect());
        }
    };

    let on_submit = move |_| {
        set_warning.set(None);
        let ids = selected.get_untracked();
        if let Err(e) = submit_bulk_job(&client, BACKEND_URL.to_string(), ids) {
            log::warn!("Job not submitted: {}", e);
            set_warning.set(Some(e.to_string()));
        }
    };

    view! {
        <section class="recipient-picker">
            <div class="picker-header">
                <h2>"Companies"</h2>
                <span class="badge">{move || format!("{} selected", selected.with(Vec::len))}</span>
                <button class="link-button" on:click=select_all>"Select all"</button>
                <button class="link-button" on:click=move |_| selected.set(Vec::new())>"Clear"</button>
            </div>

            <Suspense fallback=|| view! { <p class="loading">"Loading recipients..."</p> }>
                {move || recipients.get().map(|result| match result {
                    Ok(list) => view! {
                        <ul class="recipient-list">
                            {list.into_iter().map(|recipient| {
                                let id = recipient.id.clone();
                                let checked_id = recipient.id.clone();
                                view! {
                                    <li>
                                        <label>
                                            <input
                                                type="checkbox"
                                                prop:checked=move || selected.with(|ids| ids.contains(&checked_id))
                                                on:change=move |ev| toggle(id.clone(), event_target_checked(&ev))
                                            />
                                            <span class="company">{recipient.company}</span>
                                            <span class="email">{recipient.email}</span>
                                        </label>
                                    </li>
                                }
                            }).collect_view()}
                        </ul>
                    }.into_view(),
                    Err(e) => view! {
                        <p class="error">{format!("Could not load recipients: {}", e)}</p>
                    }.into_view(),
                })}
            </Suspense>

            <Show when=move || warning.with(Option::is_some) fallback=|| view! {}>
                <p class="warning">{move || warning.get().unwrap_or_default()}</p>
            </Show>

            <button class="send-button" on:click=on_submit>
                "📨 Send applications"
            </button>
        </section>
    }
}
