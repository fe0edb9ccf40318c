use leptos::prelude::*;

use crate::animation::Typewriter;

use super::browser::BrowserScheduler;

#[component]
pub fn TypeWriter(
    #[prop(into)] text: String,
    #[prop(default = Typewriter::<BrowserScheduler>::DEFAULT_SPEED_MS)] speed_ms: u64,
) -> impl IntoView {
    let (visible, set_visible) = signal(String::new());
    let typewriter = StoredValue::new_local(None::<Typewriter<BrowserScheduler>>);
    let full = text.clone();

    Effect::new(move |_| {
        if typewriter.with_value(Option::is_some) {
            return;
        }
        let started = Typewriter::new(&text, speed_ms, BrowserScheduler)
            .map(|t| t.on_update(move |shown| set_visible(shown.clone())))
            .and_then(|t| t.start().map(|_| t));
        match started {
            Ok(t) => typewriter.set_value(Some(t)),
            Err(err) => {
                log::warn!("typewriter disabled: {err}");
                set_visible(text.clone());
            }
        }
    });

    on_cleanup(move || {
        typewriter.try_update_value(|t| {
            if let Some(t) = t.take() {
                t.stop();
            }
        });
    });

    view! {
        <span aria-label=full>
            {visible}
            <span class="animate-pulse">"|"</span>
        </span>
    }
}
