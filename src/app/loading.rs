use leptos::prelude::*;

use crate::animation::{icon_index, phrase_index, ProgressConfig, ProgressSequencer};

use super::browser::BrowserScheduler;

const PHRASES: [&str; 4] = [
    "Brewing digital potions...",
    "Mixing algorithms...",
    "Enchanting data...",
    "Summoning insights...",
];
const ICONS: [&str; 3] = ["⚗️", "🧪", "✨"];
const ICON_EVERY: u32 = 25;

#[component]
pub fn LoadingScreen(#[prop(into)] on_complete: Callback<()>) -> impl IntoView {
    let (progress, set_progress) = signal(0.0_f64);
    let (step, set_step) = signal(0_u32);
    let sequencer = StoredValue::new_local(None::<ProgressSequencer<BrowserScheduler>>);

    Effect::new(move |_| {
        if sequencer.with_value(Option::is_some) {
            return;
        }
        let started = ProgressSequencer::new(ProgressConfig::default(), BrowserScheduler)
            .map(|s| {
                s.on_step(move |tick| {
                    set_step(tick.step);
                    set_progress(tick.progress);
                })
                .on_complete(move || on_complete.run(()))
            })
            .and_then(|s| s.start().map(|_| s));
        match started {
            Ok(s) => sequencer.set_value(Some(s)),
            Err(err) => {
                // skip the splash rather than hang on it
                log::warn!("loading screen skipped: {err}");
                on_complete.run(());
            }
        }
    });

    on_cleanup(move || {
        sequencer.try_update_value(|s| {
            if let Some(s) = s.take() {
                s.cancel();
            }
        });
    });

    let phrase = move || PHRASES[phrase_index(progress.get(), PHRASES.len())];
    let icon = move || ICONS[icon_index(step.get(), ICON_EVERY, ICONS.len())];

    view! {
        <div class="fixed inset-0 z-50 flex flex-col items-center justify-center bg-gray-900">
            <div class="text-6xl mb-6 animate-bounce">{icon}</div>
            <p class="mb-4 text-lg text-purple-300">{phrase}</p>
            <div class="w-64 h-2 rounded-full bg-gray-700 overflow-hidden">
                <div
                    class="h-full bg-gradient-to-r from-purple-500 to-blue-500"
                    style:width=move || format!("{}%", progress.get())
                />
            </div>
            <p class="mt-2 text-sm text-gray-400">{move || format!("{:.0}%", progress.get())}</p>
        </div>
    }
}
