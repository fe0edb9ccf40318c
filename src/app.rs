mod achievements;
mod background;
pub mod browser;
mod contact;
mod loading;
mod typewriter;

use leptos::prelude::*;
use leptos_meta::*;

use achievements::AchievementCounters;
use background::AnimatedBackground;
use contact::ContactSection;
use loading::LoadingScreen;
use typewriter::TypeWriter;

const TAGLINE: &str = "Algorithm Alchemist | Crafting coding potions with Python";
const TAGLINE_SPEED_MS: u64 = 80;

pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8" />
                <meta name="viewport" content="width=device-width, initial-scale=1" />
                <AutoReload options=options.clone() />
                <HydrationScripts options />
                <meta name="color-scheme" content="dark" />
                <link rel="shortcut icon" type="image/ico" href="/favicon.ico" />
                <link rel="stylesheet" id="leptos" href="/pkg/portfolio-site.css" />
                <MetaTags />
            </head>
            <body class="bg-gray-900 text-gray-100">
                <App />
            </body>
        </html>
    }
}

#[component]
pub fn App() -> impl IntoView {
    // Provides context that manages stylesheets, titles, meta tags, etc.
    provide_meta_context();
    let (loaded, set_loaded) = signal(false);

    view! {
        <Title text="Algorithm Alchemist" />
        <Show
            when=loaded
            fallback=move || view! { <LoadingScreen on_complete=move |_| set_loaded(true) /> }
        >
            <AnimatedBackground />
            <main class="flex flex-col items-center mx-auto w-full max-w-5xl px-4 py-16">
                <h1 class="text-4xl md:text-5xl font-bold text-center">
                    <TypeWriter text=TAGLINE speed_ms=TAGLINE_SPEED_MS />
                </h1>
                <AchievementCounters />
                <ContactSection />
            </main>
        </Show>
    }
}
