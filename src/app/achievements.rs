use std::collections::BTreeMap;

use leptos::prelude::*;

use crate::animation::{CounterConfig, CounterInterpolator};

use super::browser::BrowserScheduler;

const START_DELAY_MS: u64 = 500;

struct Achievement {
    key: &'static str,
    label: &'static str,
    prefix: &'static str,
    suffix: &'static str,
    target: u64,
}

static ACHIEVEMENTS: [Achievement; 6] = [
    Achievement {
        key: "leetcode_solved",
        label: "LeetCode Problems Solved",
        prefix: "",
        suffix: "+",
        target: 150,
    },
    Achievement {
        key: "leetcode_rating",
        label: "LeetCode Contest Rating",
        prefix: "",
        suffix: "",
        target: 1800,
    },
    Achievement {
        key: "kaggle_rank",
        label: "Kaggle Competition Rank",
        prefix: "Top ",
        suffix: "%",
        target: 15,
    },
    Achievement {
        key: "github_repos",
        label: "GitHub Repositories",
        prefix: "",
        suffix: "+",
        target: 50,
    },
    Achievement {
        key: "github_stars",
        label: "GitHub Stars Earned",
        prefix: "",
        suffix: "+",
        target: 200,
    },
    Achievement {
        key: "competitions",
        label: "Hackathons & Competitions",
        prefix: "",
        suffix: "",
        target: 10,
    },
];

#[component]
pub fn AchievementCounters() -> impl IntoView {
    let config = CounterConfig::new(ACHIEVEMENTS.iter().map(|a| (a.key, a.target)))
        .with_start_delay_ms(START_DELAY_MS);
    let (values, set_values) = signal(
        config
            .targets
            .keys()
            .map(|k| (k.clone(), 0))
            .collect::<BTreeMap<_, _>>(),
    );
    let interpolator = StoredValue::new_local(None::<CounterInterpolator<BrowserScheduler>>);

    Effect::new(move |_| {
        if interpolator.with_value(Option::is_some) {
            return;
        }
        let started = CounterInterpolator::new(config.clone(), BrowserScheduler)
            .map(|c| c.on_update(move |tick| set_values(tick.values.clone())))
            .and_then(|c| c.start().map(|_| c));
        match started {
            Ok(c) => interpolator.set_value(Some(c)),
            Err(err) => {
                log::warn!("achievement counters not animated: {err}");
                set_values(config.targets.clone());
            }
        }
    });

    on_cleanup(move || {
        interpolator.try_update_value(|c| {
            if let Some(c) = c.take() {
                c.stop();
            }
        });
    });

    view! {
        <section class="grid grid-cols-2 md:grid-cols-3 gap-6 my-12">
            {ACHIEVEMENTS
                .iter()
                .map(|a| {
                    let key = a.key;
                    let value = move || values.with(|v| v.get(key).copied().unwrap_or_default());
                    view! {
                        <div class="p-6 rounded-lg bg-gray-800/70 border border-purple-500/30 text-center">
                            <div class="text-3xl font-bold text-purple-300">
                                {a.prefix}
                                {value}
                                {a.suffix}
                            </div>
                            <div class="mt-2 text-sm text-gray-400">{a.label}</div>
                        </div>
                    }
                })
                .collect_view()}
        </section>
    }
}
