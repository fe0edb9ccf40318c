use std::cell::RefCell;
use std::rc::Rc;

use leptos::{html, prelude::*};
use leptos_use::{use_window_size, UseWindowSizeReturn};

use crate::animation::{FrameClock, SceneConfig, SceneRenderer, Surface, SurfaceSize};

use super::browser::{BrowserScheduler, CanvasSurface};

struct Backdrop {
    surface: Rc<RefCell<CanvasSurface>>,
    clock: FrameClock<BrowserScheduler>,
}

/// Full-window canvas with the grid and falling data streams behind
/// everything else.
#[component]
pub fn AnimatedBackground(#[prop(optional)] config: Option<SceneConfig>) -> impl IntoView {
    let canvas_ref = NodeRef::<html::Canvas>::new();
    let UseWindowSizeReturn { width, height } = use_window_size();
    let backdrop = StoredValue::new_local(None::<Backdrop>);
    let config = config.unwrap_or_default();

    let window_size = move || SurfaceSize::new(width.get() as u32, height.get() as u32);
    let window_size_untracked =
        move || SurfaceSize::new(width.get_untracked() as u32, height.get_untracked() as u32);

    Effect::new(move |_| {
        let Some(canvas) = canvas_ref.get() else {
            return;
        };
        if backdrop.with_value(Option::is_some) {
            return;
        }
        let renderer = match SceneRenderer::new(config.clone()) {
            Ok(renderer) => renderer,
            Err(err) => {
                log::warn!("background disabled: {err}");
                return;
            }
        };
        let Some(mut surface) = CanvasSurface::new(canvas) else {
            log::warn!("background disabled: no 2d context");
            return;
        };
        surface.resize(window_size_untracked());

        let surface = Rc::new(RefCell::new(surface));
        let drawing = surface.clone();
        match FrameClock::start(BrowserScheduler, move |frame| {
            renderer.draw_frame(&mut *drawing.borrow_mut(), frame);
        }) {
            Ok(clock) => backdrop.set_value(Some(Backdrop { surface, clock })),
            Err(err) => log::warn!("background disabled: {err}"),
        }
    });

    Effect::new(move |_| {
        let size = window_size();
        backdrop.with_value(|backdrop| {
            if let Some(backdrop) = backdrop {
                backdrop.surface.borrow_mut().resize(size);
            }
        });
    });

    on_cleanup(move || {
        backdrop.try_update_value(|backdrop| {
            if let Some(backdrop) = backdrop.take() {
                backdrop.clock.stop();
            }
        });
    });

    view! {
        <canvas
            node_ref=canvas_ref
            class="fixed inset-0 w-full h-full pointer-events-none -z-10"
            aria-hidden="true"
        />
    }
}

