use std::cell::RefCell;
use std::time::Duration;

use leptos::prelude::*;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::animation::{
    AnimationError, FrameSource, Scheduler, Segment, Stroke, Surface, SurfaceSize,
};

fn scheduler_err(err: JsValue) -> AnimationError {
    AnimationError::Scheduler(format!("{err:?}"))
}

#[derive(Clone, Copy)]
pub enum BrowserTimer {
    Interval(IntervalHandle),
    Timeout(TimeoutHandle),
}

/// Window timers and `requestAnimationFrame`. Only usable once hydrated, so
/// everything built on it is started from an `Effect`.
#[derive(Clone, Copy, Default)]
pub struct BrowserScheduler;

impl Scheduler for BrowserScheduler {
    type Handle = BrowserTimer;

    fn set_interval(
        &self,
        period: Duration,
        callback: Box<dyn FnMut()>,
    ) -> Result<BrowserTimer, AnimationError> {
        let callback = RefCell::new(callback);
        set_interval_with_handle(move || (callback.borrow_mut())(), period)
            .map(BrowserTimer::Interval)
            .map_err(scheduler_err)
    }

    fn set_timeout(
        &self,
        delay: Duration,
        callback: Box<dyn FnOnce()>,
    ) -> Result<BrowserTimer, AnimationError> {
        set_timeout_with_handle(move || callback(), delay)
            .map(BrowserTimer::Timeout)
            .map_err(scheduler_err)
    }

    fn clear(&self, handle: BrowserTimer) {
        match handle {
            BrowserTimer::Interval(h) => h.clear(),
            BrowserTimer::Timeout(h) => h.clear(),
        }
    }
}

impl FrameSource for BrowserScheduler {
    type Handle = AnimationFrameRequestHandle;

    fn request_frame(
        &self,
        callback: Box<dyn FnOnce(f64)>,
    ) -> Result<AnimationFrameRequestHandle, AnimationError> {
        request_animation_frame_with_handle(move || {
            let now = window()
                .performance()
                .map(|p| p.now())
                .unwrap_or_default();
            callback(now)
        })
        .map_err(scheduler_err)
    }

    fn cancel_frame(&self, handle: AnimationFrameRequestHandle) {
        handle.cancel();
    }
}

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    /// `None` when the browser can't hand out a 2d context.
    pub fn new(canvas: HtmlCanvasElement) -> Option<Self> {
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()?
            .dyn_into::<CanvasRenderingContext2d>()
            .ok()?;
        Some(Self { canvas, ctx })
    }
}

impl Surface for CanvasSurface {
    fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.canvas.width(), self.canvas.height())
    }

    fn resize(&mut self, size: SurfaceSize) {
        self.canvas.set_width(size.width);
        self.canvas.set_height(size.height);
    }

    fn clear(&mut self) {
        let size = self.size();
        self.ctx
            .clear_rect(0.0, 0.0, size.width as f64, size.height as f64);
    }

    fn stroke(&mut self, segment: &Segment) {
        match &segment.stroke {
            Stroke::Solid { color, width } => {
                self.ctx.set_stroke_style_str(&color.to_css());
                self.ctx.set_line_width(*width);
            }
            Stroke::VerticalGradient { stops, width } => {
                let gradient = self.ctx.create_linear_gradient(
                    segment.from.x,
                    segment.from.y,
                    segment.from.x,
                    segment.to.y,
                );
                for (offset, color) in stops {
                    gradient.add_color_stop(*offset as f32, &color.to_css()).ok();
                }
                self.ctx.set_stroke_style_canvas_gradient(&gradient);
                self.ctx.set_line_width(*width);
            }
        }
        self.ctx.begin_path();
        self.ctx.move_to(segment.from.x, segment.from.y);
        self.ctx.line_to(segment.to.x, segment.to.y);
        self.ctx.stroke();
    }
}
