use serde::{Deserialize, Serialize};

use super::{AnimationError, AnimationFrame};

const GRID_LINE_WIDTH: f64 = 1.0;
const STREAM_LINE_WIDTH: f64 = 2.0;
const STREAM_PEAK_ALPHA: f64 = 0.3;
const STREAM_TOP_SWAY: f64 = 100.0;
const STREAM_BOTTOM_SWAY: f64 = 50.0;
const STREAM_TOP_FREQUENCY: f64 = 0.001;
const STREAM_BOTTOM_FREQUENCY: f64 = 0.002;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    pub fn to_css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

const GRID_COLOR: Rgba = Rgba::new(59, 130, 246, 0.1);
const STREAM_COLOR: Rgba = Rgba::new(139, 92, 246, 1.0);

/// Background scene settings, fixed for the lifetime of a renderer.
///
/// `colors` is an ordered palette: the first entry strokes the grid, the
/// second the data streams (its alpha is ignored, streams fade in and out).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub grid_spacing: u32,
    pub stream_count: u32,
    pub colors: Vec<Rgba>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            grid_spacing: 50,
            stream_count: 5,
            colors: vec![GRID_COLOR, STREAM_COLOR],
        }
    }
}

impl SceneConfig {
    pub fn with_grid_spacing(mut self, spacing: u32) -> Self {
        self.grid_spacing = spacing;
        self
    }

    pub fn with_stream_count(mut self, count: u32) -> Self {
        self.stream_count = count;
        self
    }

    pub fn grid_color(&self) -> Rgba {
        self.colors.first().copied().unwrap_or(GRID_COLOR)
    }

    pub fn stream_color(&self) -> Rgba {
        self.colors.get(1).copied().unwrap_or(STREAM_COLOR)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stroke {
    Solid {
        color: Rgba,
        width: f64,
    },
    /// Gradient running from the segment's start height to its end height,
    /// with `(offset, color)` stops in `0.0..=1.0`.
    VerticalGradient {
        stops: Vec<(f64, Rgba)>,
        width: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
    pub stroke: Stroke,
}

/// A 2D drawing target the scene can be painted into.
pub trait Surface {
    fn size(&self) -> SurfaceSize;
    fn resize(&mut self, size: SurfaceSize);
    fn clear(&mut self);
    fn stroke(&mut self, segment: &Segment);
}

pub struct SceneRenderer {
    config: SceneConfig,
}

impl SceneRenderer {
    pub fn new(config: SceneConfig) -> Result<Self, AnimationError> {
        if config.grid_spacing == 0 {
            return Err(AnimationError::InvalidConfig(
                "grid spacing must be positive",
            ));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Static grid for a surface of `size`; does not depend on time.
    pub fn grid(&self, size: SurfaceSize) -> Vec<Segment> {
        let stroke = Stroke::Solid {
            color: self.config.grid_color(),
            width: GRID_LINE_WIDTH,
        };
        let spacing = self.config.grid_spacing as usize;
        let (width, height) = (size.width as f64, size.height as f64);

        let vertical = (0..=size.width).step_by(spacing).map(|x| Segment {
            from: Point::new(x as f64, 0.0),
            to: Point::new(x as f64, height),
            stroke: stroke.clone(),
        });
        let horizontal = (0..=size.height).step_by(spacing).map(|y| Segment {
            from: Point::new(0.0, y as f64),
            to: Point::new(width, y as f64),
            stroke: stroke.clone(),
        });
        vertical.chain(horizontal).collect()
    }

    pub fn streams(&self, size: SurfaceSize, frame: AnimationFrame) -> Vec<Segment> {
        let count = self.config.stream_count;
        let color = self.config.stream_color();
        let t = frame.timestamp;
        let lane = size.width as f64 / count as f64;
        let bottom_sway = (t * STREAM_BOTTOM_FREQUENCY).sin() * STREAM_BOTTOM_SWAY;

        (0..count)
            .map(|i| {
                let i = i as f64;
                let x = i * lane + (t * STREAM_TOP_FREQUENCY + i).sin() * STREAM_TOP_SWAY;
                Segment {
                    from: Point::new(x, 0.0),
                    to: Point::new(x + bottom_sway, size.height as f64),
                    stroke: Stroke::VerticalGradient {
                        stops: vec![
                            (0.0, color.with_alpha(0.0)),
                            (0.5, color.with_alpha(STREAM_PEAK_ALPHA)),
                            (1.0, color.with_alpha(0.0)),
                        ],
                        width: STREAM_LINE_WIDTH,
                    },
                }
            })
            .collect()
    }

    /// Everything drawn in one frame, grid first.
    pub fn compose(&self, size: SurfaceSize, frame: AnimationFrame) -> Vec<Segment> {
        let mut segments = self.grid(size);
        segments.extend(self.streams(size, frame));
        segments
    }

    /// Paints one frame. The surface size is read once up front so a resize
    /// that lands mid-frame never produces a mixed frame. Returns false when
    /// the surface has no area and nothing was drawn.
    pub fn draw_frame<S: Surface + ?Sized>(&self, surface: &mut S, frame: AnimationFrame) -> bool {
        let size = surface.size();
        if size.is_empty() {
            log::debug!("skipping frame for empty surface {}x{}", size.width, size.height);
            return false;
        }
        let segments = self.compose(size, frame);
        surface.clear();
        for segment in &segments {
            surface.stroke(segment);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Clear(SurfaceSize),
        Stroke(Segment),
    }

    #[derive(Default)]
    struct RecordingSurface {
        size: SurfaceSize,
        ops: Vec<Op>,
    }

    impl Surface for RecordingSurface {
        fn size(&self) -> SurfaceSize {
            self.size
        }

        fn resize(&mut self, size: SurfaceSize) {
            self.size = size;
        }

        fn clear(&mut self) {
            self.ops.push(Op::Clear(self.size));
        }

        fn stroke(&mut self, segment: &Segment) {
            self.ops.push(Op::Stroke(segment.clone()));
        }
    }

    impl RecordingSurface {
        // segments drawn since the most recent clear
        fn last_frame(&self) -> Vec<Segment> {
            let start = self
                .ops
                .iter()
                .rposition(|op| matches!(op, Op::Clear(_)))
                .map(|i| i + 1)
                .unwrap_or(0);
            self.ops[start..]
                .iter()
                .filter_map(|op| match op {
                    Op::Stroke(s) => Some(s.clone()),
                    Op::Clear(_) => None,
                })
                .collect()
        }
    }

    fn is_solid(segment: &Segment) -> bool {
        matches!(segment.stroke, Stroke::Solid { .. })
    }

    fn frame(timestamp: f64) -> AnimationFrame {
        AnimationFrame { timestamp }
    }

    #[test]
    fn test_grid_covers_surface() {
        let renderer = SceneRenderer::new(SceneConfig::default()).unwrap();
        let grid = renderer.grid(SurfaceSize::new(800, 600));

        // 0, 50, ..., 800 and 0, 50, ..., 600
        assert_eq!(grid.len(), 17 + 13);
        assert_eq!(grid[0].from, Point::new(0.0, 0.0));
        assert_eq!(grid[16].from, Point::new(800.0, 0.0));
        assert_eq!(grid[16].to, Point::new(800.0, 600.0));
        assert_eq!(grid[17].to, Point::new(800.0, 0.0));
        assert!(grid.iter().all(is_solid));
    }

    #[test]
    fn test_grid_skips_partial_cells() {
        let renderer = SceneRenderer::new(SceneConfig::default()).unwrap();
        let grid = renderer.grid(SurfaceSize::new(120, 40));
        let xs = grid
            .iter()
            .filter(|s| s.from.y == 0.0 && s.to.y == 40.0)
            .map(|s| s.from.x)
            .collect::<Vec<_>>();
        assert_eq!(xs, vec![0.0, 50.0, 100.0]);
    }

    #[test]
    fn test_stream_positions() {
        let renderer = SceneRenderer::new(SceneConfig::default()).unwrap();
        let size = SurfaceSize::new(1000, 500);

        let streams = renderer.streams(size, frame(0.0));
        assert_eq!(streams.len(), 5);
        assert_eq!(streams[0].from, Point::new(0.0, 0.0));
        assert_eq!(streams[0].to, Point::new(0.0, 500.0));
        let expected = 200.0 + 1f64.sin() * 100.0;
        assert!((streams[1].from.x - expected).abs() < 1e-9);

        let t = 1234.0;
        let streams = renderer.streams(size, frame(t));
        for (i, s) in streams.iter().enumerate() {
            let i = i as f64;
            let top = i * 200.0 + (t * 0.001 + i).sin() * 100.0;
            let bottom = top + (t * 0.002).sin() * 50.0;
            assert!((s.from.x - top).abs() < 1e-9);
            assert!((s.to.x - bottom).abs() < 1e-9);
            assert_eq!(s.from.y, 0.0);
            assert_eq!(s.to.y, 500.0);
        }
    }

    #[test]
    fn test_stream_gradient_fades_at_ends() {
        let renderer = SceneRenderer::new(SceneConfig::default()).unwrap();
        let streams = renderer.streams(SurfaceSize::new(400, 400), frame(10.0));
        for s in streams {
            let Stroke::VerticalGradient { stops, width } = s.stroke else {
                panic!("streams should use a gradient");
            };
            assert_eq!(width, 2.0);
            assert_eq!(stops.len(), 3);
            assert_eq!(stops[0].1.a, 0.0);
            assert_eq!(stops[1], (0.5, Rgba::new(139, 92, 246, 0.3)));
            assert_eq!(stops[2].1.a, 0.0);
        }
    }

    #[test]
    fn test_resize_redraws_grid_for_new_size() {
        let renderer = SceneRenderer::new(SceneConfig::default()).unwrap();
        let mut surface = RecordingSurface::default();
        surface.resize(SurfaceSize::new(800, 600));
        assert!(renderer.draw_frame(&mut surface, frame(0.0)));

        surface.resize(SurfaceSize::new(1200, 800));
        assert!(renderer.draw_frame(&mut surface, frame(16.0)));

        let grid = surface
            .last_frame()
            .into_iter()
            .filter(is_solid)
            .collect::<Vec<_>>();
        assert_eq!(grid, renderer.grid(SurfaceSize::new(1200, 800)));
        // no line from the 800x600 grid survives
        assert!(grid
            .iter()
            .filter(|s| s.from.x == s.to.x)
            .all(|s| s.to.y == 800.0));
        assert!(grid
            .iter()
            .filter(|s| s.from.y == s.to.y)
            .all(|s| s.to.x == 1200.0));
        assert!(matches!(
            surface.ops.iter().rev().find(|op| matches!(op, Op::Clear(_))),
            Some(Op::Clear(size)) if *size == SurfaceSize::new(1200, 800)
        ));
    }

    #[test]
    fn test_empty_surface_is_noop() {
        let renderer = SceneRenderer::new(SceneConfig::default()).unwrap();
        let mut surface = RecordingSurface::default();
        assert!(!renderer.draw_frame(&mut surface, frame(0.0)));
        surface.resize(SurfaceSize::new(800, 0));
        assert!(!renderer.draw_frame(&mut surface, frame(16.0)));
        assert!(surface.ops.is_empty());
    }

    #[test]
    fn test_zero_grid_spacing_is_rejected() {
        let config = SceneConfig::default().with_grid_spacing(0);
        assert!(matches!(
            SceneRenderer::new(config),
            Err(AnimationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_no_streams() {
        let renderer = SceneRenderer::new(SceneConfig::default().with_stream_count(0)).unwrap();
        let segments = renderer.compose(SurfaceSize::new(100, 100), frame(5.0));
        assert!(segments.iter().all(is_solid));
        assert_eq!(segments.len(), 3 + 3);
    }

    #[test]
    fn test_config_defaults_from_json() {
        let config: SceneConfig = serde_json::from_str(r#"{ "stream_count": 3 }"#).unwrap();
        assert_eq!(config.grid_spacing, 50);
        assert_eq!(config.stream_count, 3);
        assert_eq!(config.grid_color().to_css(), "rgba(59, 130, 246, 0.1)");
    }
}
