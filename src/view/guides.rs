//! Composition guides drawn over the preview: safe frame, thirds, diagonals, center cross.

use glam::Vec2;

use crate::model::SafeFrameSettings;

const FRAME_INSET: f32 = 6.0;
const CROSS_HALF: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn x_max(&self) -> f32 {
        self.x + self.w
    }

    pub fn y_max(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    /// Same center, sides scaled by `s`.
    pub fn scaled(&self, s: f32) -> Rect {
        let (w, h) = (self.w * s, self.h * s);
        let c = self.center();
        Rect::new(c.x - w * 0.5, c.y - h * 0.5, w, h)
    }

    fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub from: Vec2,
    pub to: Vec2,
}

fn line(from: (f32, f32), to: (f32, f32)) -> Line {
    Line { from: Vec2::new(from.0, from.1), to: Vec2::new(to.0, to.1) }
}

/// Largest rect of `aspect` that fits inside `view` shrunk by a small inset, centered.
pub fn fit_frame(view: Rect, aspect: f32) -> Rect {
    let inner = Rect::new(view.x + FRAME_INSET, view.y + FRAME_INSET, view.w - 2.0 * FRAME_INSET, view.h - 2.0 * FRAME_INSET);
    if inner.is_empty() || aspect <= 0.0 {
        return Rect::new(inner.x, inner.y, inner.w.max(0.0), inner.h.max(0.0));
    }
    let (w, h) = if inner.w / inner.h > aspect {
        (inner.h * aspect, inner.h)
    } else {
        (inner.w, inner.w / aspect)
    };
    Rect::new(inner.x + (inner.w - w) * 0.5, inner.y + (inner.h - h) * 0.5, w, h)
}

/// Everything needed to paint the overlay for one view.
#[derive(Debug, Clone, PartialEq)]
pub struct SafeFrame {
    pub frame: Rect,
    /// Bands of the view outside `frame`.
    pub masks: Vec<Rect>,
    pub mask_alpha: f32,
    pub lines: Vec<Line>,
    pub title_safe: Option<Rect>,
    pub line_width: f32,
    pub color: [f32; 4],
    pub label: String,
}

/// Build the overlay for `view` showing an `output` sized shot. `None` when guides are off.
pub fn safe_frame(view: Rect, output: (u32, u32), settings: &SafeFrameSettings) -> Option<SafeFrame> {
    if !settings.show || output.0 == 0 || output.1 == 0 {
        return None;
    }
    let f = fit_frame(view, output.0 as f32 / output.1 as f32);

    let masks = [
        Rect::new(view.x, view.y, view.w, f.y - view.y),
        Rect::new(view.x, f.y_max(), view.w, view.y_max() - f.y_max()),
        Rect::new(view.x, f.y, f.x - view.x, f.h),
        Rect::new(f.x_max(), f.y, view.x_max() - f.x_max(), f.h),
    ]
    .into_iter()
    .filter(|r| !r.is_empty())
    .collect();

    let mut lines = vec![
        line((f.x, f.y), (f.x_max(), f.y)),
        line((f.x, f.y_max()), (f.x_max(), f.y_max())),
        line((f.x, f.y), (f.x, f.y_max())),
        line((f.x_max(), f.y), (f.x_max(), f.y_max())),
    ];
    if settings.thirds {
        for t in [1.0 / 3.0, 2.0 / 3.0] {
            let x = f.x + f.w * t;
            let y = f.y + f.h * t;
            lines.push(line((x, f.y), (x, f.y_max())));
            lines.push(line((f.x, y), (f.x_max(), y)));
        }
    }
    if settings.diagonals {
        lines.push(line((f.x, f.y), (f.x_max(), f.y_max())));
        lines.push(line((f.x_max(), f.y), (f.x, f.y_max())));
    }
    if settings.center_cross {
        let c = f.center();
        lines.push(line((c.x - CROSS_HALF, c.y), (c.x + CROSS_HALF, c.y)));
        lines.push(line((c.x, c.y - CROSS_HALF), (c.x, c.y + CROSS_HALF)));
    }

    let title_safe = (settings.title_safe < 0.999).then(|| f.scaled(settings.title_safe.max(0.0)));

    Some(SafeFrame {
        frame: f,
        masks,
        mask_alpha: settings.mask_alpha,
        lines,
        title_safe,
        line_width: settings.line_width,
        color: settings.line_color,
        label: format!("{}x{}", output.0, output.1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn wide_shot_in_square_view_is_letterboxed() {
        let f = fit_frame(Rect::new(0.0, 0.0, 412.0, 412.0), 16.0 / 9.0);
        assert_relative_eq!(f.w, 400.0);
        assert_relative_eq!(f.h, 225.0);
        assert_relative_eq!(f.x, 6.0);
        assert_relative_eq!(f.y, 6.0 + 87.5);
    }

    #[test]
    fn tall_shot_is_pillarboxed() {
        let f = fit_frame(Rect::new(0.0, 0.0, 1012.0, 412.0), 1.0);
        assert_relative_eq!(f.w, 400.0);
        assert_relative_eq!(f.x, 6.0 + 300.0);
    }

    #[test]
    fn overlay_respects_toggles() {
        let mut settings = SafeFrameSettings::default();
        let view = Rect::new(0.0, 0.0, 412.0, 412.0);
        assert!(safe_frame(view, (1920, 1080), &settings).is_none());

        settings.show = true;
        let overlay = safe_frame(view, (1920, 1080), &settings).unwrap();
        // border + thirds + cross
        assert_eq!(overlay.lines.len(), 4 + 4 + 2);
        assert_eq!(overlay.masks.len(), 4);
        assert_eq!(overlay.label, "1920x1080");
        let ts = overlay.title_safe.unwrap();
        assert_relative_eq!(ts.w, 360.0, epsilon = 1e-3);

        settings.thirds = false;
        settings.center_cross = false;
        settings.diagonals = true;
        settings.title_safe = 1.0;
        let overlay = safe_frame(view, (1920, 1080), &settings).unwrap();
        assert_eq!(overlay.lines.len(), 4 + 2);
        assert!(overlay.title_safe.is_none());
    }
}
