//! Rendering: immediate-mode drawing onto `tiny_skia` pixmaps.
//!
//! This module is the only place that builds paths and paints. It receives
//! surface-space geometry and produces pixels; it does not mutate any engine
//! state.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont, point};
use tiny_skia::{
    BlendMode, FillRule, LineCap, LineJoin, Mask, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform,
};

use crate::color::Color;
use crate::consts::ERASER_WIDTH_RATIO;
use crate::error::RenderError;
use crate::shapes::ShapeGeometry;
use crate::view::Point;

/// How a stroke combines with what is already on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composite {
    /// Source-over.
    Normal,
    /// Destination-out: clears whatever the stroke covers.
    Erase,
}

/// Color, width, and compositing for one stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f32,
    pub composite: Composite,
}

impl StrokeStyle {
    #[must_use]
    pub fn pen(color: Color, width: f32) -> Self {
        Self { color, width, composite: Composite::Normal }
    }

    /// Eraser for the given pen width; it clears a band twice as wide.
    #[must_use]
    pub fn eraser(pen_width: f32) -> Self {
        Self { color: Color::BLACK, width: pen_width * ERASER_WIDTH_RATIO, composite: Composite::Erase }
    }

    fn paint(&self) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color(self.color.to_skia());
        paint.anti_alias = true;
        if self.composite == Composite::Erase {
            paint.blend_mode = BlendMode::DestinationOut;
        }
        paint
    }

    fn stroke(&self) -> Stroke {
        Stroke { width: self.width, line_cap: LineCap::Round, line_join: LineJoin::Round, ..Stroke::default() }
    }
}

fn pt32(p: Point) -> (f32, f32) {
    (p.x as f32, p.y as f32)
}

/// Draw one freehand segment with round caps. A zero-length segment
/// becomes a round dot.
///
/// # Errors
///
/// Returns [`RenderError::Path`] if the geometry is not finite.
pub fn stroke_segment(pixmap: &mut Pixmap, from: Point, to: Point, style: &StrokeStyle) -> Result<(), RenderError> {
    if from == to {
        return dot(pixmap, from, style);
    }
    let (fx, fy) = pt32(from);
    let (tx, ty) = pt32(to);
    let mut pb = PathBuilder::new();
    pb.move_to(fx, fy);
    pb.line_to(tx, ty);
    let path = pb.finish().ok_or(RenderError::Path("segment"))?;
    pixmap.stroke_path(&path, &style.paint(), &style.stroke(), Transform::identity(), None);
    Ok(())
}

/// Fill a round dot as wide as the stroke.
///
/// # Errors
///
/// Returns [`RenderError::Path`] if the stroke width is not positive.
pub fn dot(pixmap: &mut Pixmap, at: Point, style: &StrokeStyle) -> Result<(), RenderError> {
    let (x, y) = pt32(at);
    let path = PathBuilder::from_circle(x, y, style.width / 2.0).ok_or(RenderError::Path("dot"))?;
    pixmap.fill_path(&path, &style.paint(), FillRule::Winding, Transform::identity(), None);
    Ok(())
}

/// Stroke the outline of a shape.
///
/// Degenerate shapes (zero radius, zero area) draw nothing.
///
/// # Errors
///
/// Returns [`RenderError::Path`] if the geometry is not finite.
pub fn stroke_shape(pixmap: &mut Pixmap, shape: &ShapeGeometry, style: &StrokeStyle) -> Result<(), RenderError> {
    let mut pb = PathBuilder::new();
    match shape {
        ShapeGeometry::Circle { center, radius } => {
            if *radius <= 0.0 {
                return Ok(());
            }
            let (cx, cy) = pt32(*center);
            pb.push_circle(cx, cy, *radius as f32);
        }
        ShapeGeometry::Polygon(points) => {
            let Some((first, rest)) = points.split_first() else {
                return Ok(());
            };
            let (x, y) = pt32(*first);
            pb.move_to(x, y);
            for p in rest {
                let (x, y) = pt32(*p);
                pb.line_to(x, y);
            }
            pb.close();
        }
        ShapeGeometry::Segments(segments) => {
            for (a, b) in segments {
                let (ax, ay) = pt32(*a);
                let (bx, by) = pt32(*b);
                pb.move_to(ax, ay);
                pb.line_to(bx, by);
            }
        }
    }
    // An empty or zero-area outline yields no path; nothing to draw.
    let Some(path) = pb.finish() else {
        return Ok(());
    };
    pixmap.stroke_path(&path, &style.paint(), &style.stroke(), Transform::identity(), None);
    Ok(())
}

/// Horizontal advance of `text` at `size` pixels, including kerning.
#[must_use]
pub fn measure_text(font: &FontArc, text: &str, size: f32) -> f32 {
    let scaled = font.as_scaled(PxScale::from(size));
    let mut width = 0.0;
    let mut prev: Option<GlyphId> = None;
    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(p) = prev {
            width += scaled.kern(p, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }
    width
}

/// Fill `text` with its baseline starting at `at`.
///
/// Glyph coverage is rasterized into a mask, then the color is painted
/// through it in one pass.
///
/// # Errors
///
/// Returns [`RenderError::Allocation`] if the coverage mask cannot be
/// allocated.
pub fn draw_text(
    pixmap: &mut Pixmap,
    font: &FontArc,
    text: &str,
    at: Point,
    size: f32,
    color: Color,
) -> Result<(), RenderError> {
    let (width, height) = (pixmap.width(), pixmap.height());
    let mut mask = Mask::new(width, height).ok_or(RenderError::Allocation { width, height })?;
    let scaled = font.as_scaled(PxScale::from(size));
    let (mut caret, baseline) = pt32(at);
    let mut prev: Option<GlyphId> = None;

    {
        let data = mask.data_mut();
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(p) = prev {
                caret += scaled.kern(p, id);
            }
            let glyph = id.with_scale_and_position(scaled.scale(), point(caret, baseline));
            caret += scaled.h_advance(id);
            prev = Some(id);

            let Some(outlined) = font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px = bounds.min.x as i64 + i64::from(gx);
                let py = bounds.min.y as i64 + i64::from(gy);
                if px < 0 || py < 0 || px >= i64::from(width) || py >= i64::from(height) {
                    return;
                }
                let idx = (py as usize) * (width as usize) + px as usize;
                let value = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
                data[idx] = data[idx].max(value);
            });
        }
    }

    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    let area = Rect::from_xywh(0.0, 0.0, width as f32, height as f32).ok_or(RenderError::Path("text area"))?;
    pixmap.fill_rect(area, &paint, Transform::identity(), Some(&mask));
    Ok(())
}

/// Stroke an axis-aligned rectangle outline (selection chrome).
///
/// # Errors
///
/// Returns [`RenderError::Path`] if the rectangle is empty or not finite.
pub fn outline_rect(
    pixmap: &mut Pixmap,
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
    color: Color,
    width: f32,
) -> Result<(), RenderError> {
    let rect = Rect::from_ltrb(left, top, right, bottom).ok_or(RenderError::Path("rectangle"))?;
    let path = PathBuilder::from_rect(rect);
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = true;
    let stroke = Stroke { width, ..Stroke::default() };
    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    Ok(())
}

/// Allocate a fully transparent pixmap.
///
/// # Errors
///
/// Returns [`RenderError::Allocation`] for zero or oversized dimensions.
pub fn blank(width: u32, height: u32) -> Result<Pixmap, RenderError> {
    Pixmap::new(width, height).ok_or(RenderError::Allocation { width, height })
}
