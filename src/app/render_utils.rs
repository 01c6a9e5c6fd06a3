use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use crate::hierarchy::Rgb;

pub(super) const HOVER_FILL: Color32 = Color32::from_rgb(255, 255, 0);

pub(super) fn to_color32(color: Rgb) -> Color32 {
    Color32::from_rgb(color.r, color.g, color.b)
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let mix = |from: u8, to: u8| (from as f32 + (to as f32 - from as f32) * amount).round() as u8;

    Color32::from_rgba_unmultiplied(
        mix(base.r(), overlay.r()),
        mix(base.g(), overlay.g()),
        mix(base.b(), overlay.b()),
        mix(base.a(), overlay.a()),
    )
}

/// Fades a color toward the canvas for de-emphasised nodes.
pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    blend_color(color, CANVAS, 1.0 - factor.clamp(0.0, 1.0))
}

const CANVAS: Color32 = Color32::from_rgb(246, 247, 250);

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, CANVAS);

    let step = (64.0 * zoom.clamp(0.5, 2.0)).max(24.0);
    let origin = rect.center() + pan;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(200, 205, 214, 90));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    rect.expand(radius).contains(position)
}

/// Cheap test on the link's bounding box; a few off-screen diagonals slip through.
pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    Rect::from_two_pos(start, end).expand(padding).intersects(rect)
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;

    #[test]
    fn screen_and_world_round_trip() {
        let rect = Rect::from_min_size(pos2(10.0, 20.0), vec2(800.0, 600.0));
        let pan = vec2(-35.0, 12.5);
        let zoom = 1.75;
        let world = vec2(120.0, -48.0);

        let screen = world_to_screen(rect, pan, zoom, world);
        let back = screen_to_world(rect, pan, zoom, screen);
        assert!((back - world).length() < 1e-3);
    }

    #[test]
    fn blend_endpoints() {
        let base = Color32::from_rgb(0, 100, 200);
        assert_eq!(blend_color(base, HOVER_FILL, 0.0), base);
        assert_eq!(blend_color(base, HOVER_FILL, 1.0), HOVER_FILL);
    }

    #[test]
    fn visibility_checks() {
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(100.0, 100.0));
        assert!(circle_visible(rect, pos2(-5.0, 50.0), 10.0));
        assert!(!circle_visible(rect, pos2(-50.0, 50.0), 10.0));
        assert!(edge_visible(rect, pos2(-50.0, 50.0), pos2(150.0, 50.0), 1.0));
        assert!(!edge_visible(rect, pos2(-50.0, -50.0), pos2(-10.0, -20.0), 1.0));
    }
}
