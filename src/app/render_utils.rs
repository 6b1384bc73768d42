use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke};

use crate::layout::Rgb;

pub(super) fn rgb_color(color: Rgb) -> Color32 {
    let [r, g, b] = color.to_array();
    Color32::from_rgb(r, g, b)
}

pub(super) fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0) as u8;
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

/// Dark canvas with a faint ring marking the projected bounding sphere.
pub(super) fn draw_background(painter: &Painter, rect: Rect, bound: Option<(Pos2, f32)>) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    if let Some((center, radius)) = bound
        && radius.is_finite()
        && radius > 1.0
    {
        painter.circle_stroke(
            center,
            radius,
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    #[test]
    fn opacity_maps_to_alpha() {
        let color = with_opacity(rgb_color(Rgb::new(10, 20, 30)), 0.15);
        assert_eq!(color.a(), 38);
        assert_eq!(with_opacity(Color32::WHITE, 2.0).a(), 255);
    }

    #[test]
    fn circles_outside_the_rect_are_hidden() {
        let rect = Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 100.0));
        assert!(circle_visible(rect, pos2(-4.0, 50.0), 5.0));
        assert!(!circle_visible(rect, pos2(-6.0, 50.0), 5.0));
    }
}
