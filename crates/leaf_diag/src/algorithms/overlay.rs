use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_line_segment_mut;
use crate::{
    config::{MAX_STROKE_WIDTH, OverlayStyle},
    types::LesionContour,
};

/// Draw each contour as a closed polyline of `style.stroke_width` pixels.
///
/// Widths outside `1..=MAX_STROKE_WIDTH` are clamped into that range.
pub fn draw_contours(canvas: &mut RgbaImage, contours: &[LesionContour], style: &OverlayStyle) {
    let color = Rgba(style.color);
    let width = i32::try_from(style.stroke_width.clamp(1, MAX_STROKE_WIDTH)).unwrap_or(1);
    let start = -(width - 1) / 2;
    let offsets: Vec<(f32, f32)> = (start..start + width)
        .flat_map(|dy| (start..start + width).map(move |dx| (dx as f32, dy as f32)))
        .collect();

    for contour in contours {
        let points = &contour.points;
        if points.is_empty() {
            continue;
        }

        for (i, &[x0, y0]) in points.iter().enumerate() {
            let [x1, y1] = points[(i + 1) % points.len()];
            for &(dx, dy) in &offsets {
                draw_line_segment_mut(canvas, (x0 + dx, y0 + dy), (x1 + dx, y1 + dy), color);
            }
        }
    }
}
