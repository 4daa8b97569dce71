use tiny_skia::{Color, FillRule, Paint, Path, PathBuilder, PixmapMut, PixmapPaint, Rect, Stroke, Transform};
use cosmic_text::{Attrs, Buffer, FontSystem, Metrics, Shaping, SwashCache};
use crate::config::ThemeConfig;
use crate::state::Session;
use crate::ui::icons::{ICON_SIZE, IconCache};

const SEARCH_FONT: f32 = 20.0;
const ROW_FONT: f32 = 16.0;
const ICON_GAP: f32 = 10.0;

/// Resolved theme colors, parsed once.
struct Palette {
    background: Color,
    border: Color,
    text: Color,
    placeholder: Color,
    selection_background: Color,
    selection_text: Color,
}

impl Palette {
    fn from_theme(theme: &ThemeConfig) -> Self {
        Self {
            background: ThemeConfig::parse_color(&theme.background),
            border: ThemeConfig::parse_color(&theme.border_color),
            text: ThemeConfig::parse_color(&theme.text),
            placeholder: ThemeConfig::parse_color(&theme.placeholder),
            selection_background: ThemeConfig::parse_color(&theme.selection_background),
            selection_text: ThemeConfig::parse_color(&theme.selection_text),
        }
    }
}

pub struct Renderer {
    font_system: FontSystem,
    swash_cache: SwashCache,
    icons: IconCache,
    theme: ThemeConfig,
    palette: Palette,
}

impl Renderer {
    pub fn new(icons: IconCache, theme: ThemeConfig) -> Self {
        Self {
            font_system: FontSystem::new(),
            swash_cache: SwashCache::new(),
            icons,
            palette: Palette::from_theme(&theme),
            theme,
        }
    }

    pub fn insert_icon(&mut self, name: String, pixmap: Option<tiny_skia::Pixmap>) {
        self.icons.insert(name, pixmap);
    }

    pub fn draw(&mut self, pixmap: &mut PixmapMut, session: &Session) {
        let padding = self.theme.padding;
        let row_height = self.theme.row_height;
        let width = pixmap.width() as f32;
        let height = pixmap.height() as f32;

        pixmap.fill(Color::TRANSPARENT);
        if let Some(frame) = Rect::from_xywh(0.0, 0.0, width, height) {
            let (fill, border) = (self.palette.background, self.palette.border);
            fill_rounded(pixmap, frame, self.theme.border_radius, fill, Some(border));
        }

        let (search_text, search_color) = if session.filter().is_empty() {
            ("Type to search…".to_string(), self.palette.placeholder)
        } else {
            (format!("> {}", session.filter()), self.palette.text)
        };
        self.draw_text(pixmap, &search_text, padding, padding, SEARCH_FONT, search_color);

        let list_top = padding + SEARCH_FONT + self.theme.spacing;
        let capacity = ((height - list_top - padding) / row_height).max(0.0) as usize;
        let total = session.visible().len();
        let first = scroll_offset(session.selection().unwrap_or(0), total, capacity);

        if total == 0 {
            let color = self.palette.placeholder;
            self.draw_text(pixmap, "No matching applications", padding, list_top, ROW_FONT, color);
            return;
        }

        for (position, entry) in session.visible_entries().enumerate().skip(first).take(capacity) {
            let y = list_top + (position - first) as f32 * row_height;
            let mut text_color = self.palette.text;

            if session.selection() == Some(position) {
                if let Some(highlight) = Rect::from_xywh(padding / 2.0, y, width - padding, row_height) {
                    let fill = self.palette.selection_background;
                    fill_rounded(pixmap, highlight, self.theme.border_radius / 2.0, fill, None);
                }
                text_color = self.palette.selection_text;
            }

            let icon_y = y + (row_height - ICON_SIZE as f32) / 2.0;
            if let Some(icon) = self.icons.lookup(entry.icon.as_deref()) {
                pixmap.draw_pixmap(
                    padding as i32,
                    icon_y as i32,
                    icon.as_ref(),
                    &PixmapPaint::default(),
                    Transform::identity(),
                    None,
                );
            }

            // Space is reserved even while the icon is loading so names don't shift.
            let text_x = padding + ICON_SIZE as f32 + ICON_GAP;
            let text_y = y + (row_height - ROW_FONT) / 2.0;
            self.draw_text(pixmap, &entry.display_name, text_x, text_y, ROW_FONT, text_color);
        }
    }

    fn draw_text(&mut self, pixmap: &mut PixmapMut, text: &str, x: f32, y: f32, size: f32, color: Color) {
        let mut buffer = Buffer::new(&mut self.font_system, Metrics::new(size, size));
        buffer.set_size(&mut self.font_system, Some(pixmap.width() as f32 - x), None);
        buffer.set_text(&mut self.font_system, text, Attrs::new(), Shaping::Advanced);
        buffer.shape_until_scroll(&mut self.font_system, false);

        let rgba = color.to_color_u8();
        let text_color = cosmic_text::Color::rgba(rgba.red(), rgba.green(), rgba.blue(), rgba.alpha());
        let (max_x, max_y) = (pixmap.width() as i32, pixmap.height() as i32);

        buffer.draw(&mut self.font_system, &mut self.swash_cache, text_color, |gx, gy, w, h, glyph| {
            let (px, py) = (gx + x as i32, gy + y as i32);
            if w == 0 || h == 0 || px < 0 || py < 0 || px >= max_x || py >= max_y {
                return;
            }
            let mut paint = Paint::default();
            paint.set_color_rgba8(glyph.r(), glyph.g(), glyph.b(), glyph.a());
            if let Some(cell) = Rect::from_xywh(px as f32, py as f32, w as f32, h as f32) {
                pixmap.fill_rect(cell, &paint, Transform::identity(), None);
            }
        });
    }
}

/// First visible row so that `selected` stays on screen, kept near the
/// middle of the list once scrolling starts.
pub fn scroll_offset(selected: usize, total: usize, capacity: usize) -> usize {
    if capacity == 0 || total <= capacity {
        return 0;
    }
    selected.saturating_sub(capacity / 2).min(total - capacity)
}

fn rounded_rect(rect: Rect, radius: f32) -> Option<Path> {
    let radius = radius.min(rect.width() / 2.0).min(rect.height() / 2.0).max(0.0);
    let (left, top, right, bottom) = (rect.left(), rect.top(), rect.right(), rect.bottom());

    let mut pb = PathBuilder::new();
    pb.move_to(left + radius, top);
    pb.line_to(right - radius, top);
    pb.quad_to(right, top, right, top + radius);
    pb.line_to(right, bottom - radius);
    pb.quad_to(right, bottom, right - radius, bottom);
    pb.line_to(left + radius, bottom);
    pb.quad_to(left, bottom, left, bottom - radius);
    pb.line_to(left, top + radius);
    pb.quad_to(left, top, left + radius, top);
    pb.close();
    pb.finish()
}

fn fill_rounded(pixmap: &mut PixmapMut, rect: Rect, radius: f32, fill: Color, border: Option<Color>) {
    let Some(path) = rounded_rect(rect, radius) else { return };

    let mut paint = Paint::default();
    paint.set_color(fill);
    paint.anti_alias = true;
    pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);

    if let Some(border) = border {
        paint.set_color(border);
        let stroke = Stroke { width: 1.5, ..Default::default() };
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_lists_never_scroll() {
        assert_eq!(scroll_offset(0, 5, 8), 0);
        assert_eq!(scroll_offset(4, 5, 8), 0);
        assert_eq!(scroll_offset(3, 8, 8), 0);
    }

    #[test]
    fn selection_is_kept_centred_then_clamped() {
        assert_eq!(scroll_offset(0, 20, 5), 0);
        assert_eq!(scroll_offset(2, 20, 5), 0);
        assert_eq!(scroll_offset(3, 20, 5), 1);
        assert_eq!(scroll_offset(10, 20, 5), 8);
        assert_eq!(scroll_offset(19, 20, 5), 15);
    }

    #[test]
    fn zero_capacity_is_safe() {
        assert_eq!(scroll_offset(7, 10, 0), 0);
    }

    #[test]
    fn selected_row_is_always_within_window() {
        for total in 0..30 {
            for capacity in 1..10 {
                for selected in 0..total {
                    let first = scroll_offset(selected, total, capacity);
                    assert!(first <= selected && selected < first + capacity);
                }
            }
        }
    }

    #[test]
    fn rounded_rect_clamps_radius() {
        let rect = Rect::from_xywh(0.0, 0.0, 10.0, 4.0).unwrap();
        let path = rounded_rect(rect, 50.0).unwrap();
        let bounds = path.bounds();
        assert_eq!((bounds.width(), bounds.height()), (10.0, 4.0));
    }
}
