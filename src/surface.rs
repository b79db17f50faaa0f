// src/surface.rs

use crate::config::{to_hex, Color};
use crate::error::RenderError;
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{ImageOutputFormat, Rgba, RgbaImage};
use std::fmt::Write as _;
use std::io::Cursor;
use tiny_skia::{
    FillRule, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, Rect, Stroke, Transform,
};

/// Glyph grid of the bitmap font.
const GLYPH_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub fill: Color,
    pub outline: Color,
    pub outline_width: f32,
    /// Glyph height
    pub font_size: f32,
    /// Horizontal advance per character
    pub char_width: f32,
}

/// A drawing target sized exactly to the diagram.
pub trait Surface {
    fn create(width: u32, height: u32) -> Self
    where
        Self: Sized;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color);

    fn stroke_circle(&mut self, center: Point, radius: f32, line_width: f32, color: Color);

    /// A straight segment with round caps.
    fn stroke_line(&mut self, from: Point, to: Point, line_width: f32, color: Color);

    /// Text whose left edge is at `origin.x`, vertically centered on `origin.y`,
    /// stroked in the outline color and then filled.
    fn outlined_text(&mut self, origin: Point, text: &str, style: &TextStyle);

    /// The encoded image (PNG bytes or SVG document).
    fn encode(&self) -> Result<Vec<u8>, RenderError>;
}

/// Output encodings understood by the CLI.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Anti-aliased raster image
    #[default]
    Png,
    /// Vector image with real text
    Svg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }
}

// --- Raster -----------------------------------------------------------------

/// PNG backend. Paths are rasterized by tiny-skia; a zero-sized canvas has
/// no pixmap and ignores drawing.
#[derive(Debug)]
pub struct RasterSurface {
    width: u32,
    height: u32,
    pixmap: Option<Pixmap>,
}

impl RasterSurface {
    /// Straight-alpha copy of the canvas.
    pub fn to_image(&self) -> RgbaImage {
        let mut image = RgbaImage::new(self.width, self.height);
        if let Some(pixmap) = &self.pixmap {
            for (pixel, color) in image.pixels_mut().zip(pixmap.pixels()) {
                let c = color.demultiply();
                *pixel = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
            }
        }
        image
    }

    fn fill(&mut self, path: &Path, color: Color) {
        if let Some(pixmap) = &mut self.pixmap {
            pixmap.fill_path(path, &paint(color), FillRule::Winding, Transform::identity(), None);
        }
    }

    fn stroke(&mut self, path: &Path, line_width: f32, color: Color) {
        if line_width <= 0.0 {
            return;
        }
        let stroke = Stroke {
            width: line_width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        if let Some(pixmap) = &mut self.pixmap {
            pixmap.stroke_path(path, &paint(color), &stroke, Transform::identity(), None);
        }
    }
}

fn paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.red, color.green, color.blue, 255);
    paint.anti_alias = true;
    paint
}

impl Surface for RasterSurface {
    fn create(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixmap: Pixmap::new(width, height),
        }
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color) {
        if let Some(path) = PathBuilder::from_circle(center.x, center.y, radius) {
            self.fill(&path, color);
        }
    }

    fn stroke_circle(&mut self, center: Point, radius: f32, line_width: f32, color: Color) {
        if let Some(path) = PathBuilder::from_circle(center.x, center.y, radius) {
            self.stroke(&path, line_width, color);
        }
    }

    fn stroke_line(&mut self, from: Point, to: Point, line_width: f32, color: Color) {
        let mut builder = PathBuilder::new();
        builder.move_to(from.x, from.y);
        builder.line_to(to.x, to.y);
        if let Some(path) = builder.finish() {
            self.stroke(&path, line_width, color);
        }
    }

    fn outlined_text(&mut self, origin: Point, text: &str, style: &TextStyle) {
        let top = origin.y - style.font_size / 2.0;
        let Some(path) = glyph_path(text, origin.x, top, style.char_width, style.font_size) else {
            return;
        };
        // Stroking the glyph rectangles grows them by half the width on every
        // side; the fill then covers the inner half again.
        self.stroke(&path, style.outline_width, style.outline);
        self.fill(&path, style.fill);
    }

    fn encode(&self) -> Result<Vec<u8>, RenderError> {
        let mut buffer = Vec::new();
        self.to_image()
            .write_to(&mut Cursor::new(&mut buffer), ImageOutputFormat::Png)?;
        Ok(buffer)
    }
}

/// Outline of `text` set in the 8x8 bitmap font, one rectangle per run of set
/// bits. Each glyph spans `advance` horizontally and `height` vertically.
fn glyph_path(text: &str, left: f32, top: f32, advance: f32, height: f32) -> Option<Path> {
    let dot_w = advance / GLYPH_SIZE as f32;
    let dot_h = height / GLYPH_SIZE as f32;
    let mut builder = PathBuilder::new();

    for (index, c) in text.chars().enumerate() {
        let Some(glyph) = BASIC_FONTS.get(c) else {
            continue;
        };
        let cell_x = left + index as f32 * advance;
        for (row, bits) in glyph.iter().enumerate() {
            let y = top + row as f32 * dot_h;
            let mut col = 0;
            while col < GLYPH_SIZE {
                if bits & (1 << col) == 0 {
                    col += 1;
                    continue;
                }
                let start = col;
                while col < GLYPH_SIZE && bits & (1 << col) != 0 {
                    col += 1;
                }
                let x = cell_x + start as f32 * dot_w;
                if let Some(rect) = Rect::from_xywh(x, y, (col - start) as f32 * dot_w, dot_h) {
                    builder.push_rect(rect);
                }
            }
        }
    }
    builder.finish()
}

// --- SVG --------------------------------------------------------------------

/// Vector backend; keeps labels as real monospace text.
#[derive(Debug)]
pub struct SvgSurface {
    width: u32,
    height: u32,
    body: String,
}

impl SvgSurface {
    pub fn document(&self) -> String {
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n{body}</svg>\n",
            w = self.width,
            h = self.height,
            body = self.body
        )
    }
}

impl Surface for SvgSurface {
    fn create(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            body: String::new(),
        }
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color) {
        let _ = writeln!(
            self.body,
            r#"  <circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{}"/>"#,
            center.x,
            center.y,
            radius,
            to_hex(color)
        );
    }

    fn stroke_circle(&mut self, center: Point, radius: f32, line_width: f32, color: Color) {
        let _ = writeln!(
            self.body,
            r#"  <circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="none" stroke="{}" stroke-width="{:.2}"/>"#,
            center.x,
            center.y,
            radius,
            to_hex(color),
            line_width
        );
    }

    fn stroke_line(&mut self, from: Point, to: Point, line_width: f32, color: Color) {
        let _ = writeln!(
            self.body,
            r#"  <line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="{:.2}" stroke-linecap="round"/>"#,
            from.x,
            from.y,
            to.x,
            to.y,
            to_hex(color),
            line_width
        );
    }

    fn outlined_text(&mut self, origin: Point, text: &str, style: &TextStyle) {
        let escaped = escape_xml(text);
        for (stroke, fill) in [
            (
                format!(
                    r#"stroke="{}" stroke-width="{:.2}" stroke-linejoin="round""#,
                    to_hex(style.outline),
                    style.outline_width
                ),
                "none".to_string(),
            ),
            (String::new(), to_hex(style.fill)),
        ] {
            let _ = writeln!(
                self.body,
                r#"  <text x="{:.2}" y="{:.2}" font-family="monospace" font-size="{:.1}px" dominant-baseline="middle" fill="{}" {}>{}</text>"#,
                origin.x, origin.y, style.font_size, fill, stroke, escaped
            );
        }
    }

    fn encode(&self) -> Result<Vec<u8>, RenderError> {
        Ok(self.document().into_bytes())
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use palette::Srgb;

    const RED: Color = Srgb {
        red: 255,
        green: 0,
        blue: 0,
        standard: std::marker::PhantomData,
    };

    fn style(font_size: f32, outline_width: f32) -> TextStyle {
        TextStyle {
            fill: RED,
            outline: Srgb::new(0, 0, 0),
            outline_width,
            font_size,
            char_width: 8.4,
        }
    }

    #[test]
    fn filled_circle_covers_its_center_only() {
        let mut surface = RasterSurface::create(40, 40);
        surface.fill_circle(Point::new(20.0, 20.0), 5.0, RED);
        let image = surface.to_image();
        assert_eq!(image.get_pixel(20, 20).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(2, 2).0[3], 0);
        assert_eq!(image.get_pixel(20, 30).0[3], 0);
    }

    #[test]
    fn stroked_circle_leaves_a_hole() {
        let mut surface = RasterSurface::create(40, 40);
        surface.stroke_circle(Point::new(20.0, 20.0), 10.0, 4.0, RED);
        let image = surface.to_image();
        assert_eq!(image.get_pixel(20, 20).0[3], 0);
        assert!(image.get_pixel(29, 20).0[3] > 200);
    }

    #[test]
    fn line_is_painted_between_endpoints() {
        let mut surface = RasterSurface::create(30, 30);
        surface.stroke_line(Point::new(5.0, 15.0), Point::new(25.0, 15.0), 4.0, RED);
        let image = surface.to_image();
        assert_eq!(image.get_pixel(15, 15).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(15, 25).0[3], 0);
    }

    #[test]
    fn shapes_outside_the_canvas_are_clipped() {
        let mut surface = RasterSurface::create(10, 10);
        surface.fill_circle(Point::new(-50.0, -50.0), 5.0, RED);
        surface.stroke_line(Point::new(-5.0, 5.0), Point::new(50.0, 5.0), 2.0, RED);
        assert_eq!(surface.to_image().get_pixel(9, 5).0[0], 255);
    }

    #[test]
    fn zero_sized_canvas_ignores_drawing() {
        let mut surface = RasterSurface::create(0, 10);
        surface.fill_circle(Point::new(0.0, 5.0), 3.0, RED);
        assert_eq!(surface.width(), 0);
        assert_eq!(surface.to_image().dimensions(), (0, 10));
    }

    #[test]
    fn raster_text_paints_fill_and_outline() {
        let mut surface = RasterSurface::create(60, 20);
        surface.outlined_text(Point::new(2.0, 10.0), "HI", &style(14.0, 2.0));
        let pixels: Vec<_> = surface.to_image().pixels().map(|p| p.0).collect();
        assert!(pixels.contains(&[255, 0, 0, 255]));
        assert!(pixels.contains(&[0, 0, 0, 255]));
    }

    #[test]
    fn raster_glyph_height_follows_font_size() {
        let painted_rows = |font_size: f32| {
            let mut surface = RasterSurface::create(20, 40);
            surface.outlined_text(Point::new(2.0, 20.0), "H", &style(font_size, 0.0));
            let image = surface.to_image();
            (0..image.height())
                .filter(|&y| (0..image.width()).any(|x| image.get_pixel(x, y).0[3] > 0))
                .count()
        };
        // "H" covers 7 of its 8 rows
        let small = painted_rows(16.0);
        let large = painted_rows(32.0);
        assert!((13..=15).contains(&small), "{small} rows");
        assert!((27..=29).contains(&large), "{large} rows");
    }

    #[test]
    fn png_encoding_has_signature() {
        let surface = RasterSurface::create(4, 4);
        let bytes = surface.encode().unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn svg_escapes_label_text() {
        let mut surface = SvgSurface::create(100, 50);
        surface.outlined_text(Point::new(0.0, 10.0), "Merge <a> & \"b\"", &style(14.0, 2.0));
        let doc = String::from_utf8(surface.encode().unwrap()).unwrap();
        assert!(doc.starts_with("<svg"));
        assert!(doc.contains(r#"width="100" height="50""#));
        assert!(doc.contains("Merge &lt;a&gt; &amp; &quot;b&quot;"));
        assert_eq!(doc.matches("<text").count(), 2);
    }
}
