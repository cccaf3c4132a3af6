use std::fs;
use std::io::Cursor;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, FixedOffset};
use image::{GrayImage, ImageFormat, Luma};
use log::debug;

use crate::error::Result;
use crate::meta::{local_now, DisplayMeta};
use crate::normalize::RenderOptions;
use crate::qrcode::SymbolMatrix;

/*---- Rendering ----*/

/// Grey levels used for dark modules and for the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub dark: Luma<u8>,
    pub light: Luma<u8>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            dark: Luma([0x11]),
            light: Luma([0xff]),
        }
    }
}

/// A finished render: the raster and the metadata describing it, plus the
/// symbol and options it was drawn from for vector and text exports.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderResult {
    pub image: GrayImage,
    pub meta: DisplayMeta,
    pub matrix: SymbolMatrix,
    pub options: RenderOptions,
}

/// Side length in pixels of the raster for a symbol of `size` modules.
pub fn raster_side(size: usize, options: &RenderOptions) -> u32 {
    (size as u32 + 2 * options.margin) * options.scale
}

/// Draws `matrix` into a fresh image of exactly [`raster_side`] pixels.
///
/// Each module becomes a `scale × scale` block with no blending, offset by
/// `margin` modules of background on every side.
pub fn draw(matrix: &SymbolMatrix, options: &RenderOptions, palette: &Palette) -> GrayImage {
    let side = raster_side(matrix.size(), options);
    let scale = options.scale;
    let margin = options.margin as i32;
    let mut img = GrayImage::new(side, side);

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let qr_x = (x / scale) as i32 - margin;
        let qr_y = (y / scale) as i32 - margin;
        *pixel = if matrix.get_module(qr_x, qr_y) {
            palette.dark
        } else {
            palette.light
        };
    }

    img
}

/// Renders symbol matrices, optionally stamping the metadata with the time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Renderer {
    pub palette: Palette,
    pub timestamp: bool,
}

impl Renderer {
    pub fn new(palette: Palette, timestamp: bool) -> Self {
        Self { palette, timestamp }
    }

    /// Renders `matrix`. The system clock is only read if timestamps are on.
    pub fn render(&self, matrix: &SymbolMatrix, options: &RenderOptions) -> RenderResult {
        let now = self.timestamp.then(local_now);
        self.stamp(matrix, options, now.as_ref())
    }

    /// Renders `matrix`, stamping it with `now` if timestamps are on.
    pub fn render_at(
        &self,
        matrix: &SymbolMatrix,
        options: &RenderOptions,
        now: &DateTime<FixedOffset>,
    ) -> RenderResult {
        self.stamp(matrix, options, self.timestamp.then_some(now))
    }

    fn stamp(
        &self,
        matrix: &SymbolMatrix,
        options: &RenderOptions,
        now: Option<&DateTime<FixedOffset>>,
    ) -> RenderResult {
        let image = draw(matrix, options, &self.palette);
        let mut meta = DisplayMeta::from_matrix(matrix);
        if let Some(now) = now {
            meta = meta.with_timestamp(now);
        }
        debug!(
            "rendered version {} mask {} at {}x{} px (scale {}, margin {})",
            meta.version,
            meta.mask,
            image.width(),
            image.height(),
            options.scale,
            options.margin
        );
        RenderResult {
            image,
            meta,
            matrix: matrix.clone(),
            options: *options,
        }
    }
}

/// Renders `matrix` with the default palette and no timestamp.
pub fn render(matrix: &SymbolMatrix, options: &RenderOptions) -> RenderResult {
    Renderer::default().render(matrix, options)
}

/*---- Exports ----*/

/// Encodes `img` as PNG.
pub fn to_png_bytes(img: &GrayImage) -> Result<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}

/// Encodes `img` as a `data:image/png;base64,...` URI, ready to embed or share.
pub fn to_data_uri(img: &GrayImage) -> Result<String> {
    Ok(format!("data:image/png;base64,{}", BASE64.encode(to_png_bytes(img)?)))
}

/// Saves `img` as a PNG file, creating the parent directory if needed.
pub fn save_png(img: &GrayImage, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

// Returns a string of SVG code for an image depicting
// the given symbol, with the given number of border modules.
// The string always uses Unix newlines (\n), regardless of the platform.
pub fn to_svg_string(matrix: &SymbolMatrix, options: &RenderOptions, palette: &Palette) -> String {
    let border = options.margin as usize;
    let scale = options.scale;
    let dimension = matrix.size() + border * 2;
    let mut result = String::new();
    result += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
    result += "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n";
    result += &format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" width=\"{1}\" height=\"{1}\" viewBox=\"0 0 {0} {0}\" stroke=\"none\" shape-rendering=\"crispEdges\">\n",
        dimension,
        dimension as u32 * scale
    );
    result += &format!(
        "\t<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>\n",
        grey_hex(palette.light)
    );
    let path: Vec<String> = matrix
        .dark_modules()
        .map(|(x, y)| format!("M{},{}h1v1h-1z", x + border, y + border))
        .collect();
    result += &format!(
        "\t<path d=\"{}\" fill=\"{}\"/>\n",
        path.join(" "),
        grey_hex(palette.dark)
    );
    result += "</svg>\n";
    result
}

fn grey_hex(Luma([level]): Luma<u8>) -> String {
    format!("#{level:02x}{level:02x}{level:02x}")
}

/// Renders the symbol as terminal text, two characters per module.
pub fn to_terminal_string(matrix: &SymbolMatrix, margin: u32) -> String {
    let border = margin as i32;
    let side = matrix.size() as i32;
    let mut out = String::new();
    for y in -border..side + border {
        for x in -border..side + border {
            let c = if matrix.get_module(x, y) { '█' } else { ' ' };
            out.push(c);
            out.push(c);
        }
        out.push('\n');
    }
    out
}
