#![forbid(unsafe_code)]

//! In-process PNG/JPG/PDF export of rendered labels.

use super::{HeadlessError, LabelRenderer, RenderedLabel};
use labelpress_core::ReleaseRecord;

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error(transparent)]
    Headless(#[from] HeadlessError),
    #[error("failed to parse SVG: {0}")]
    SvgParse(String),
    #[error("failed to allocate a {width}x{height} pixmap")]
    PixmapAlloc { width: u32, height: u32 },
    #[error("failed to encode PNG")]
    PngEncode,
    #[error("invalid background color {0:?}")]
    InvalidBackground(String),
    #[error("JPG export requires an opaque background color (e.g. white)")]
    JpegOpaqueBackgroundRequired,
    #[error("failed to encode JPG")]
    JpegEncode,
    #[error("failed to convert SVG to PDF")]
    PdfConvert,
}

pub type Result<T> = std::result::Result<T, RasterError>;

/// Width of raster exports when none is requested, in pixels.
pub const DEFAULT_WIDTH_PX: u32 = 3000;

#[derive(Debug, Clone)]
pub struct RasterOptions {
    /// Output width in pixels; the height follows the document's aspect ratio. When `None`,
    /// `scale` is applied to the document size instead.
    pub width_px: Option<u32>,
    pub scale: f32,
    pub background: Option<String>,
    pub jpeg_quality: u8,
    /// Font files made available to the rasterizer in addition to system fonts.
    pub fonts: Vec<Vec<u8>>,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            width_px: Some(DEFAULT_WIDTH_PX),
            scale: 1.0,
            background: None,
            jpeg_quality: 90,
            fonts: Vec::new(),
        }
    }
}

impl LabelRenderer {
    pub fn render_png(&self, template: &str, record: &ReleaseRecord) -> Result<Vec<u8>> {
        let RenderedLabel { svg, .. } = self.render_svg(template, record)?;
        svg_to_png(&svg, &self.raster_options())
    }

    pub fn render_pdf(&self, template: &str, record: &ReleaseRecord) -> Result<Vec<u8>> {
        let RenderedLabel { svg, .. } = self.render_svg(template, record)?;
        svg_to_pdf(&svg, &self.raster_options())
    }
}

pub fn svg_to_png(svg: &str, options: &RasterOptions) -> Result<Vec<u8>> {
    let pixmap = svg_to_pixmap(svg, options, options.background.as_deref())?;
    pixmap.encode_png().map_err(|_| RasterError::PngEncode)
}

pub fn svg_to_jpeg(svg: &str, options: &RasterOptions) -> Result<Vec<u8>> {
    let bg = options.background.as_deref().unwrap_or("white");
    let color =
        parse_tiny_skia_color(bg).ok_or_else(|| RasterError::InvalidBackground(bg.to_string()))?;
    if color.alpha() != 1.0 {
        return Err(RasterError::JpegOpaqueBackgroundRequired);
    }

    let pixmap = svg_to_pixmap(svg, options, Some(bg))?;
    let (w, h) = (pixmap.width(), pixmap.height());

    // Opaque background: alpha is always 255 and premultiplication is a no-op.
    let mut rgb = Vec::with_capacity((w as usize) * (h as usize) * 3);
    for px in pixmap.data().chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
    }

    let mut out = Vec::new();
    let mut enc =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, options.jpeg_quality);
    enc.encode(&rgb, w, h, image::ExtendedColorType::Rgb8)
        .map_err(|_| RasterError::JpegEncode)?;
    Ok(out)
}

/// Vector PDF export; the page size follows the document size.
pub fn svg_to_pdf(svg: &str, options: &RasterOptions) -> Result<Vec<u8>> {
    let mut opt = svg2pdf::usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    for font in &options.fonts {
        opt.fontdb_mut().load_font_data(font.clone());
    }

    let tree = svg2pdf::usvg::Tree::from_str(svg, &opt)
        .map_err(|e| RasterError::SvgParse(e.to_string()))?;

    svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(|_| RasterError::PdfConvert)
}

fn svg_to_pixmap(
    svg: &str,
    options: &RasterOptions,
    background: Option<&str>,
) -> Result<tiny_skia::Pixmap> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    for font in &options.fonts {
        opt.fontdb_mut().load_font_data(font.clone());
    }

    let tree = usvg::Tree::from_str(svg, &opt).map_err(|e| RasterError::SvgParse(e.to_string()))?;
    let size = tree.size();
    let scale = raster_scale(size.width(), options);

    let width = (size.width() * scale).ceil().max(1.0) as u32;
    let height = (size.height() * scale).ceil().max(1.0) as u32;
    tracing::debug!(width, height, scale, "rasterizing label");

    let mut pixmap =
        tiny_skia::Pixmap::new(width, height).ok_or(RasterError::PixmapAlloc { width, height })?;

    if let Some(bg) = background {
        let color =
            parse_tiny_skia_color(bg).ok_or_else(|| RasterError::InvalidBackground(bg.to_string()))?;
        pixmap.fill(color);
    }

    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );
    Ok(pixmap)
}

fn raster_scale(document_width: f32, options: &RasterOptions) -> f32 {
    match options.width_px {
        Some(px) if px > 0 && document_width.is_finite() && document_width > 0.0 => {
            px as f32 / document_width
        }
        _ if options.scale.is_finite() && options.scale > 0.0 => options.scale,
        _ => 1.0,
    }
}

fn parse_tiny_skia_color(text: &str) -> Option<tiny_skia::Color> {
    let s = text.trim().to_ascii_lowercase();
    match s.as_str() {
        "transparent" => return Some(tiny_skia::Color::from_rgba8(0, 0, 0, 0)),
        "white" => return Some(tiny_skia::Color::from_rgba8(255, 255, 255, 255)),
        "black" => return Some(tiny_skia::Color::from_rgba8(0, 0, 0, 255)),
        _ => {}
    }

    let hex = s.strip_prefix('#')?;
    let nibble = |c: u8| (c as char).to_digit(16).map(|v| v as u8);
    let bytes = hex.as_bytes();
    let channels: Vec<u8> = match bytes.len() {
        3 | 4 => bytes
            .iter()
            .map(|&c| nibble(c).map(|v| (v << 4) | v))
            .collect::<Option<_>>()?,
        6 | 8 => bytes
            .chunks_exact(2)
            .map(|pair| Some((nibble(pair[0])? << 4) | nibble(pair[1])?))
            .collect::<Option<_>>()?,
        _ => return None,
    };
    let alpha = channels.get(3).copied().unwrap_or(255);
    Some(tiny_skia::Color::from_rgba8(
        channels[0],
        channels[1],
        channels[2],
        alpha,
    ))
}
