#![forbid(unsafe_code)]

//! `labelpress` turns release records into print-ready vector labels.
//!
//! A label is a regular SVG template with a few reserved elements: a `<style>` block carrying
//! `--name` custom properties, a metadata element carrying `KEY=VALUE` defaults, and `<text>`
//! elements addressed by id. A render pass resolves every field against the record, the
//! template defaults and a fallback, wraps the track listing into columns and patches the style
//! block. Nothing is measured with real fonts; see [`render::TextMeasurer`].
//!
//! # Features
//!
//! - `raster`: enable PNG/JPG/PDF output via pure-Rust SVG rasterization/conversion

pub use labelpress_core::*;

pub mod render {
    pub use labelpress_render::text::{HeuristicTextMeasurer, TextMeasurer, TextStyle};
    pub use labelpress_render::{
        ColumnReport, FontFace, RenderReport, SvgDocument, render_label,
    };

    use labelpress_core::{LabelConfig, ReleaseRecord};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    #[cfg(feature = "raster")]
    pub mod raster;

    #[derive(Debug, thiserror::Error)]
    pub enum HeadlessError {
        #[error(transparent)]
        Core(#[from] labelpress_core::Error),
        #[error(transparent)]
        Render(#[from] labelpress_render::Error),
        #[error("failed to read {}: {source}", path.display())]
        Io {
            path: PathBuf,
            #[source]
            source: std::io::Error,
        },
        #[error("{record}: {source}")]
        Record {
            record: String,
            #[source]
            source: Box<HeadlessError>,
        },
    }

    impl HeadlessError {
        /// Attaches the name of the record being rendered.
        pub fn for_record(self, record: impl Into<String>) -> Self {
            Self::Record {
                record: record.into(),
                source: Box::new(self),
            }
        }
    }

    pub type Result<T> = std::result::Result<T, HeadlessError>;

    /// A finished label.
    #[derive(Debug, Clone)]
    pub struct RenderedLabel {
        pub svg: String,
        pub report: RenderReport,
    }

    /// Converts a catalog number into a single safe directory name.
    ///
    /// Characters outside `[A-Za-z0-9._-]` become `-`; runs of `-` collapse. Returns `None` when
    /// nothing usable remains (blank input, `.`, `..`).
    pub fn output_dir_name(catalog: &str) -> Option<String> {
        let mut out = String::with_capacity(catalog.len());
        for ch in catalog.trim().chars() {
            let ok = ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.';
            out.push(if ok { ch } else { '-' });
        }
        while out.contains("--") {
            out = out.replace("--", "-");
        }
        let out = out.trim_matches('-');
        if out.is_empty() || out.chars().all(|c| c == '.') {
            return None;
        }
        Some(out.to_string())
    }

    /// Reads the font assets named by `config`.
    ///
    /// Relative paths are resolved against `base_dir`. A missing or unreadable file is logged
    /// and skipped: the label still renders, with the template's fallback font stack.
    pub fn load_font_faces(config: &LabelConfig, base_dir: Option<&Path>) -> Vec<FontFace> {
        let mut out = Vec::with_capacity(config.fonts.len());
        for font in &config.fonts {
            let path = match base_dir {
                Some(base) if font.path.is_relative() => base.join(&font.path),
                _ => font.path.clone(),
            };
            match std::fs::read(&path) {
                Ok(bytes) => out.push(FontFace::from_bytes(
                    font.family.clone(),
                    &path,
                    bytes,
                    font.weight.clone(),
                    font.style.clone(),
                )),
                Err(err) => {
                    tracing::warn!(
                        family = %font.family,
                        path = %path.display(),
                        %err,
                        "font asset not readable; skipping"
                    );
                }
            }
        }
        out
    }

    /// Bundles a configuration, font assets and a measurer for repeated renders.
    ///
    /// All work is CPU-bound; the only I/O helpers are [`Self::render_record_file`] and
    /// [`load_font_faces`].
    #[derive(Clone)]
    pub struct LabelRenderer {
        pub config: LabelConfig,
        pub fonts: Vec<FontFace>,
        pub measurer: Arc<dyn TextMeasurer + Send + Sync>,
    }

    impl Default for LabelRenderer {
        fn default() -> Self {
            Self::new(LabelConfig::default())
        }
    }

    impl std::fmt::Debug for LabelRenderer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("LabelRenderer")
                .field("config", &self.config)
                .field("fonts", &self.fonts.len())
                .finish_non_exhaustive()
        }
    }

    impl LabelRenderer {
        pub fn new(config: LabelConfig) -> Self {
            Self {
                config,
                fonts: Vec::new(),
                measurer: Arc::new(HeuristicTextMeasurer::default()),
            }
        }

        pub fn with_fonts(mut self, fonts: Vec<FontFace>) -> Self {
            self.fonts = fonts;
            self
        }

        pub fn with_measurer(mut self, measurer: Arc<dyn TextMeasurer + Send + Sync>) -> Self {
            self.measurer = measurer;
            self
        }

        /// Parses `template` fresh and renders `record` into it.
        pub fn render_document(
            &self,
            template: &str,
            record: &ReleaseRecord,
        ) -> Result<(SvgDocument, RenderReport)> {
            let mut doc = SvgDocument::parse(template)?;
            let report = render_label(
                &mut doc,
                record,
                &self.config,
                &self.fonts,
                self.measurer.as_ref(),
            )?;
            Ok((doc, report))
        }

        pub fn render_svg(&self, template: &str, record: &ReleaseRecord) -> Result<RenderedLabel> {
            let (doc, report) = self.render_document(template, record)?;
            Ok(RenderedLabel {
                svg: doc.to_svg_string(),
                report,
            })
        }

        /// Loads a YAML release file and renders it. Every error names the file.
        pub fn render_record_file(&self, template: &str, path: &Path) -> Result<RenderedLabel> {
            let name = path.display().to_string();
            let text = std::fs::read_to_string(path).map_err(|source| {
                HeadlessError::Io {
                    path: path.to_path_buf(),
                    source,
                }
                .for_record(name.clone())
            })?;
            let record = ReleaseRecord::from_yaml_str(&text)
                .map_err(|e| HeadlessError::from(e).for_record(name.clone()))?;
            self.render_svg(template, &record)
                .map_err(|e| e.for_record(name))
        }

        #[cfg(feature = "raster")]
        pub fn raster_options(&self) -> raster::RasterOptions {
            raster::RasterOptions {
                fonts: self.fonts.iter().map(|f| f.bytes.clone()).collect(),
                ..raster::RasterOptions::default()
            }
        }
    }
}
