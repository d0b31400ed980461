use labelpress::LabelConfig;
use labelpress::render::raster::{self, RasterError, RasterOptions};
use labelpress::render::{
    HeadlessError, LabelRenderer, RenderedLabel, SvgDocument, load_font_faces, output_dir_name,
};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Config {
        path: PathBuf,
        source: labelpress::Error,
    },
    Headless(HeadlessError),
    Raster(RasterError),
    MissingCatalog,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io { path, source } => write!(f, "I/O error on {}: {source}", path.display()),
            CliError::Config { path, source } => write!(f, "{}: {source}", path.display()),
            CliError::Headless(err) => write!(f, "{err}"),
            CliError::Raster(err) => write!(f, "{err}"),
            CliError::MissingCatalog => {
                write!(f, "record has no usable catalog (needed for the output directory)")
            }
        }
    }
}

impl From<HeadlessError> for CliError {
    fn from(value: HeadlessError) -> Self {
        Self::Headless(value)
    }
}

impl From<RasterError> for CliError {
    fn from(value: RasterError) -> Self {
        Self::Raster(value)
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> CliError + '_ {
    move |source| CliError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Render,
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Svg,
    Png,
    Jpeg,
    Pdf,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Pdf => "pdf",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "pdf" => Ok(Self::Pdf),
            _ => Err(()),
        }
    }
}

#[derive(Debug)]
struct Args {
    command: Command,
    inputs: Vec<PathBuf>,
    template: PathBuf,
    config: Option<PathBuf>,
    out_dir: PathBuf,
    formats: Vec<OutputFormat>,
    width_px: u32,
    background: Option<String>,
    verbose: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            command: Command::Render,
            inputs: Vec::new(),
            template: PathBuf::from("templates/label.template.svg"),
            config: None,
            out_dir: PathBuf::from("rendered"),
            formats: vec![OutputFormat::Svg],
            width_px: raster::DEFAULT_WIDTH_PX,
            background: None,
            verbose: false,
        }
    }
}

fn usage() -> &'static str {
    "labelpress-cli\n\
\n\
USAGE:\n\
  labelpress-cli [render] [--template <svg>] [--config <yml|json>] [--out-dir <dir>] [--format svg,png,jpg,pdf] [--width <px>] [--background <css-color>] [--verbose] [<record.yml|dir>...]\n\
  labelpress-cli check [--template <svg>] [--config <yml|json>] [--verbose] [<record.yml|dir>...]\n\
\n\
NOTES:\n\
  - Directories expand to their *.yml/*.yaml files, in sorted order; without inputs, ./releases is used.\n\
  - Each record renders to <out-dir>/<catalog>/label.<ext> (defaults: ./rendered, svg).\n\
  - Raster exports default to 3000px wide; fonts listed in the config are embedded and rasterized.\n\
  - A failing record is reported and skipped; the exit code is 1 if any record failed.\n\
  - check renders every record without writing anything.\n\
  - Log filtering follows LABELPRESS_LOG (default: warn); --verbose sets debug.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "render" => args.command = Command::Render,
            "check" => args.command = Command::Check,
            "--verbose" | "-v" => args.verbose = true,
            "--template" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.template = PathBuf::from(path);
            }
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(PathBuf::from(path));
            }
            "--out-dir" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out_dir = PathBuf::from(path);
            }
            "--format" => {
                let Some(list) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                let mut formats = Vec::new();
                for part in list.split(',').filter(|p| !p.trim().is_empty()) {
                    let format = part
                        .parse::<OutputFormat>()
                        .map_err(|_| CliError::Usage(usage()))?;
                    if !formats.contains(&format) {
                        formats.push(format);
                    }
                }
                if formats.is_empty() {
                    return Err(CliError::Usage(usage()));
                }
                args.formats = formats;
            }
            "--width" => {
                let Some(width) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.width_px = width.parse::<u32>().map_err(|_| CliError::Usage(usage()))?;
                if args.width_px == 0 {
                    return Err(CliError::Usage(usage()));
                }
            }
            "--background" => {
                let Some(bg) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                if !bg.trim().is_empty() {
                    args.background = Some(bg.trim().to_string());
                }
            }
            "--" => {
                args.inputs.extend(it.by_ref().map(PathBuf::from));
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => args.inputs.push(PathBuf::from(path)),
        }
    }

    if args.inputs.is_empty() {
        args.inputs.push(PathBuf::from("releases"));
    }
    Ok(args)
}

fn init_logging(verbose: bool) {
    let env = env_logger::Env::new().filter_or("LABELPRESS_LOG", "warn");
    let mut builder = env_logger::Builder::from_env(env);
    if verbose {
        builder.parse_filters("debug");
    }
    let _ = builder.format_timestamp(None).try_init();
}

fn load_config(path: Option<&Path>) -> Result<LabelConfig, CliError> {
    let Some(path) = path else {
        return Ok(LabelConfig::default());
    };
    let text = std::fs::read_to_string(path).map_err(io_error(path))?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let parsed = if is_json {
        LabelConfig::from_json_str(&text)
    } else {
        LabelConfig::from_yaml_str(&text)
    };
    parsed.map_err(|source| CliError::Config {
        path: path.to_path_buf(),
        source,
    })
}

fn is_record_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yml") || e.eq_ignore_ascii_case("yaml"))
}

/// Expands directories to their record files (sorted); files are taken as given.
fn collect_records(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, CliError> {
    let mut out = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found = Vec::new();
            for entry in std::fs::read_dir(input).map_err(io_error(input))? {
                let path = entry.map_err(io_error(input))?.path();
                if is_record_file(&path) {
                    found.push(path);
                }
            }
            found.sort();
            out.extend(found);
        } else {
            out.push(input.clone());
        }
    }
    Ok(out)
}

fn render_record(
    renderer: &LabelRenderer,
    template: &str,
    record: &Path,
    args: &Args,
    raster_options: &RasterOptions,
) -> Result<Option<PathBuf>, CliError> {
    let RenderedLabel { svg, report } = renderer.render_record_file(template, record)?;
    let dir_name = output_dir_name(&report.catalog).ok_or(CliError::MissingCatalog)?;

    if args.command == Command::Check {
        let lines: Vec<String> = report
            .columns
            .iter()
            .map(|c| format!("{}={}", c.element_id, c.line_count))
            .collect();
        println!("ok {} ({dir_name}; {})", record.display(), lines.join(", "));
        return Ok(None);
    }

    let dir = args.out_dir.join(dir_name);
    std::fs::create_dir_all(&dir).map_err(io_error(&dir))?;
    for format in &args.formats {
        let bytes = match format {
            OutputFormat::Svg => svg.as_bytes().to_vec(),
            OutputFormat::Png => raster::svg_to_png(&svg, raster_options)?,
            OutputFormat::Jpeg => raster::svg_to_jpeg(&svg, raster_options)?,
            OutputFormat::Pdf => raster::svg_to_pdf(&svg, raster_options)?,
        };
        let out = dir.join(format!("label.{}", format.extension()));
        std::fs::write(&out, bytes).map_err(io_error(&out))?;
    }
    Ok(Some(dir))
}

/// Returns the number of records that failed.
fn run(args: Args) -> Result<usize, CliError> {
    let config = load_config(args.config.as_deref())?;
    let font_base = args
        .config
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf);
    let fonts = load_font_faces(&config, font_base.as_deref());

    let template = std::fs::read_to_string(&args.template).map_err(io_error(&args.template))?;
    // A malformed template would fail every record the same way; report it once.
    SvgDocument::parse(&template)
        .map_err(|e| HeadlessError::from(e).for_record(args.template.display().to_string()))?;

    let records = collect_records(&args.inputs)?;
    if records.is_empty() {
        eprintln!("No release records found");
        return Ok(0);
    }

    let renderer = LabelRenderer::new(config).with_fonts(fonts);
    let raster_options = RasterOptions {
        width_px: Some(args.width_px),
        background: args.background.clone(),
        ..renderer.raster_options()
    };

    let mut failures = 0usize;
    for record in &records {
        match render_record(&renderer, &template, record, &args, &raster_options) {
            Ok(Some(dir)) => println!("Rendered {} -> {}", record.display(), dir.display()),
            Ok(None) => {}
            // Headless errors already name the record.
            Err(err @ CliError::Headless(_)) => {
                failures += 1;
                eprintln!("error: {err}");
            }
            Err(err) => {
                failures += 1;
                eprintln!("error: {}: {err}", record.display());
            }
        }
    }
    tracing::debug!(records = records.len(), failures, "batch finished");
    Ok(failures)
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    init_logging(args.verbose);

    match run(args) {
        Ok(0) => {}
        Ok(_) => std::process::exit(1),
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
