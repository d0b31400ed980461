use labelpress::render::{HeadlessError, LabelRenderer, load_font_faces, output_dir_name};
use labelpress::{FontFaceConfig, LabelConfig, ReleaseRecord};
use serde_json::json;
use std::path::{Path, PathBuf};

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn template() -> String {
    std::fs::read_to_string(workspace_root().join("templates/label.template.svg")).unwrap()
}

#[test]
fn renders_a_record_file() {
    let renderer = LabelRenderer::default();
    let out = renderer
        .render_record_file(
            &template(),
            &workspace_root().join("fixtures/releases/nx001.yml"),
        )
        .unwrap();
    assert_eq!(out.report.catalog, "NX001");

    let svg = roxmltree::Document::parse(&out.svg).unwrap();
    let bottom = svg
        .descendants()
        .find(|n| n.attribute("id") == Some("t_bottom"))
        .unwrap();
    assert_eq!(bottom.text(), Some("NX001 • 45 • HARDGROOVE"));
}

#[test]
fn record_errors_name_the_file() {
    let renderer = LabelRenderer::default();
    let path = workspace_root().join("fixtures/releases/broken.yml");
    let err = renderer.render_record_file(&template(), &path).unwrap_err();
    let HeadlessError::Record { record, source } = &err else {
        panic!("expected a record error, got {err:?}");
    };
    assert!(record.ends_with("broken.yml"));
    assert!(matches!(
        **source,
        HeadlessError::Core(labelpress::Error::InvalidRecordYaml { .. })
    ));

    let err = renderer
        .render_record_file(&template(), Path::new("does/not/exist.yml"))
        .unwrap_err();
    assert!(err.to_string().starts_with("does/not/exist.yml: failed to read"));
}

#[test]
fn template_errors_are_wrapped_per_record() {
    let renderer = LabelRenderer::default();
    let template = template().replace(r#"id="t_idx""#, r#"id="t_index""#);
    let record = ReleaseRecord::from_value(json!({"catalog": "NX001"})).unwrap();
    let err = renderer.render_svg(&template, &record).unwrap_err();
    assert_eq!(err.to_string(), "Missing element id='t_idx' in template");
    let err = err.for_record("nx001.yml");
    assert_eq!(
        err.to_string(),
        "nx001.yml: Missing element id='t_idx' in template"
    );
}

#[test]
fn fonts_are_loaded_relative_to_the_config_and_missing_ones_skipped() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Label.woff2"), b"wOF2").unwrap();

    let config = LabelConfig {
        fonts: vec![
            FontFaceConfig {
                family: "Label Mono".to_string(),
                path: "Label.woff2".into(),
                weight: "700".to_string(),
                style: "normal".to_string(),
            },
            FontFaceConfig {
                family: "Missing".to_string(),
                path: "Missing.ttf".into(),
                weight: "400".to_string(),
                style: "normal".to_string(),
            },
        ],
        ..LabelConfig::default()
    };
    let fonts = load_font_faces(&config, Some(dir.path()));
    assert_eq!(fonts.len(), 1);
    assert_eq!(fonts[0].family, "Label Mono");
    assert_eq!(fonts[0].mime_type, "font/woff2");

    let renderer = LabelRenderer::new(config).with_fonts(fonts);
    let out = renderer
        .render_svg(&template(), &ReleaseRecord::empty())
        .unwrap();
    assert_eq!(out.report.fonts_embedded, 1);
    assert!(out.svg.contains("font-family: \"Label Mono\";"));
    assert!(out.svg.contains("data:font/woff2;base64,d09GMg=="));
}

#[test]
fn catalog_directory_names_are_sanitized() {
    assert_eq!(output_dir_name("NX001").as_deref(), Some("NX001"));
    assert_eq!(output_dir_name(" NX 001 ").as_deref(), Some("NX-001"));
    assert_eq!(output_dir_name("../../etc").as_deref(), Some("..-..-etc"));
    assert_eq!(output_dir_name("..").as_deref(), None);
    assert_eq!(output_dir_name("   ").as_deref(), None);
    assert_eq!(output_dir_name("//").as_deref(), None);
}
