use crate::*;
use serde_json::json;

fn render(template: &str, record: serde_json::Value, defaults: &str) -> String {
    let rec = ReleaseRecord::from_value(record).unwrap();
    let defaults = TemplateDefaults::parse(defaults);
    ValueTemplate::parse(template)
        .unwrap()
        .render(&Resolver::new(&rec, &defaults))
}

#[test]
fn literal_text_and_placeholders_are_interleaved() {
    assert_eq!(
        render("SERIAL: {serial}", json!({"serial": "0042"}), ""),
        "SERIAL: 0042"
    );
}

#[test]
fn placeholder_fallbacks_apply_per_field() {
    assert_eq!(
        render(
            "{catalog} • {speed|33⅓} • {genre|HARDGROOVE}",
            json!({"catalog": "NX001", "genre": "ACID"}),
            ""
        ),
        "NX001 • 33⅓ • ACID"
    );
}

#[test]
fn placeholders_consult_template_defaults() {
    assert_eq!(
        render("{coords.lat|?}/{genre|HARDGROOVE}", json!({}), "COORDS_LAT=52.5\nGENRE=DUB"),
        "52.5/DUB"
    );
}

#[test]
fn doubled_braces_are_literal() {
    assert_eq!(render("{{{catalog}}}", json!({"catalog": "X"}), ""), "{X}");
}

#[test]
fn malformed_templates_are_rejected() {
    for bad in ["{catalog", "catalog}", "{}", "{ | x}", "{cat alog}"] {
        let err = ValueTemplate::parse(bad).unwrap_err();
        assert!(
            matches!(err, Error::InvalidValueTemplate { .. }),
            "{bad}: {err}"
        );
    }
}

#[test]
fn field_paths_are_listed_in_order() {
    let t = ValueTemplate::parse("{Catalog} {coords.lat|0}").unwrap();
    assert_eq!(t.field_paths().collect::<Vec<_>>(), vec!["catalog", "coords.lat"]);
}
