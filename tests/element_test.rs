use std::cell::RefCell;
use std::rc::Rc;

use qq_emotion_parser::{
    Document, ElementTarget, EmotionError, EmotionOverrides, EmotionRenderer, FailedImage,
    RenderableSurface,
};

fn doc_with_div(html: &str) -> (Document, qq_emotion_parser::NodeId) {
    let mut doc = Document::new();
    let div = doc.create_element("div");
    doc.set_attribute(div, "class", "msg");
    doc.set_inner_html(div, html);
    (doc, div)
}

#[test]
fn test_markup_content_is_rewritten() {
    let r = EmotionRenderer::default();
    let (mut doc, div) = doc_with_div("hi [em]e5[/em]");

    r.parse_element(&mut doc, ElementTarget::Selector(".msg"))
        .unwrap();

    assert_eq!(doc.inner_html(div), r.parse("hi [em]e5[/em]"));
    let imgs = doc.images_with_class(&div, "qq-emotion");
    assert_eq!(imgs.len(), 1);
    assert_eq!(doc.image_attribute(imgs[0], "data-emotion-id"), Some("5"));
    assert!(doc.has_failure_listener(imgs[0]));
}

#[test]
fn test_text_controls_use_value() {
    let r = EmotionRenderer::default();
    let mut doc = Document::new();
    let input = doc.create_element("input");
    let area = doc.create_element("textarea");
    doc.set_value(input, "[em]e1[/em]");
    doc.set_value(area, "x[em]e2[/em]");
    doc.set_inner_html(area, "[em]e9[/em]");

    r.parse_element(&mut doc, ElementTarget::Selector("input, textarea"))
        .unwrap();

    assert_eq!(doc.value(input), r.parse("[em]e1[/em]"));
    assert_eq!(doc.value(area), r.parse("x[em]e2[/em]"));
    // value を処理した要素のマークアップには触れない
    assert_eq!(doc.inner_html(area), "[em]e9[/em]");
    assert_eq!(doc.failure_listener_count(), 0);
}

#[test]
fn test_content_attribute_is_rewritten() {
    let r = EmotionRenderer::default();
    let mut doc = Document::new();
    let span = doc.create_element("span");
    doc.set_attribute(span, "data-emotion-content", "[em]e3[/em]");
    doc.set_inner_html(span, "[em]e4[/em]");

    r.parse_element(&mut doc, ElementTarget::Node(span)).unwrap();

    assert_eq!(
        doc.attribute(span, "data-emotion-content"),
        Some(r.parse("[em]e3[/em]").as_str())
    );
    assert_eq!(doc.inner_html(span), "[em]e4[/em]");
}

#[test]
fn test_zero_matches_is_noop() {
    let r = EmotionRenderer::default();
    let (mut doc, div) = doc_with_div("[em]e1[/em]");

    r.parse_element(&mut doc, ElementTarget::Selector("#missing"))
        .unwrap();

    assert_eq!(doc.inner_html(div), "[em]e1[/em]");
}

#[test]
fn test_bad_selector_is_reported() {
    let r = EmotionRenderer::default();
    let (mut doc, _) = doc_with_div("");
    let result = r.parse_element(&mut doc, ElementTarget::Selector("div >"));
    match result {
        Err(EmotionError::Selector(_)) => {}
        _ => panic!("Expected Selector error"),
    }
}

#[test]
fn test_failed_image_falls_back_to_alt() {
    let r = EmotionRenderer::default();
    let (mut doc, div) = doc_with_div("a[em]e5[/em]b");
    r.parse_element(&mut doc, ElementTarget::Node(div)).unwrap();

    let img = doc.images_with_class(&div, "qq-emotion")[0];
    assert!(doc.fail_image(img));
    assert_eq!(doc.inner_html(div), "a[表情5]b");

    // 二度目は走らない
    assert!(!doc.fail_image(img));
    assert_eq!(doc.inner_html(div), "a[表情5]b");
}

#[test]
fn test_custom_error_handler() {
    let seen = Rc::new(RefCell::new(vec![]));
    let sink = Rc::clone(&seen);
    let r = EmotionRenderer::new(EmotionOverrides::default().with_on_error(
        move |img: &mut dyn FailedImage, id: Option<&str>| {
            sink.borrow_mut().push(id.map(str::to_string));
            img.replace_with("?");
        },
    ));

    let (mut doc, div) = doc_with_div("[em]e1[/em][em]e2[/em]");
    r.parse_element(&mut doc, ElementTarget::Node(div)).unwrap();

    let imgs = doc.images_with_class(&div, "qq-emotion");
    assert_eq!(imgs.len(), 2);
    assert!(doc.fail_image(imgs[1]));

    assert_eq!(*seen.borrow(), vec![Some("2".to_string())]);
    assert!(doc.inner_html(div).ends_with('?'));
    assert!(doc.inner_html(div).starts_with("<img "));
}

#[test]
fn test_handler_uses_call_class_name() {
    let r = EmotionRenderer::default();
    let (mut doc, div) = doc_with_div("[em]e1[/em]");
    let o = EmotionOverrides {
        class_name: Some("face".into()),
        ..Default::default()
    };
    r.parse_element_with(&mut doc, ElementTarget::Node(div), &o)
        .unwrap();

    assert!(doc.images_with_class(&div, "qq-emotion").is_empty());
    let imgs = doc.images_with_class(&div, "face");
    assert_eq!(imgs.len(), 1);
    assert!(doc.has_failure_listener(imgs[0]));
}

#[test]
fn test_existing_images_with_class_get_handlers() {
    let r = EmotionRenderer::default();
    let (mut doc, div) = doc_with_div(r#"<img class="qq-emotion" alt="old" src="x.gif">"#);
    r.parse_element(&mut doc, ElementTarget::Node(div)).unwrap();

    let img = doc.images_with_class(&div, "qq-emotion")[0];
    assert!(doc.fail_image(img));
    assert_eq!(doc.inner_html(div), "old");
}

#[test]
fn test_safe_parse_element() {
    let r = EmotionRenderer::default();
    let mut doc = Document::new();
    let div = doc.create_element("div");
    doc.set_inner_html(div, "<b>[em]e7[/em]</b>");

    r.safe_parse_element(&mut doc, ElementTarget::Node(div))
        .unwrap();

    let html = doc.inner_html(div);
    assert!(html.starts_with("&lt;b&gt;<img "));
    assert!(html.ends_with("&lt;/b&gt;"));

    let img = doc.images_with_class(&div, "qq-emotion")[0];
    assert!(doc.fail_image(img));
    assert_eq!(doc.inner_html(div), "&lt;b&gt;[表情7]&lt;/b&gt;");
}

#[test]
fn test_safe_fallback_ignores_custom_alt_format() {
    let r = EmotionRenderer::new(EmotionOverrides {
        alt_format: Some("emotion {id}".into()),
        ..Default::default()
    });
    let mut doc = Document::new();
    let div = doc.create_element("div");
    doc.set_inner_html(div, "[em]e8[/em]");
    r.safe_parse_element(&mut doc, ElementTarget::Node(div))
        .unwrap();

    let img = doc.images_with_class(&div, "qq-emotion")[0];
    assert_eq!(doc.image_attribute(img, "alt"), Some("emotion 8"));
    assert!(doc.fail_image(img));
    assert_eq!(doc.inner_html(div), "[表情8]");
}

#[test]
fn test_reparse_replaces_old_listeners() {
    let r = EmotionRenderer::default();
    let (mut doc, div) = doc_with_div("[em]e1[/em]");
    r.parse_element(&mut doc, ElementTarget::Node(div)).unwrap();
    assert_eq!(doc.failure_listener_count(), 1);

    r.parse_element(&mut doc, ElementTarget::Node(div)).unwrap();
    assert_eq!(doc.failure_listener_count(), 1);
}

#[test]
fn test_safe_fallback_reads_id_from_src_without_tooltip() {
    let r = EmotionRenderer::new(EmotionOverrides {
        enable_tooltip: Some(false),
        ..Default::default()
    });
    let mut doc = Document::new();
    let div = doc.create_element("div");
    doc.set_inner_html(div, "a[em]e12[/em]b");
    r.safe_parse_element(&mut doc, ElementTarget::Node(div))
        .unwrap();

    let img = doc.images_with_class(&div, "qq-emotion")[0];
    assert_eq!(doc.image_attribute(img, "data-emotion-id"), None);
    assert!(doc.fail_image(img));
    assert_eq!(doc.inner_html(div), "a[表情12]b");
}

#[test]
fn test_non_ascii_digits_leave_element_untouched() {
    let r = EmotionRenderer::default();
    let (mut doc, div) = doc_with_div("[em]e\u{FF15}[/em]");
    r.parse_element(&mut doc, ElementTarget::Node(div)).unwrap();

    assert_eq!(doc.inner_html(div), "[em]e\u{FF15}[/em]");
    assert!(doc.images_with_class(&div, "qq-emotion").is_empty());
}
