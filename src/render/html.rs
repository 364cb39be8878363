use crate::ast::Node;
use crate::options::EmotionOptions;
use crate::pattern::{format_alt, image_url};

pub fn ast_to_html(nodes: &[Node], opts: &EmotionOptions) -> String {
    let mut out = String::new();
    for n in nodes {
        render_node(n, opts, &mut out);
    }
    out
}

fn render_node(node: &Node, opts: &EmotionOptions, out: &mut String) {
    match node {
        // 周囲のテキストはエスケープしない（呼び出し側の責任）
        Node::Text { text, .. } => out.push_str(text),
        Node::Emotion { id, .. } => render_emotion(id, opts, out),
    }
}

/// `<img>` 一つ分を書き出す
pub fn render_emotion(id: &str, opts: &EmotionOptions, out: &mut String) {
    let alt = escape_attr(&format_alt(&opts.alt_format, id));
    let src = escape_attr(&image_url(&opts.base_url, id));

    out.push_str("<img src=\"");
    out.push_str(&src);
    out.push_str("\" alt=\"");
    out.push_str(&alt);
    out.push_str("\" class=\"");
    out.push_str(&escape_attr(&opts.class_name));
    out.push('"');

    if opts.enable_tooltip {
        out.push_str(" data-emotion-id=\"");
        out.push_str(id);
        out.push_str("\" title=\"");
        out.push_str(&alt);
        out.push('"');
    }

    let size = opts.size;
    out.push_str(&format!(
        " style=\"width:{size}px; height:{size}px; vertical-align:middle; display:inline-block; margin:0 2px;\">"
    ));
}

/// テキストノードに代入して innerHTML で読み戻したのと同じ結果
pub fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn escape_attr(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn unescape_attr(input: &str) -> String {
    input
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
