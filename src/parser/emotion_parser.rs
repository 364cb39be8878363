use std::collections::HashSet;

use tracing::trace;

use crate::ast::{Node, Span};
use crate::pattern::EMOTION_RE;

/// 公開API：入力文字列をASTにパース
///
/// トークン以外の部分は `Node::Text` としてそのまま残るので、
/// 全ノードの span を繋げると入力全体になる。
pub fn parse_emotion_to_ast(input: &str) -> Vec<Node> {
    let mut nodes = vec![];
    let mut last = 0;

    for caps in EMOTION_RE.captures_iter(input) {
        let (Some(whole), Some(digits)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        if whole.start() > last {
            nodes.push(text_node(input, last, whole.start()));
        }

        let id = digits.as_str().trim().to_string();
        trace!(id = %id, start = whole.start(), "emotion token");
        nodes.push(Node::Emotion {
            span: Span {
                start: whole.start(),
                end: whole.end(),
            },
            id,
        });
        last = whole.end();
    }

    if last < input.len() {
        nodes.push(text_node(input, last, input.len()));
    }

    nodes
}

/// 出現順を保ったまま重複を除いた ID 一覧
///
/// 走査位置を保持しないので、同じ入力に何度呼んでも結果は同じ。
pub fn extract_emotion_ids(input: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ids = vec![];

    for node in parse_emotion_to_ast(input) {
        if let Node::Emotion { id, .. } = node {
            if seen.insert(id.clone()) {
                ids.push(id);
            }
        }
    }

    ids
}

fn text_node(input: &str, start: usize, end: usize) -> Node {
    Node::Text {
        span: Span { start, end },
        text: input[start..end].to_string(),
    }
}
