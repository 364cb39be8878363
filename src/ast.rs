#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// 素通しするテキスト
    Text { span: Span, text: String },
    /// `[em]e<digits>[/em]` 一つ分
    Emotion { span: Span, id: String },
}

impl Node {
    pub fn span(&self) -> Span {
        match self {
            Node::Text { span, .. } | Node::Emotion { span, .. } => *span,
        }
    }

    pub fn emotion_id(&self) -> Option<&str> {
        match self {
            Node::Emotion { id, .. } => Some(id),
            Node::Text { .. } => None,
        }
    }
}
