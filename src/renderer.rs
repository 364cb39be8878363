use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::error::EmotionError;
use crate::options::{EmotionOptions, EmotionOverrides};
use crate::parser::{extract_emotion_ids, parse_emotion_to_ast};
use crate::render::{ast_to_html, escape_text};
use crate::surface::{
    AltTextFallback, BracketedIdFallback, ContentSlot, ErrorHandler, FailedImage,
    RenderableSurface, EMOTION_CONTENT_ATTR,
};

/// `parse_element` の対象
#[derive(Debug, Clone)]
pub enum ElementTarget<'a, N> {
    /// セレクタに合う全要素
    Selector(&'a str),
    /// この要素だけ
    Node(N),
}

/// 表情コードを `<img>` に置き換えるレンダラ
///
/// 有効なオプションは「既定値 ← `set_config` で積んだ上書き ← 呼び出しごとの上書き」
/// の順に重ねたもの。`set_config` / `reset_config` は `&mut self` を取るので、
/// 変更はそれ以降の呼び出しにだけ効く。
#[derive(Debug, Clone)]
pub struct EmotionRenderer {
    options: EmotionOptions,
}

impl Default for EmotionRenderer {
    fn default() -> Self {
        Self::new(EmotionOverrides::default())
    }
}

impl EmotionRenderer {
    pub fn new(overrides: EmotionOverrides) -> Self {
        let options = EmotionOptions::default().merged(&overrides);
        warn_if_malformed(&options);
        Self { options }
    }

    pub fn options(&self) -> &EmotionOptions {
        &self.options
    }

    pub fn parse(&self, text: &str) -> String {
        self.parse_with(text, &EmotionOverrides::default())
    }

    /// 周囲のテキストはエスケープしない。信頼できない入力には `safe_parse` を使う
    pub fn parse_with(&self, text: &str, overrides: &EmotionOverrides) -> String {
        if text.is_empty() {
            return String::new();
        }
        render_text(text, &self.options.merged(overrides))
    }

    /// 文字列以外（null・数値・配列など）はそのまま返す
    pub fn parse_value(&self, value: &Value, overrides: &EmotionOverrides) -> Value {
        match value {
            Value::String(s) => Value::String(self.parse_with(s, overrides)),
            other => other.clone(),
        }
    }

    pub fn parse_batch<I, S>(&self, texts: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.parse_batch_with(texts, &EmotionOverrides::default())
    }

    pub fn parse_batch_with<I, S>(&self, texts: I, overrides: &EmotionOverrides) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let opts = self.options.merged(overrides);
        texts
            .into_iter()
            .map(|t| render_text(t.as_ref(), &opts))
            .collect()
    }

    /// HTML として解釈される文字を先にエスケープしてから置換する
    pub fn safe_parse(&self, text: &str) -> String {
        self.parse_with(&escape_text(text), &safe_overrides())
    }

    pub fn extract_emotion_ids(&self, text: &str) -> Vec<String> {
        extract_emotion_ids(text)
    }

    pub fn parse_element<S: RenderableSurface>(
        &self,
        surface: &mut S,
        target: ElementTarget<'_, S::Node>,
    ) -> Result<(), EmotionError> {
        self.apply_to_elements(surface, target, &EmotionOverrides::default(), false)
    }

    pub fn parse_element_with<S: RenderableSurface>(
        &self,
        surface: &mut S,
        target: ElementTarget<'_, S::Node>,
        overrides: &EmotionOverrides,
    ) -> Result<(), EmotionError> {
        self.apply_to_elements(surface, target, overrides, false)
    }

    /// 要素の現在の中身を生テキストとみなしてエスケープし、失敗した画像は `[表情<id>]` にする
    pub fn safe_parse_element<S: RenderableSurface>(
        &self,
        surface: &mut S,
        target: ElementTarget<'_, S::Node>,
    ) -> Result<(), EmotionError> {
        self.apply_to_elements(surface, target, &safe_overrides(), true)
    }

    pub fn set_config(&mut self, overrides: &EmotionOverrides) {
        self.options = self.options.merged(overrides);
        warn_if_malformed(&self.options);
    }

    /// コンストラクタで渡した上書きも含めて捨てる
    pub fn reset_config(&mut self) {
        self.options = EmotionOptions::default();
    }

    fn apply_to_elements<S: RenderableSurface>(
        &self,
        surface: &mut S,
        target: ElementTarget<'_, S::Node>,
        overrides: &EmotionOverrides,
        escape: bool,
    ) -> Result<(), EmotionError> {
        let opts = self.options.merged(overrides);

        let nodes = match target {
            ElementTarget::Selector(selector) => {
                let nodes = surface.query_selector_all(selector)?;
                debug!(selector, matched = nodes.len(), "resolved emotion targets");
                nodes
            }
            ElementTarget::Node(node) => vec![node],
        };

        for node in &nodes {
            let slot = content_slot(surface, node);
            let mut content = surface.read_content(node, slot);
            if escape {
                content = escape_text(&content);
            }
            if !content.is_empty() {
                content = render_text(&content, &opts);
            }
            surface.write_content(node, slot, content);
        }

        bind_error_handling(surface, &nodes, &opts);
        Ok(())
    }
}

fn render_text(text: &str, opts: &EmotionOptions) -> String {
    ast_to_html(&parse_emotion_to_ast(text), opts)
}

fn safe_overrides() -> EmotionOverrides {
    EmotionOverrides::default().with_on_error(BracketedIdFallback::default())
}

fn content_slot<S: RenderableSurface>(surface: &S, node: &S::Node) -> ContentSlot {
    if surface.is_text_control(node) {
        ContentSlot::Value
    } else if surface.has_attribute(node, EMOTION_CONTENT_ATTR) {
        ContentSlot::Attribute
    } else {
        ContentSlot::Markup
    }
}

fn bind_error_handling<S: RenderableSurface>(
    surface: &mut S,
    nodes: &[S::Node],
    opts: &EmotionOptions,
) {
    let handler: Arc<dyn ErrorHandler> = match &opts.on_error {
        Some(h) => Arc::clone(h),
        None => Arc::new(AltTextFallback),
    };

    let mut attached = 0usize;
    for node in nodes {
        for image in surface.images_with_class(node, &opts.class_name) {
            let handler = Arc::clone(&handler);
            surface.attach_failure_listener(
                image,
                Box::new(move |img: &mut dyn FailedImage| {
                    let id = img.emotion_id();
                    trace!(id = ?id, "emotion image failed to load");
                    handler.handle(img, id.as_deref());
                }),
            );
            attached += 1;
        }
    }

    debug!(attached, class_name = %opts.class_name, "bound emotion error handlers");
}

fn warn_if_malformed(opts: &EmotionOptions) {
    if let Err(e) = opts.validate() {
        warn!(error = %e, "emotion options are malformed, rendering them as given");
    }
}
