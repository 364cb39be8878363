//! ホスト文書との境界
//!
//! 要素への適用（値の読み書き、画像の列挙、読み込み失敗の通知）は
//! すべてこのトレイト越しに行う。文字列の置換そのものはここに依存しない。

use crate::error::EmotionError;
use crate::pattern::{id_from_image_url, ID_PLACEHOLDER};

/// これを持つ要素は属性の中身を置換対象にする
pub const EMOTION_CONTENT_ATTR: &str = "data-emotion-content";
pub const EMOTION_ID_ATTR: &str = "data-emotion-id";

/// 要素のどこを置換するか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSlot {
    /// input / textarea の value
    Value,
    /// `data-emotion-content` 属性
    Attribute,
    /// 要素のマークアップ（innerHTML）
    Markup,
}

/// ホストが読み込み失敗時に一度だけ呼ぶ
pub type FailureListener = Box<dyn FnOnce(&mut dyn FailedImage)>;

pub trait RenderableSurface {
    type Node: Clone;
    type Image;

    fn query_selector_all(&self, selector: &str) -> Result<Vec<Self::Node>, EmotionError>;

    /// input / textarea のような値を持つ入力欄か
    fn is_text_control(&self, node: &Self::Node) -> bool;

    fn has_attribute(&self, node: &Self::Node, name: &str) -> bool;

    fn read_content(&self, node: &Self::Node, slot: ContentSlot) -> String;

    fn write_content(&mut self, node: &Self::Node, slot: ContentSlot, content: String);

    /// `node` のマークアップ内で `class_name` を持つ画像
    fn images_with_class(&self, node: &Self::Node, class_name: &str) -> Vec<Self::Image>;

    fn attach_failure_listener(&mut self, image: Self::Image, listener: FailureListener);
}

/// 読み込みに失敗した画像
pub trait FailedImage {
    fn attribute(&self, name: &str) -> Option<String>;

    /// outerHTML の置き換え
    fn replace_with(&mut self, markup: &str);

    fn alt(&self) -> String {
        self.attribute("alt").unwrap_or_default()
    }

    fn emotion_id(&self) -> Option<String> {
        self.attribute(EMOTION_ID_ATTR)
    }
}

pub trait ErrorHandler {
    fn handle(&self, image: &mut dyn FailedImage, emotion_id: Option<&str>);
}

impl<F> ErrorHandler for F
where
    F: Fn(&mut dyn FailedImage, Option<&str>),
{
    fn handle(&self, image: &mut dyn FailedImage, emotion_id: Option<&str>) {
        self(image, emotion_id)
    }
}

/// 既定：画像を alt テキストに置き換える
#[derive(Debug, Clone, Copy, Default)]
pub struct AltTextFallback;

impl ErrorHandler for AltTextFallback {
    fn handle(&self, image: &mut dyn FailedImage, _emotion_id: Option<&str>) {
        let alt = image.alt();
        image.replace_with(&alt);
    }
}

/// `[表情5]` のような括弧付き ID に置き換える
#[derive(Debug, Clone)]
pub struct BracketedIdFallback {
    pub format: String,
}

impl Default for BracketedIdFallback {
    fn default() -> Self {
        Self {
            format: crate::options::DEFAULT_ALT_FORMAT.to_string(),
        }
    }
}

impl ErrorHandler for BracketedIdFallback {
    fn handle(&self, image: &mut dyn FailedImage, emotion_id: Option<&str>) {
        // tooltip 無効時は ID 属性が無いので src から読む
        let src = image.attribute("src").unwrap_or_default();
        let id = emotion_id
            .or_else(|| id_from_image_url(&src))
            .unwrap_or_default();
        let text = self.format.replacen(ID_PLACEHOLDER, id, 1);
        image.replace_with(&text);
    }
}
