//! メモリ上の簡易文書
//!
//! ブラウザ無しで要素への適用を動かすための `RenderableSurface` 実装。
//! 要素は入れ子を持たない平らな配列で、マークアップは
//! テキスト片と `<img>` 片に分けて保持する。

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::error::EmotionError;
use crate::parser::{parse_selector, SelectorTarget};
use crate::render::html::unescape_attr;
use crate::surface::{
    ContentSlot, FailedImage, FailureListener, RenderableSurface, EMOTION_CONTENT_ATTR,
};

static IMG_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<img\b[^>]*>").expect("img regex must be valid"));

static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*"([^"]*)""#)
        .expect("attribute regex must be valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageRef {
    node: NodeId,
    fragment: usize,
}

#[derive(Debug, Clone)]
enum Fragment {
    Markup(String),
    Image(ImageElement),
}

#[derive(Debug, Clone)]
struct ImageElement {
    /// 書き込まれたままの `<img ...>`
    markup: String,
    attrs: Vec<(String, String)>,
}

impl ImageElement {
    fn parse(markup: &str) -> Self {
        let attrs = ATTR_RE
            .captures_iter(markup)
            .filter_map(|c| match (c.get(1), c.get(2)) {
                (Some(k), Some(v)) => {
                    Some((k.as_str().to_ascii_lowercase(), unescape_attr(v.as_str())))
                }
                _ => None,
            })
            .collect();
        Self {
            markup: markup.to_string(),
            attrs,
        }
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        find_attr(&self.attrs, name)
    }

    fn has_class(&self, class_name: &str) -> bool {
        self.attribute("class")
            .is_some_and(|c| c.split_ascii_whitespace().any(|have| have == class_name))
    }
}

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    value: String,
    content: Vec<Fragment>,
}

impl SelectorTarget for Element {
    fn tag_name(&self) -> &str {
        &self.tag
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        find_attr(&self.attrs, name)
    }
}

#[derive(Default)]
pub struct Document {
    elements: Vec<Element>,
    listeners: HashMap<ImageRef, FailureListener>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.elements.push(Element {
            tag: tag.to_ascii_lowercase(),
            attrs: vec![],
            value: String::new(),
            content: vec![],
        });
        NodeId(self.elements.len() - 1)
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(el) = self.elements.get_mut(node.0) else {
            return;
        };
        let name = name.to_ascii_lowercase();
        match el.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => el.attrs.push((name, value.to_string())),
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.elements
            .get(node.0)
            .and_then(|el| find_attr(&el.attrs, &name.to_ascii_lowercase()))
    }

    pub fn set_value(&mut self, node: NodeId, value: &str) {
        if let Some(el) = self.elements.get_mut(node.0) {
            el.value = value.to_string();
        }
    }

    pub fn value(&self, node: NodeId) -> &str {
        self.elements
            .get(node.0)
            .map_or("", |el| el.value.as_str())
    }

    /// 既存の画像は捨てられるので、付いていたリスナーも消える
    pub fn set_inner_html(&mut self, node: NodeId, markup: &str) {
        let Some(el) = self.elements.get_mut(node.0) else {
            return;
        };
        el.content = split_markup(markup);
        self.listeners.retain(|img, _| img.node != node);
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        let Some(el) = self.elements.get(node.0) else {
            return String::new();
        };
        el.content
            .iter()
            .map(|f| match f {
                Fragment::Markup(s) => s.as_str(),
                Fragment::Image(img) => img.markup.as_str(),
            })
            .collect()
    }

    pub fn image_attribute(&self, image: ImageRef, name: &str) -> Option<&str> {
        match self.fragment(image)? {
            Fragment::Image(img) => img.attribute(&name.to_ascii_lowercase()),
            Fragment::Markup(_) => None,
        }
    }

    pub fn has_failure_listener(&self, image: ImageRef) -> bool {
        self.listeners.contains_key(&image)
    }

    pub fn failure_listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// 画像の読み込み失敗を起こす。リスナーが走ったら true
    ///
    /// リスナーは取り外してから呼ぶので、同じ画像で二度は走らない。
    pub fn fail_image(&mut self, image: ImageRef) -> bool {
        let Some(listener) = self.listeners.remove(&image) else {
            return false;
        };
        let Some(fragment) = self
            .elements
            .get_mut(image.node.0)
            .and_then(|el| el.content.get_mut(image.fragment))
        else {
            return false;
        };
        if !matches!(fragment, Fragment::Image(_)) {
            return false;
        }

        trace!(node = image.node.0, fragment = image.fragment, "image load failure");
        listener(&mut FailingImage { fragment });
        true
    }

    fn fragment(&self, image: ImageRef) -> Option<&Fragment> {
        self.elements.get(image.node.0)?.content.get(image.fragment)
    }
}

impl RenderableSurface for Document {
    type Node = NodeId;
    type Image = ImageRef;

    fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, EmotionError> {
        let selector = parse_selector(selector)?;
        Ok(self
            .elements
            .iter()
            .enumerate()
            .filter(|(_, el)| selector.matches(*el))
            .map(|(i, _)| NodeId(i))
            .collect())
    }

    fn is_text_control(&self, node: &NodeId) -> bool {
        self.elements
            .get(node.0)
            .is_some_and(|el| matches!(el.tag.as_str(), "input" | "textarea"))
    }

    fn has_attribute(&self, node: &NodeId, name: &str) -> bool {
        self.attribute(*node, name).is_some()
    }

    fn read_content(&self, node: &NodeId, slot: ContentSlot) -> String {
        match slot {
            ContentSlot::Value => self.value(*node).to_string(),
            ContentSlot::Attribute => self
                .attribute(*node, EMOTION_CONTENT_ATTR)
                .unwrap_or_default()
                .to_string(),
            ContentSlot::Markup => self.inner_html(*node),
        }
    }

    fn write_content(&mut self, node: &NodeId, slot: ContentSlot, content: String) {
        match slot {
            ContentSlot::Value => self.set_value(*node, &content),
            ContentSlot::Attribute => self.set_attribute(*node, EMOTION_CONTENT_ATTR, &content),
            ContentSlot::Markup => self.set_inner_html(*node, &content),
        }
    }

    fn images_with_class(&self, node: &NodeId, class_name: &str) -> Vec<ImageRef> {
        let Some(el) = self.elements.get(node.0) else {
            return vec![];
        };
        el.content
            .iter()
            .enumerate()
            .filter(|(_, f)| matches!(f, Fragment::Image(img) if img.has_class(class_name)))
            .map(|(i, _)| ImageRef {
                node: *node,
                fragment: i,
            })
            .collect()
    }

    fn attach_failure_listener(&mut self, image: ImageRef, listener: FailureListener) {
        // onerror と同じく、付け直すと前のものは上書き
        self.listeners.insert(image, listener);
    }
}

struct FailingImage<'a> {
    fragment: &'a mut Fragment,
}

impl FailedImage for FailingImage<'_> {
    fn attribute(&self, name: &str) -> Option<String> {
        match &*self.fragment {
            Fragment::Image(img) => img
                .attribute(&name.to_ascii_lowercase())
                .map(str::to_string),
            Fragment::Markup(_) => None,
        }
    }

    fn replace_with(&mut self, markup: &str) {
        *self.fragment = Fragment::Markup(markup.to_string());
    }
}

fn find_attr<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

fn split_markup(markup: &str) -> Vec<Fragment> {
    let mut out = vec![];
    let mut last = 0;
    for m in IMG_TAG_RE.find_iter(markup) {
        if m.start() > last {
            out.push(Fragment::Markup(markup[last..m.start()].to_string()));
        }
        out.push(Fragment::Image(ImageElement::parse(m.as_str())));
        last = m.end();
    }
    if last < markup.len() {
        out.push(Fragment::Markup(markup[last..].to_string()));
    }
    out
}
