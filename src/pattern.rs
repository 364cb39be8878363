use once_cell::sync::Lazy;
use regex::Regex;

/// `[em]e123[/em]`。大文字小文字は区別しない
pub static EMOTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\[em\]e([0-9]+)\[/em\]").expect("emotion regex must be valid")
});

/// `image_url` で組んだ URL の末尾 `e<digits>.gif`
static IMAGE_URL_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"e([0-9]+)\.gif$").expect("image url regex must be valid")
});

pub const IMAGE_PREFIX: &str = "e";
pub const IMAGE_EXTENSION: &str = ".gif";
pub const ID_PLACEHOLDER: &str = "{id}";

/// `{id}` の最初の一箇所だけを置き換える
pub fn format_alt(alt_format: &str, id: &str) -> String {
    alt_format.replacen(ID_PLACEHOLDER, id, 1)
}

pub fn image_url(base_url: &str, id: &str) -> String {
    let mut url = String::with_capacity(base_url.len() + id.len() + 5);
    url.push_str(base_url);
    url.push_str(IMAGE_PREFIX);
    url.push_str(id);
    url.push_str(IMAGE_EXTENSION);
    url
}

/// `image_url` の逆。形が合わなければ None
pub fn id_from_image_url(url: &str) -> Option<&str> {
    IMAGE_URL_ID_RE
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}
