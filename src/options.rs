use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::EmotionError;
use crate::pattern::ID_PLACEHOLDER;
use crate::surface::ErrorHandler;

pub const DEFAULT_BASE_URL: &str = "https://qzonestyle.gtimg.cn/qzone/em/";
pub const DEFAULT_CLASS_NAME: &str = "qq-emotion";
pub const DEFAULT_SIZE: i64 = 24;
pub const DEFAULT_ALT_FORMAT: &str = "[表情{id}]";

/// 描画時に有効なオプション一式
#[derive(Clone)]
pub struct EmotionOptions {
    pub base_url: String,
    pub class_name: String,
    /// px
    pub size: i64,
    /// `{id}` を含むテンプレート
    pub alt_format: String,
    pub enable_tooltip: bool,
    /// 画像読み込み失敗時のハンドラ。`None` なら alt テキストに置き換える
    pub on_error: Option<Arc<dyn ErrorHandler>>,
}

impl Default for EmotionOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            class_name: DEFAULT_CLASS_NAME.to_string(),
            size: DEFAULT_SIZE,
            alt_format: DEFAULT_ALT_FORMAT.to_string(),
            enable_tooltip: true,
            on_error: None,
        }
    }
}

impl fmt::Debug for EmotionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmotionOptions")
            .field("base_url", &self.base_url)
            .field("class_name", &self.class_name)
            .field("size", &self.size)
            .field("alt_format", &self.alt_format)
            .field("enable_tooltip", &self.enable_tooltip)
            .field("on_error", &self.on_error.as_ref().map(|_| "<handler>"))
            .finish()
    }
}

impl EmotionOptions {
    /// 上書き側のキーが常に勝つ浅いマージ
    pub fn merged(&self, overrides: &EmotionOverrides) -> Self {
        Self {
            base_url: pick(&overrides.base_url, &self.base_url),
            class_name: pick(&overrides.class_name, &self.class_name),
            size: overrides.size.unwrap_or(self.size),
            alt_format: pick(&overrides.alt_format, &self.alt_format),
            enable_tooltip: overrides.enable_tooltip.unwrap_or(self.enable_tooltip),
            on_error: overrides
                .on_error
                .clone()
                .or_else(|| self.on_error.clone()),
        }
    }

    /// 描画自体は不正値でも止めない。拒否したい呼び出し側だけがこれを使う
    pub fn validate(&self) -> Result<(), EmotionError> {
        if self.size <= 0 {
            return Err(EmotionError::InvalidSize { size: self.size });
        }
        if !self.alt_format.contains(ID_PLACEHOLDER) {
            return Err(EmotionError::MissingPlaceholder {
                alt_format: self.alt_format.clone(),
            });
        }
        Ok(())
    }
}

fn pick(over: &Option<String>, base: &str) -> String {
    over.as_deref().unwrap_or(base).to_string()
}

/// 部分的な上書き。`None` は下の層の値をそのまま使う
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionOverrides {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default)]
    pub alt_format: Option<String>,
    #[serde(default)]
    pub enable_tooltip: Option<bool>,
    #[serde(skip)]
    pub on_error: Option<Arc<dyn ErrorHandler>>,
}

impl fmt::Debug for EmotionOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmotionOverrides")
            .field("base_url", &self.base_url)
            .field("class_name", &self.class_name)
            .field("size", &self.size)
            .field("alt_format", &self.alt_format)
            .field("enable_tooltip", &self.enable_tooltip)
            .field("on_error", &self.on_error.as_ref().map(|_| "<handler>"))
            .finish()
    }
}

impl EmotionOverrides {
    /// `{"size": 32, "enableTooltip": false}` のような JSON から読む。未知のキーは無視
    pub fn from_json(json: &str) -> Result<Self, EmotionError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_on_error(mut self, handler: impl ErrorHandler + 'static) -> Self {
        self.on_error = Some(Arc::new(handler));
        self
    }
}
