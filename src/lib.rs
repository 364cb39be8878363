pub mod ast;
pub mod dom;
pub mod error;
pub mod options;
pub mod pattern;
pub mod renderer;
pub mod surface;

pub mod parser;
pub mod render;

pub use ast::{Node, Span};
pub use dom::{Document, ImageRef, NodeId};
pub use error::EmotionError;
pub use options::{EmotionOptions, EmotionOverrides};
pub use renderer::{ElementTarget, EmotionRenderer};
pub use surface::{
    AltTextFallback, BracketedIdFallback, ContentSlot, ErrorHandler, FailedImage,
    FailureListener, RenderableSurface,
};

pub use parser::{extract_emotion_ids, parse_emotion_to_ast};
pub use render::ast_to_html;

/// 既定オプションでの一発変換
pub fn emotion_to_html(input: &str) -> String {
    EmotionRenderer::default().parse(input)
}
