pub mod emotion_parser;
pub mod selector;

pub use emotion_parser::{extract_emotion_ids, parse_emotion_to_ast};
pub use selector::{parse_selector, SelectorList, SelectorTarget};
