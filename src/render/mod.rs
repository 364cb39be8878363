pub mod html;

pub use html::{ast_to_html, escape_attr, escape_text};
