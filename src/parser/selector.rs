use pest::Parser;
use pest_derive::Parser;

use crate::error::EmotionError;

#[derive(Parser)]
#[grammar = "selector.pest"]
pub struct SelectorParser;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrSelector {
    pub name: String,
    /// `[name]` なら None
    pub value: Option<String>,
}

/// `div.note[data-x]` のような複合セレクタ一つ分
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompoundSelector {
    /// None は `*` か型指定なし
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<AttrSelector>,
}

/// カンマ区切りのセレクタ列。どれか一つに合えばマッチ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList(pub Vec<CompoundSelector>);

/// セレクタを当てる側が提供するもの
pub trait SelectorTarget {
    fn tag_name(&self) -> &str;
    fn attribute(&self, name: &str) -> Option<&str>;
}

impl CompoundSelector {
    pub fn matches<T: SelectorTarget + ?Sized>(&self, el: &T) -> bool {
        if let Some(tag) = &self.tag {
            if !tag.eq_ignore_ascii_case(el.tag_name()) {
                return false;
            }
        }

        if let Some(id) = &self.id {
            if el.attribute("id") != Some(id.as_str()) {
                return false;
            }
        }

        if !self.classes.is_empty() {
            let class_attr = el.attribute("class").unwrap_or("");
            let has_all = self
                .classes
                .iter()
                .all(|c| class_attr.split_ascii_whitespace().any(|have| have == c));
            if !has_all {
                return false;
            }
        }

        self.attrs.iter().all(|a| match (el.attribute(&a.name), &a.value) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(have), Some(want)) => have == want,
        })
    }
}

impl SelectorList {
    pub fn matches<T: SelectorTarget + ?Sized>(&self, el: &T) -> bool {
        self.0.iter().any(|c| c.matches(el))
    }
}

pub fn parse_selector(input: &str) -> Result<SelectorList, EmotionError> {
    let pairs = SelectorParser::parse(Rule::selector_list, input)?;

    let mut compounds = vec![];
    for list in pairs {
        for compound in list.into_inner() {
            if compound.as_rule() == Rule::compound {
                compounds.push(build_compound(compound));
            }
        }
    }

    Ok(SelectorList(compounds))
}

fn build_compound(pair: pest::iterators::Pair<Rule>) -> CompoundSelector {
    let mut sel = CompoundSelector::default();

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::type_sel => sel.tag = Some(part.as_str().to_ascii_lowercase()),
            Rule::id_sel => sel.id = first_ident(part),
            Rule::class_sel => sel.classes.extend(first_ident(part)),
            Rule::attr_sel => {
                let mut inner = part.into_inner();
                let Some(name) = inner.next() else { continue };
                sel.attrs.push(AttrSelector {
                    name: name.as_str().to_ascii_lowercase(),
                    value: inner.next().map(|v| v.as_str().to_string()),
                });
            }
            // universal
            _ => {}
        }
    }

    sel
}

fn first_ident(pair: pest::iterators::Pair<Rule>) -> Option<String> {
    pair.into_inner().next().map(|p| p.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct El {
        tag: &'static str,
        attrs: Vec<(&'static str, &'static str)>,
    }

    impl SelectorTarget for El {
        fn tag_name(&self) -> &str {
            self.tag
        }

        fn attribute(&self, name: &str) -> Option<&str> {
            self.attrs.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
        }
    }

    #[test]
    fn parses_compound_and_list() {
        let list = parse_selector("div.msg#a[data-x], textarea").unwrap();
        assert_eq!(list.0.len(), 2);
        assert_eq!(list.0[0].tag.as_deref(), Some("div"));
        assert_eq!(list.0[0].id.as_deref(), Some("a"));
        assert_eq!(list.0[0].classes, vec!["msg".to_string()]);
        assert_eq!(list.0[0].attrs[0].name, "data-x");
        assert_eq!(list.0[1].tag.as_deref(), Some("textarea"));
    }

    #[test]
    fn matches_classes_and_attr_values() {
        let el = El {
            tag: "DIV",
            attrs: vec![("class", "feed  msg"), ("data-kind", "chat")],
        };
        assert!(parse_selector(".msg").unwrap().matches(&el));
        assert!(parse_selector("div.feed.msg").unwrap().matches(&el));
        assert!(parse_selector(r#"[data-kind="chat"]"#).unwrap().matches(&el));
        assert!(parse_selector("*").unwrap().matches(&el));
        assert!(!parse_selector(r#"[data-kind="mail"]"#).unwrap().matches(&el));
        assert!(!parse_selector("span, #x").unwrap().matches(&el));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_selector("div >"),
            Err(EmotionError::Selector(_))
        ));
        assert!(parse_selector("").is_err());
    }
}
