//! Ant build files.
//!
//! Toggles are `<property name="SYM" value="true|false"/>` elements. Edits
//! are textual: only the characters of the targeted `value` attribute
//! change. Ant properties are immutable once set, so the first definition of
//! a name is the one that counts; later duplicates and anything inside
//! `<!-- -->` comments are ignored.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use super::SymbolError;

static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static PROJECT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<project\b").unwrap());
static PROPERTY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<property\b[^>]*>").unwrap());
static NAME_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\sname\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());
static VALUE_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\svalue\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());

/// An Ant build file held as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AntDocument {
    text: String,
}

impl AntDocument {
    pub fn parse(text: &str) -> Result<Self, String> {
        let doc = AntDocument {
            text: text.to_string(),
        };
        let comments = doc.comment_ranges();
        let has_project = PROJECT
            .find_iter(text)
            .any(|m| !in_comment(&comments, m.start()));
        if !has_project {
            return Err("not an Ant build file (no <project> element)".to_string());
        }
        Ok(doc)
    }

    pub fn get(&self, symbol: &str) -> Option<bool> {
        let span = self.value_span(symbol).ok()?;
        let value = self.text[span].trim();
        if value.eq_ignore_ascii_case("true") {
            Some(true)
        } else if value.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            None
        }
    }

    pub fn set(&mut self, symbol: &str, enabled: bool) -> Result<(), SymbolError> {
        let span = self.value_span(symbol)?;
        self.text
            .replace_range(span, if enabled { "true" } else { "false" });
        Ok(())
    }

    pub fn render(&self) -> String {
        self.text.clone()
    }

    fn comment_ranges(&self) -> Vec<Range<usize>> {
        COMMENT.find_iter(&self.text).map(|m| m.range()).collect()
    }

    /// Byte range of the `value` attribute contents of the first live
    /// `<property>` named `symbol`.
    fn value_span(&self, symbol: &str) -> Result<Range<usize>, SymbolError> {
        let comments = self.comment_ranges();

        for tag in PROPERTY.find_iter(&self.text) {
            if in_comment(&comments, tag.start()) {
                continue;
            }
            let attrs = tag.as_str();
            let name = NAME_ATTR
                .captures(attrs)
                .and_then(|c| c.get(1).or_else(|| c.get(2)));
            if name.map(|m| m.as_str()) != Some(symbol) {
                continue;
            }

            let value = VALUE_ATTR
                .captures(attrs)
                .and_then(|c| c.get(1).or_else(|| c.get(2)))
                .ok_or_else(|| SymbolError::NoValue(symbol.to_string()))?;
            return Ok(tag.start() + value.start()..tag.start() + value.end());
        }

        Err(SymbolError::NotDeclared(symbol.to_string()))
    }
}

fn in_comment(comments: &[Range<usize>], pos: usize) -> bool {
    comments.iter().any(|c| c.contains(&pos))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUILD_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project name="PivApplet" default="dist" basedir=".">
  <!-- <property name="PIV_SUPPORT_RSA" value="commented"/> -->
  <property name="PIV_SUPPORT_RSA" value="true"/>
  <property value='false' name='PIV_SUPPORT_EC' />
  <property name="JC_HOME" location="${env.JC_HOME}"/>
  <property name="PIV_SUPPORT_RSA" value="false"/>
  <target name="dist"/>
</project>
"#;

    #[test]
    fn test_get_first_live_definition() {
        let doc = AntDocument::parse(BUILD_XML).unwrap();
        assert_eq!(doc.get("PIV_SUPPORT_RSA"), Some(true));
        assert_eq!(doc.get("PIV_SUPPORT_EC"), Some(false));
        assert_eq!(doc.get("JC_HOME"), None);
        assert_eq!(doc.get("MISSING"), None);
    }

    #[test]
    fn test_set_only_touches_value_attribute() {
        let mut doc = AntDocument::parse(BUILD_XML).unwrap();
        doc.set("PIV_SUPPORT_RSA", false).unwrap();
        doc.set("PIV_SUPPORT_EC", true).unwrap();

        let expected = BUILD_XML
            .replacen(
                r#"<property name="PIV_SUPPORT_RSA" value="true"/>"#,
                r#"<property name="PIV_SUPPORT_RSA" value="false"/>"#,
                1,
            )
            .replace(
                "<property value='false' name='PIV_SUPPORT_EC' />",
                "<property value='true' name='PIV_SUPPORT_EC' />",
            );
        assert_eq!(doc.render(), expected);
        assert!(doc.render().contains(r#"value="commented""#));
    }

    #[test]
    fn test_set_errors() {
        let mut doc = AntDocument::parse(BUILD_XML).unwrap();
        assert_eq!(
            doc.set("JC_HOME", true),
            Err(SymbolError::NoValue("JC_HOME".to_string()))
        );
        assert_eq!(
            doc.set("PIV_SUPPORT_AES", true),
            Err(SymbolError::NotDeclared("PIV_SUPPORT_AES".to_string()))
        );
    }

    #[test]
    fn test_name_attribute_is_exact() {
        let mut doc = AntDocument::parse(
            r#"<project><property name="PIV_SUPPORT_EC_X" value="true"/><property name="PIV_SUPPORT_EC" value="true"/></project>"#,
        )
        .unwrap();
        doc.set("PIV_SUPPORT_EC", false).unwrap();
        assert_eq!(doc.get("PIV_SUPPORT_EC_X"), Some(true));
        assert_eq!(doc.get("PIV_SUPPORT_EC"), Some(false));
    }

    #[test]
    fn test_rejects_non_ant_documents() {
        assert!(AntDocument::parse("<settings/>").is_err());
        assert!(AntDocument::parse("<!-- <project> -->").is_err());
        assert!(AntDocument::parse("").is_err());
    }
}
