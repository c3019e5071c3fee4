//! TOML configuration documents.
//!
//! Symbols are keys; a dotted symbol such as `features.PIV_SUPPORT_RSA`
//! addresses a key inside a table. Edits go through `toml_edit`, so
//! comments, ordering, and formatting of everything else are preserved.

use toml_edit::{DocumentMut, Item, Value};

use super::SymbolError;

#[derive(Debug, Clone)]
pub struct TomlDocument {
    doc: DocumentMut,
}

impl TomlDocument {
    pub fn parse(text: &str) -> Result<Self, String> {
        let doc: DocumentMut = text.parse().map_err(|e: toml_edit::TomlError| e.to_string())?;
        Ok(TomlDocument { doc })
    }

    pub fn get(&self, symbol: &str) -> Option<bool> {
        let mut item = self.doc.as_item();
        for key in symbol.split('.') {
            item = item.get(key)?;
        }
        item.as_bool()
    }

    pub fn set(&mut self, symbol: &str, enabled: bool) -> Result<(), SymbolError> {
        let mut item: &mut Item = self.doc.as_item_mut();
        for key in symbol.split('.') {
            item = item
                .as_table_like_mut()
                .and_then(|table| table.get_mut(key))
                .ok_or_else(|| SymbolError::NotDeclared(symbol.to_string()))?;
        }

        let value = item
            .as_value_mut()
            .ok_or_else(|| SymbolError::NoValue(symbol.to_string()))?;
        let decor = value.decor().clone();
        *value = Value::from(enabled);
        *value.decor_mut() = decor;
        Ok(())
    }

    pub fn render(&self) -> String {
        self.doc.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLAGS_TOML: &str = r#"# applet feature switches
PIV_SUPPORT_RSA = true   # 2048-bit keys

[features]
PIV_SUPPORT_EC = false
label = "piv"
"#;

    #[test]
    fn test_get_top_level_and_dotted() {
        let doc = TomlDocument::parse(FLAGS_TOML).unwrap();
        assert_eq!(doc.get("PIV_SUPPORT_RSA"), Some(true));
        assert_eq!(doc.get("features.PIV_SUPPORT_EC"), Some(false));
        assert_eq!(doc.get("features.label"), None);
        assert_eq!(doc.get("features.MISSING"), None);
    }

    #[test]
    fn test_set_preserves_comments() {
        let mut doc = TomlDocument::parse(FLAGS_TOML).unwrap();
        doc.set("PIV_SUPPORT_RSA", false).unwrap();
        doc.set("features.PIV_SUPPORT_EC", true).unwrap();

        let rendered = doc.render();
        assert!(rendered.starts_with("# applet feature switches\n"));
        assert!(rendered.contains("PIV_SUPPORT_RSA = false   # 2048-bit keys"));
        assert!(rendered.contains("PIV_SUPPORT_EC = true"));
        assert!(rendered.contains("label = \"piv\""));
    }

    #[test]
    fn test_set_errors() {
        let mut doc = TomlDocument::parse(FLAGS_TOML).unwrap();
        assert_eq!(
            doc.set("PIV_SUPPORT_AES", true),
            Err(SymbolError::NotDeclared("PIV_SUPPORT_AES".to_string()))
        );
        assert_eq!(
            doc.set("features", true),
            Err(SymbolError::NoValue("features".to_string()))
        );
    }

    #[test]
    fn test_undeclared_symbol_leaves_document_untouched() {
        let mut doc = TomlDocument::parse(FLAGS_TOML).unwrap();
        assert_eq!(
            doc.set("features.PIV_SUPPORT_AES", true),
            Err(SymbolError::NotDeclared("features.PIV_SUPPORT_AES".to_string()))
        );
        assert_eq!(
            doc.set("PIV_SUPPORT_RSA.nested", true),
            Err(SymbolError::NotDeclared("PIV_SUPPORT_RSA.nested".to_string()))
        );
        assert_eq!(doc.render(), FLAGS_TOML);
    }
}
