//! Table relation metadata.
//!
//! The schema tells the indexer how tables are localized and how relation
//! columns reach their foreign rows.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::value::Scalar;

/// Localization and relation metadata of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    /// Field used when a related row is rendered as a label.
    #[serde(default = "default_label_field")]
    pub label_field: String,
    /// Field holding the row's language id. Tables without one are not localizable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_field: Option<String>,
    /// Field pointing a translation row at its default-language parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_parent_field: Option<String>,
    /// Relation columns by column name.
    #[serde(default)]
    pub relations: BTreeMap<String, ColumnRelation>,
}

fn default_label_field() -> String {
    "title".to_string()
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label_field: default_label_field(),
            language_field: None,
            translation_parent_field: None,
            relations: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, label_field: impl Into<String>) -> Self {
        self.label_field = label_field.into();
        self
    }

    /// Mark the table localizable.
    pub fn localized(
        mut self,
        language_field: impl Into<String>,
        translation_parent_field: impl Into<String>,
    ) -> Self {
        self.language_field = Some(language_field.into());
        self.translation_parent_field = Some(translation_parent_field.into());
        self
    }

    pub fn with_relation(mut self, column: impl Into<String>, relation: ColumnRelation) -> Self {
        self.relations.insert(column.into(), relation);
        self
    }

    pub fn is_localizable(&self) -> bool {
        self.language_field.is_some() && self.translation_parent_field.is_some()
    }

    /// Fields a translation overlay never replaces.
    pub fn control_fields(&self) -> Vec<&str> {
        let mut fields = vec!["uid", "pid"];
        fields.extend(self.language_field.as_deref());
        fields.extend(self.translation_parent_field.as_deref());
        fields
    }
}

/// How a relation column reaches its foreign rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRelation {
    pub foreign_table: String,
    /// Junction table for many-to-many relations; absent for direct foreign keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mm: Option<MmRelation>,
}

impl ColumnRelation {
    pub fn direct(foreign_table: impl Into<String>) -> Self {
        Self {
            foreign_table: foreign_table.into(),
            mm: None,
        }
    }

    pub fn many_to_many(foreign_table: impl Into<String>, mm: MmRelation) -> Self {
        Self {
            foreign_table: foreign_table.into(),
            mm: Some(mm),
        }
    }
}

/// Junction table layout of a many-to-many relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MmRelation {
    pub table: String,
    #[serde(default = "default_local_column")]
    pub local_column: String,
    #[serde(default = "default_foreign_column")]
    pub foreign_column: String,
    #[serde(default = "default_sort_column")]
    pub sort_column: String,
    /// Extra equality conditions on junction rows, for junction tables shared
    /// by several relations.
    #[serde(default)]
    pub match_fields: BTreeMap<String, Scalar>,
}

fn default_local_column() -> String {
    "uid_local".to_string()
}

fn default_foreign_column() -> String {
    "uid_foreign".to_string()
}

fn default_sort_column() -> String {
    "sorting".to_string()
}

impl MmRelation {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            local_column: default_local_column(),
            foreign_column: default_foreign_column(),
            sort_column: default_sort_column(),
            match_fields: BTreeMap::new(),
        }
    }

    pub fn matching(mut self, field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.match_fields.insert(field.into(), value.into());
        self
    }
}

/// All known tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    tables: BTreeMap<String, TableSchema>,
}

impl Schema {
    pub fn new(tables: impl IntoIterator<Item = TableSchema>) -> Self {
        Self {
            tables: tables.into_iter().map(|t| (t.name.clone(), t)).collect(),
        }
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    /// Relation metadata of a column, if the column is a relation.
    pub fn relation(&self, table: &str, column: &str) -> Option<&ColumnRelation> {
        self.tables.get(table).and_then(|t| t.relations.get(column))
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_defaults_from_json() {
        let json = r#"[
            {"name": "tx_bar", "language_field": "sys_language_uid",
             "translation_parent_field": "l18n_parent",
             "relations": {"tags": {"foreign_table": "tx_tag", "mm": {"table": "tx_bar_tag_mm"}}}},
            {"name": "tx_tag", "label_field": "tag"}
        ]"#;
        let tables: Vec<TableSchema> = serde_json::from_str(json).unwrap();
        let schema = Schema::new(tables);

        let bar = schema.table("tx_bar").unwrap();
        assert!(bar.is_localizable());
        assert_eq!(bar.label_field, "title");
        assert_eq!(
            bar.control_fields(),
            vec!["uid", "pid", "sys_language_uid", "l18n_parent"]
        );

        let mm = schema.relation("tx_bar", "tags").unwrap().mm.as_ref().unwrap();
        assert_eq!(mm.local_column, "uid_local");
        assert_eq!(mm.sort_column, "sorting");
        assert_eq!(schema.table("tx_tag").unwrap().label_field, "tag");
        assert!(schema.relation("tx_tag", "tag").is_none());
    }
}
