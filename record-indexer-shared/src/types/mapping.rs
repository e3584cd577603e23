//! Field mapping configuration.
//!
//! An indexing configuration maps document fields to source expressions over
//! a record. The types here are pure configuration; resolving them against the
//! record store happens in the indexer.

use serde::{Deserialize, Serialize};

use super::predicate::Predicate;
use super::record::RecordId;
use super::value::Scalar;

/// Declared type of a document field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    StringMulti,
    Integer,
    IntegerMulti,
    Boolean,
}

impl FieldType {
    /// Infer the type from the dynamic field suffix convention
    /// (`title_stringS`, `tags_stringM`, `count_intS`, `ids_intM`, `flag_boolS`).
    pub fn infer(field_name: &str) -> Self {
        if field_name.ends_with("_intM") {
            FieldType::IntegerMulti
        } else if field_name.ends_with("_intS") {
            FieldType::Integer
        } else if field_name.ends_with("_boolS") {
            FieldType::Boolean
        } else if field_name.ends_with("M") && field_name.contains('_') {
            FieldType::StringMulti
        } else {
            FieldType::String
        }
    }

    pub fn is_multi_valued(self) -> bool {
        matches!(self, FieldType::StringMulti | FieldType::IntegerMulti)
    }
}

/// One document field and the rule producing its values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Target document field.
    pub name: String,
    /// Declared type; inferred from `name` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(flatten)]
    pub rule: FieldRule,
}

impl FieldMapping {
    pub fn new(name: impl Into<String>, rule: FieldRule) -> Self {
        Self {
            name: name.into(),
            field_type: None,
            rule,
        }
    }

    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    /// Declared or inferred type.
    pub fn effective_type(&self) -> FieldType {
        self.field_type
            .unwrap_or_else(|| FieldType::infer(&self.name))
    }
}

/// Source expression of a document field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldRule {
    /// Copy a record field.
    Field { source: String },
    /// A constant, independent of the record.
    Static { value: Scalar },
    /// Values reached through a relation column.
    Relation(RelationRule),
    /// Ancestor pages of the record's page.
    Rootline(RootlineRule),
    /// The record's URL on the document's site and language.
    ///
    /// `parameters` is a query string template such as `tx_foo[uid]={uid}`;
    /// `{uid}` and `{language}` are substituted.
    Link { parameters: String },
}

impl FieldRule {
    pub fn field(source: impl Into<String>) -> Self {
        FieldRule::Field {
            source: source.into(),
        }
    }
}

/// A relation traversal.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RelationRule {
    /// Relation column on the source record.
    pub local_field: String,
    /// Dotted path of the field to read from each related row; defaults to
    /// the foreign table's label field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_label_field: Option<String>,
    /// Follow relation columns named in `foreign_label_field`.
    #[serde(default)]
    pub enable_recursive_value_resolution: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_where: Option<AdditionalWhere>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderBy>,
}

impl RelationRule {
    pub fn new(local_field: impl Into<String>) -> Self {
        Self {
            local_field: local_field.into(),
            ..Self::default()
        }
    }

    pub fn label(mut self, foreign_label_field: impl Into<String>) -> Self {
        self.foreign_label_field = Some(foreign_label_field.into());
        self
    }

    pub fn recursive(mut self) -> Self {
        self.enable_recursive_value_resolution = true;
        self
    }

    pub fn filtered(mut self, target: WhereTarget, predicate: Predicate) -> Self {
        self.additional_where = Some(AdditionalWhere { target, predicate });
        self
    }
}

/// Extra filter on the rows a relation reaches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditionalWhere {
    /// Which rows the predicate applies to. Only MM relations have junction
    /// rows; direct relations always filter foreign rows.
    #[serde(default)]
    pub target: WhereTarget,
    pub predicate: Predicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhereTarget {
    #[default]
    Foreign,
    Junction,
}

/// Explicit ordering of related rows by a foreign field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    #[serde(default)]
    pub descending: bool,
}

/// Ancestor page lookup.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RootlineRule {
    /// Only ancestors matching this filter contribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Predicate>,
    /// Page field to return instead of the page uid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_field: Option<String>,
}

/// A named set of field mappings for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexingConfiguration {
    pub name: String,
    pub table: String,
    #[serde(default)]
    pub fields: Vec<FieldMapping>,
    /// Registry keys of document modifiers, applied in order.
    #[serde(default)]
    pub document_modifiers: Vec<String>,
    /// Registry keys of additional document providers, applied in order.
    #[serde(default)]
    pub additional_document_providers: Vec<String>,
}

impl IndexingConfiguration {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            fields: Vec::new(),
            document_modifiers: Vec::new(),
            additional_document_providers: Vec::new(),
        }
    }

    pub fn with_field(mut self, mapping: FieldMapping) -> Self {
        self.fields.push(mapping);
        self
    }
}

/// Field mappings attached to a page; records below that page inherit them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageFieldOverride {
    pub page_uid: RecordId,
    /// Indexing configuration the mappings extend.
    pub configuration: String,
    pub fields: Vec<FieldMapping>,
}
