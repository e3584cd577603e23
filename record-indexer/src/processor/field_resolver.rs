//! Field resolver.
//!
//! Evaluates one field mapping against a localized record and shapes the
//! resulting values into a document value of the field's type.

use std::cmp::Ordering;

use record_indexer_shared::{
    DocumentValue, FieldMapping, FieldRule, FieldType, OrderBy, Record, RelationRule,
    RootlineRule, Scalar, Schema,
};
use tracing::warn;
use url::Url;

use super::relation_resolver::{RelationResolver, MAX_RELATION_DEPTH};
use crate::context::DocumentContext;
use crate::errors::ResolveError;

/// Separator used when several values end up in a single-valued text field.
pub const SINGLE_VALUE_SEPARATOR: &str = ", ";

pub struct FieldResolver<'a> {
    relations: &'a RelationResolver<'a>,
    schema: &'a Schema,
}

impl<'a> FieldResolver<'a> {
    pub fn new(relations: &'a RelationResolver<'a>, schema: &'a Schema) -> Self {
        Self { relations, schema }
    }

    /// Raw values of one mapping, in order.
    pub async fn resolve(
        &self,
        ctx: &DocumentContext<'_>,
        record: &Record,
        mapping: &FieldMapping,
    ) -> Result<Vec<Scalar>, ResolveError> {
        match &mapping.rule {
            FieldRule::Field { source } => Ok(record.value_of(source).scalars()),
            FieldRule::Static { value } => Ok(vec![value.clone()]),
            FieldRule::Relation(rule) => self.relation_values(record, rule).await,
            FieldRule::Rootline(rule) => self.rootline_values(ctx, record, rule).await,
            FieldRule::Link { parameters } => {
                Ok(vec![Scalar::Text(record_link(ctx, record, parameters)?)])
            }
        }
    }

    /// Follow the rule's relation and read the label path from the rows reached.
    ///
    /// Without recursion the path names one field of the related rows. With
    /// recursion every segment naming a relation column is followed, up to
    /// `MAX_RELATION_DEPTH` relations in total; a path ending on a relation
    /// yields the label of the rows it reaches.
    async fn relation_values(
        &self,
        record: &Record,
        rule: &RelationRule,
    ) -> Result<Vec<Scalar>, ResolveError> {
        let path = rule.foreign_label_field.as_deref().unwrap_or("");
        let segments: Vec<&str> = if path.is_empty() {
            Vec::new()
        } else {
            path.split('.').map(str::trim).collect()
        };
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ResolveError::invalid_rule(format!(
                "empty segment in label path '{}'",
                path
            )));
        }
        if segments.len() > 1 && !rule.enable_recursive_value_resolution {
            return Err(ResolveError::DottedPathWithoutRecursion(path.to_string()));
        }

        let relation = self.relations.relation(&record.table, &rule.local_field)?;
        let mut table = relation.foreign_table.as_str();
        let mut rows = self
            .relations
            .related(record, &rule.local_field, rule.additional_where.as_ref())
            .await?;
        if let Some(order) = &rule.order_by {
            sort_rows(&mut rows, order);
        }

        if segments.is_empty() {
            return Ok(self.labels(&rows, table));
        }
        if !rule.enable_recursive_value_resolution {
            return Ok(field_values(&rows, segments[0]));
        }

        let mut depth = 1;
        for (index, segment) in segments.iter().enumerate() {
            let is_last = index + 1 == segments.len();
            if self.schema.relation(table, segment).is_none() {
                if is_last {
                    return Ok(field_values(&rows, segment));
                }
                return Err(ResolveError::invalid_rule(format!(
                    "'{}' of table '{}' in label path '{}' is not a relation",
                    segment, table, path
                )));
            }

            depth += 1;
            if depth > MAX_RELATION_DEPTH {
                return Err(ResolveError::DepthExceeded {
                    path: path.to_string(),
                    max: MAX_RELATION_DEPTH,
                });
            }

            let next_table = self.relations.relation(table, segment)?.foreign_table.as_str();
            let mut next = Vec::new();
            for row in &rows {
                next.extend(self.relations.related(row, segment, None).await?);
            }
            rows = next;
            table = next_table;
        }

        Ok(self.labels(&rows, table))
    }

    async fn rootline_values(
        &self,
        ctx: &DocumentContext<'_>,
        record: &Record,
        rule: &RootlineRule,
    ) -> Result<Vec<Scalar>, ResolveError> {
        let pages = self.relations.rootline(record, ctx.site.root_page_id).await?;

        Ok(pages
            .iter()
            .filter(|page| rule.filter.as_ref().map_or(true, |f| f.matches(page)))
            .flat_map(|page| match &rule.value_field {
                Some(field) => page.value_of(field).scalars(),
                None => vec![Scalar::from(page.uid)],
            })
            .collect())
    }

    fn labels(&self, rows: &[Record], table: &str) -> Vec<Scalar> {
        let label = self
            .schema
            .table(table)
            .map(|t| t.label_field.as_str())
            .unwrap_or("title");
        field_values(rows, label)
    }
}

fn field_values(rows: &[Record], field: &str) -> Vec<Scalar> {
    rows.iter().flat_map(|row| row.value_of(field).scalars()).collect()
}

/// Stable re-sort of related rows by one field. Rows without the field sort first.
fn sort_rows(rows: &mut [Record], order: &OrderBy) {
    rows.sort_by(|a, b| {
        let ordering = match (
            a.value_of(&order.field).as_scalar(),
            b.value_of(&order.field).as_scalar(),
        ) {
            (Some(x), Some(y)) => x.compare(y),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if order.descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

/// URL of `record` on the document's site and language.
///
/// The language base is resolved against the site base; `{uid}` and
/// `{language}` in `parameters` are substituted before the query string is
/// encoded.
pub fn record_link(
    ctx: &DocumentContext<'_>,
    record: &Record,
    parameters: &str,
) -> Result<String, ResolveError> {
    let site_base = Url::parse(&ctx.site.base).map_err(|e| {
        ResolveError::invalid_rule(format!("invalid site base '{}': {}", ctx.site.base, e))
    })?;
    let language_base = ctx.language().map(|l| l.base.as_str()).unwrap_or("/");
    let mut url = site_base.join(language_base).map_err(|e| {
        ResolveError::invalid_rule(format!("invalid language base '{}': {}", language_base, e))
    })?;

    let query = parameters
        .replace("{uid}", &record.uid.to_string())
        .replace("{language}", &ctx.language_id.to_string());
    let pairs: Vec<(&str, &str)> = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .collect();

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
    Ok(url.to_string())
}

/// Shape raw values into a document value of `field_type`.
///
/// Returns `None` when nothing usable remains, in which case the field is
/// left out of the document.
pub fn shape(field: &str, values: Vec<Scalar>, field_type: FieldType) -> Option<DocumentValue> {
    let values: Vec<Scalar> = values.into_iter().filter(|v| !v.is_empty()).collect();

    match field_type {
        FieldType::StringMulti => {
            let texts: Vec<Scalar> = values.iter().map(|v| Scalar::Text(v.to_string())).collect();
            (!texts.is_empty()).then_some(DocumentValue::Multi(texts))
        }
        FieldType::String => {
            let text = values
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(SINGLE_VALUE_SEPARATOR);
            (!text.is_empty()).then_some(DocumentValue::Single(Scalar::Text(text)))
        }
        FieldType::IntegerMulti => {
            let ints: Vec<Scalar> = coerce(field, &values, Scalar::as_i64)
                .into_iter()
                .map(Scalar::Int)
                .collect();
            (!ints.is_empty()).then_some(DocumentValue::Multi(ints))
        }
        FieldType::Integer => coerce(field, &values, Scalar::as_i64)
            .into_iter()
            .next()
            .map(|i| DocumentValue::Single(Scalar::Int(i))),
        FieldType::Boolean => coerce(field, &values, Scalar::as_bool)
            .into_iter()
            .next()
            .map(|b| DocumentValue::Single(Scalar::Bool(b))),
    }
}

fn coerce<T>(field: &str, values: &[Scalar], convert: impl Fn(&Scalar) -> Option<T>) -> Vec<T> {
    values
        .iter()
        .filter_map(|value| {
            let converted = convert(value);
            if converted.is_none() {
                warn!(field = %field, value = %value, "Dropping value that does not fit the field type");
            }
            converted
        })
        .collect()
}
