//! # Query Builder
//!
//! Turns a [`ResourceQuery`] (page, page size, search text, ordering) into the two
//! request descriptions a list fetch needs: a windowed [`DataRequest`] and a
//! count-only [`CountRequest`]. Write requests for the mutation coordinator are
//! described here as well, so every wire shape lives in one module.
//!
//! The descriptions are plain data. Transports render them with
//! [`DataRequest::query_pairs`] and friends (PostgREST query syntax) or evaluate
//! the [`Predicate`]s directly, as the in-memory transport does.
//!
//! Every data and count request carries the not-deleted predicate. There is no
//! way to build a list request without it.

use crate::entity::ResourceConfig;
use crate::error::QueryError;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::fmt;

/// Ordering direction for sorted queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderDirection::Asc => "asc",
            OrderDirection::Desc => "desc",
        }
    }
}

/// A column and a direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderClause {
    pub field: String,
    pub direction: OrderDirection,
}

impl OrderClause {
    pub fn new(field: impl Into<String>, direction: OrderDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

impl fmt::Display for OrderClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.field, self.direction.as_str())
    }
}

/// What the user asked to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceQuery {
    pub page: u32,
    pub page_size: u32,
    pub search_text: String,
    /// Overrides the entity's default ordering when set.
    pub order: Option<OrderClause>,
}

impl ResourceQuery {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size,
            search_text: String::new(),
            order: None,
        }
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    pub fn with_order(mut self, order: OrderClause) -> Self {
        self.order = Some(order);
        self
    }

    /// Row offset of the first row on `page`.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }
}

/// A row filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `field IS NULL`
    IsNull { field: String },
    /// `field = value`
    Eq { field: String, value: String },
    /// Case-insensitive substring match. `needle` is literal text.
    ILike { field: String, needle: String },
    /// Any of the nested predicates holds.
    AnyOf(Vec<Predicate>),
}

impl Predicate {
    pub fn not_deleted(field: impl Into<String>) -> Self {
        Predicate::IsNull {
            field: field.into(),
        }
    }

    /// Renders the predicate as one top-level query parameter.
    pub fn to_param(&self) -> (String, String) {
        match self {
            Predicate::IsNull { field } => (field.clone(), "is.null".to_string()),
            Predicate::Eq { field, value } => (field.clone(), format!("eq.{value}")),
            Predicate::ILike { field, needle } => (field.clone(), format!("ilike.{}", like_pattern(needle))),
            Predicate::AnyOf(items) => ("or".to_string(), format!("({})", join_tree(items))),
        }
    }

    fn to_tree_item(&self) -> String {
        match self {
            Predicate::IsNull { field } => format!("{field}.is.null"),
            Predicate::Eq { field, value } => format!("{field}.eq.{}", quote_tree_value(value)),
            Predicate::ILike { field, needle } => {
                format!("{field}.ilike.{}", quote_tree_value(&like_pattern(needle)))
            }
            Predicate::AnyOf(items) => format!("or({})", join_tree(items)),
        }
    }
}

/// `*needle*` with the LIKE wildcards `%` and `_` escaped.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('*');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('*');
    pattern
}

fn join_tree(items: &[Predicate]) -> String {
    items
        .iter()
        .map(Predicate::to_tree_item)
        .collect::<Vec<_>>()
        .join(",")
}

/// Values inside an `or=(...)` tree must be double-quoted when they contain
/// characters the backend reserves for the tree syntax.
fn quote_tree_value(value: &str) -> String {
    if value.contains([',', '.', ':', '(', ')', '"', '\\']) {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

/// Windowed row request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRequest {
    pub endpoint: String,
    pub select: String,
    pub filters: Vec<Predicate>,
    pub order: OrderClause,
    pub limit: u32,
    pub offset: u64,
}

impl DataRequest {
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.select.clone())];
        pairs.extend(self.filters.iter().map(Predicate::to_param));
        pairs.push(("order".to_string(), self.order.to_string()));
        pairs.push(("limit".to_string(), self.limit.to_string()));
        pairs.push(("offset".to_string(), self.offset.to_string()));
        pairs
    }
}

/// Count-only request over the same filters as its [`DataRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountRequest {
    pub endpoint: String,
    pub count_column: String,
    pub filters: Vec<Predicate>,
}

impl CountRequest {
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.count_column.clone())];
        pairs.extend(self.filters.iter().map(Predicate::to_param));
        pairs
    }
}

/// The pair of requests behind one list fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub data: DataRequest,
    pub count: CountRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMethod {
    Insert,
    Patch,
}

/// A single create/update/soft-delete call.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRequest {
    pub endpoint: String,
    pub method: WriteMethod,
    pub filters: Vec<Predicate>,
    pub body: Value,
}

impl WriteRequest {
    pub fn insert(config: &ResourceConfig, body: Value) -> Self {
        Self {
            endpoint: config.endpoint().to_string(),
            method: WriteMethod::Insert,
            filters: Vec::new(),
            body,
        }
    }

    /// Patches a row that is not deleted. A row deleted meanwhile matches nothing.
    pub fn update(config: &ResourceConfig, id: &str, body: Value) -> Self {
        Self {
            endpoint: config.endpoint().to_string(),
            method: WriteMethod::Patch,
            filters: vec![
                Predicate::Eq {
                    field: config.id_column().to_string(),
                    value: id.to_string(),
                },
                Predicate::not_deleted(config.soft_delete_column()),
            ],
            body,
        }
    }

    /// Logical delete: stamps the soft-delete column on a row that is not deleted yet.
    ///
    /// Repeating it against an already-deleted row matches nothing.
    pub fn soft_delete(config: &ResourceConfig, id: &str, at: DateTime<Utc>) -> Self {
        let mut body = Map::new();
        body.insert(
            config.soft_delete_column().to_string(),
            Value::String(at.to_rfc3339()),
        );
        Self {
            endpoint: config.endpoint().to_string(),
            method: WriteMethod::Patch,
            filters: vec![
                Predicate::Eq {
                    field: config.id_column().to_string(),
                    value: id.to_string(),
                },
                Predicate::not_deleted(config.soft_delete_column()),
            ],
            body: Value::Object(body),
        }
    }

    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.filters.iter().map(Predicate::to_param).collect()
    }
}

/// Builds list requests for one resource.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    config: ResourceConfig,
}

impl QueryBuilder {
    pub fn new(config: ResourceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    /// Builds the data and count requests for `query`.
    pub fn build(&self, query: &ResourceQuery) -> Result<QueryPlan, QueryError> {
        if query.page == 0 {
            return Err(QueryError::InvalidPage(query.page));
        }
        if query.page_size == 0 {
            return Err(QueryError::InvalidPageSize(query.page_size));
        }

        let filters = self.filters(&query.search_text);
        let order = query.order.clone().unwrap_or_else(|| {
            let (field, direction) = self.config.default_order();
            OrderClause::new(field, direction)
        });

        let data = DataRequest {
            endpoint: self.config.endpoint().to_string(),
            select: self.config.select_columns().to_string(),
            filters: filters.clone(),
            order,
            limit: query.page_size,
            offset: query.offset(),
        };
        let count = CountRequest {
            endpoint: self.config.endpoint().to_string(),
            count_column: self.config.id_column().to_string(),
            filters,
        };
        Ok(QueryPlan { data, count })
    }

    fn filters(&self, search_text: &str) -> Vec<Predicate> {
        let mut filters = vec![Predicate::not_deleted(self.config.soft_delete_column())];
        filters.extend(self.search_predicate(search_text));
        filters
    }

    /// OR across the searchable fields, or `None` for a blank search.
    pub fn search_predicate(&self, search_text: &str) -> Option<Predicate> {
        // `*` is the backend's wildcard alias and has no escape, so it is dropped.
        let needle: String = search_text.trim().chars().filter(|c| *c != '*').collect();
        if needle.is_empty() {
            return None;
        }
        let mut matches: Vec<Predicate> = self
            .config
            .searchable_fields()
            .iter()
            .map(|field| Predicate::ILike {
                field: field.clone(),
                needle: needle.clone(),
            })
            .collect();
        match matches.len() {
            0 => {
                tracing::debug!(endpoint = self.config.endpoint(), "Search ignored: no searchable fields");
                None
            }
            1 => matches.pop(),
            _ => Some(Predicate::AnyOf(matches)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn areas() -> QueryBuilder {
        QueryBuilder::new(
            ResourceConfig::new("areas")
                .searchable(["nome", "descricao"])
                .order_by("nome", OrderDirection::Asc),
        )
    }

    fn param<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn every_request_excludes_soft_deleted_rows() {
        let builder = areas();
        for search in ["", "  ", "centro", "vila nova"] {
            for page in 1..=4 {
                let plan = builder
                    .build(&ResourceQuery::new(page, 10).with_search(search))
                    .unwrap();
                let not_deleted = Predicate::not_deleted("deleted_at");
                assert!(plan.data.filters.contains(&not_deleted));
                assert!(plan.count.filters.contains(&not_deleted));
                assert_eq!(param(&plan.data.query_pairs(), "deleted_at"), Some("is.null"));
                assert_eq!(param(&plan.count.query_pairs(), "deleted_at"), Some("is.null"));
            }
        }
    }

    #[test]
    fn blank_search_lists_everything() {
        let plan = areas()
            .build(&ResourceQuery::new(1, 10).with_search("   "))
            .unwrap();
        assert_eq!(plan.data.filters, vec![Predicate::not_deleted("deleted_at")]);
        assert_eq!(plan.count.filters, plan.data.filters);
    }

    #[test]
    fn search_spans_all_configured_fields() {
        let plan = areas()
            .build(&ResourceQuery::new(1, 10).with_search("  Centro "))
            .unwrap();
        let pairs = plan.data.query_pairs();
        assert_eq!(
            param(&pairs, "or"),
            Some("(nome.ilike.*Centro*,descricao.ilike.*Centro*)")
        );
        assert_eq!(plan.count.filters, plan.data.filters);
    }

    #[test]
    fn single_search_field_is_a_plain_column_filter() {
        let builder = QueryBuilder::new(
            ResourceConfig::new("tipos_veiculo")
                .searchable(["nome"])
                .order_by("nome", OrderDirection::Asc),
        );
        let plan = builder
            .build(&ResourceQuery::new(1, 10).with_search("ambul"))
            .unwrap();
        let pairs = plan.data.query_pairs();
        assert_eq!(param(&pairs, "nome"), Some("ilike.*ambul*"));
        assert_eq!(param(&pairs, "or"), None);
    }

    #[test]
    fn reserved_characters_are_quoted_inside_or_tree() {
        let plan = areas()
            .build(&ResourceQuery::new(1, 10).with_search("a,b (c)"))
            .unwrap();
        assert_eq!(
            param(&plan.data.query_pairs(), "or"),
            Some(r#"(nome.ilike."*a,b (c)*",descricao.ilike."*a,b (c)*")"#)
        );
    }

    #[test]
    fn like_wildcards_in_search_are_literal() {
        let builder = QueryBuilder::new(ResourceConfig::new("cargos").searchable(["nome"]));
        let plan = builder
            .build(&ResourceQuery::new(1, 10).with_search("100%_a"))
            .unwrap();
        assert_eq!(param(&plan.data.query_pairs(), "nome"), Some(r"ilike.*100\%\_a*"));

        let plan = builder
            .build(&ResourceQuery::new(1, 10).with_search("a*b"))
            .unwrap();
        assert_eq!(param(&plan.data.query_pairs(), "nome"), Some("ilike.*ab*"));

        assert!(builder.search_predicate(" ** ").is_none());
    }

    #[test]
    fn escaped_pattern_is_quoted_inside_or_tree() {
        let plan = areas()
            .build(&ResourceQuery::new(1, 10).with_search("a_b"))
            .unwrap();
        assert_eq!(
            param(&plan.data.query_pairs(), "or"),
            Some(r#"(nome.ilike."*a\\_b*",descricao.ilike."*a\\_b*")"#)
        );
    }

    #[test]
    fn update_only_touches_live_rows() {
        let request = WriteRequest::update(
            &ResourceConfig::new("cargos"),
            "7",
            serde_json::json!({ "nome": "Enfermeiro" }),
        );
        assert_eq!(request.method, WriteMethod::Patch);
        assert_eq!(
            request.query_pairs(),
            vec![
                ("id".to_string(), "eq.7".to_string()),
                ("deleted_at".to_string(), "is.null".to_string()),
            ]
        );
    }

    #[test]
    fn offset_and_limit_follow_page() {
        let plan = areas().build(&ResourceQuery::new(3, 10)).unwrap();
        assert_eq!(plan.data.limit, 10);
        assert_eq!(plan.data.offset, 20);
        let pairs = plan.data.query_pairs();
        assert_eq!(param(&pairs, "limit"), Some("10"));
        assert_eq!(param(&pairs, "offset"), Some("20"));
        assert_eq!(param(&pairs, "select"), Some("*"));
    }

    #[test]
    fn order_defaults_to_configured_field_and_can_be_overridden() {
        let builder = areas();
        let plan = builder.build(&ResourceQuery::new(1, 5)).unwrap();
        assert_eq!(param(&plan.data.query_pairs(), "order"), Some("nome.asc"));

        let plan = builder
            .build(
                &ResourceQuery::new(1, 5)
                    .with_order(OrderClause::new("created_at", OrderDirection::Desc)),
            )
            .unwrap();
        assert_eq!(param(&plan.data.query_pairs(), "order"), Some("created_at.desc"));
    }

    #[test]
    fn rejects_page_and_page_size_zero() {
        let builder = areas();
        assert_eq!(
            builder.build(&ResourceQuery::new(0, 10)),
            Err(QueryError::InvalidPage(0))
        );
        assert_eq!(
            builder.build(&ResourceQuery::new(1, 0)),
            Err(QueryError::InvalidPageSize(0))
        );
    }

    #[test]
    fn build_is_deterministic() {
        let builder = areas();
        let query = ResourceQuery::new(2, 7).with_search("sul");
        assert_eq!(builder.build(&query), builder.build(&query));
    }

    #[test]
    fn soft_delete_only_touches_live_rows() {
        let config = ResourceConfig::new("cargos");
        let at = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let request = WriteRequest::soft_delete(&config, "7", at);

        assert_eq!(request.method, WriteMethod::Patch);
        assert_eq!(
            request.query_pairs(),
            vec![
                ("id".to_string(), "eq.7".to_string()),
                ("deleted_at".to_string(), "is.null".to_string()),
            ]
        );
        assert_eq!(request.body["deleted_at"], "2024-05-01T12:00:00+00:00");
    }
}
