//! # List Entities
//!
//! Every screen in the admin front-end lists one backend table. Instead of
//! re-implementing paging, search and soft deletion per screen, each row type
//! implements [`ListEntity`] once and the generic controller does the rest.
//!
//! The trait carries the per-table configuration (endpoint, searchable columns,
//! ordering, soft-delete column) as associated constants. [`ResourceConfig`] is the
//! runtime form of that configuration consumed by the [`QueryBuilder`](crate::query::QueryBuilder).

use crate::query::OrderDirection;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};

/// Trait that any row type must implement to be listed by a
/// [`ResourceListController`](crate::controller::ResourceListController).
///
/// # Architecture Note
/// The associated types keep mutations type-safe: a `Cargo` screen only accepts a
/// `CargoCreate` payload, and the compiler rejects anything else.
///
/// # Example
///
/// ```rust
/// use resource_list::{ListEntity, RecordMeta};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Debug, Deserialize)]
/// struct Cargo {
///     id: i64,
///     nome: String,
///     #[serde(flatten)]
///     meta: RecordMeta,
/// }
///
/// #[derive(Debug, Serialize)]
/// struct CargoForm {
///     nome: String,
/// }
///
/// impl ListEntity for Cargo {
///     type Id = i64;
///     type Create = CargoForm;
///     type Update = CargoForm;
///
///     const ENDPOINT: &'static str = "cargos";
///     const SEARCHABLE_FIELDS: &'static [&'static str] = &["nome"];
///     const ORDER_BY: &'static str = "nome";
///
///     fn id(&self) -> &i64 {
///         &self.id
///     }
/// }
///
/// let config = Cargo::resource();
/// assert_eq!(config.endpoint(), "cargos");
/// assert_eq!(config.soft_delete_column(), "deleted_at");
/// ```
pub trait ListEntity: Clone + Debug + DeserializeOwned + Send + Sync + 'static {
    /// Primary key type. Rendered with `Display` into `id=eq.<id>` filters.
    type Id: Clone + Debug + Display + Send + Sync + 'static;

    /// Form payload for creating a row.
    type Create: Serialize + Debug + Send + Sync;

    /// Form payload for updating a row.
    type Update: Serialize + Debug + Send + Sync;

    /// Table (REST endpoint) name.
    const ENDPOINT: &'static str;

    /// Columns matched by the search box. Empty disables searching.
    const SEARCHABLE_FIELDS: &'static [&'static str];

    /// Human-meaningful column used for the default ascending order.
    const ORDER_BY: &'static str;

    /// Primary key column.
    const ID_FIELD: &'static str = "id";

    /// Soft-delete timestamp column.
    const SOFT_DELETE_FIELD: &'static str = "deleted_at";

    /// Column list requested for each row.
    const SELECT: &'static str = "*";

    fn id(&self) -> &Self::Id;

    /// Runtime configuration derived from the associated constants.
    fn resource() -> ResourceConfig {
        ResourceConfig::new(Self::ENDPOINT)
            .searchable(Self::SEARCHABLE_FIELDS.iter().copied())
            .order_by(Self::ORDER_BY, OrderDirection::Asc)
            .id_field(Self::ID_FIELD)
            .soft_delete_field(Self::SOFT_DELETE_FIELD)
            .select(Self::SELECT)
    }
}

/// Per-table configuration for the query builder and the mutation coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceConfig {
    endpoint: String,
    searchable_fields: Vec<String>,
    order_by: String,
    order_direction: OrderDirection,
    id_field: String,
    soft_delete_field: String,
    select: String,
}

impl ResourceConfig {
    /// Creates a configuration for `endpoint` with no searchable fields, ordered by `id`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            searchable_fields: Vec::new(),
            order_by: "id".to_string(),
            order_direction: OrderDirection::Asc,
            id_field: "id".to_string(),
            soft_delete_field: "deleted_at".to_string(),
            select: "*".to_string(),
        }
    }

    pub fn searchable<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.searchable_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: OrderDirection) -> Self {
        self.order_by = field.into();
        self.order_direction = direction;
        self
    }

    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    pub fn soft_delete_field(mut self, field: impl Into<String>) -> Self {
        self.soft_delete_field = field.into();
        self
    }

    pub fn select(mut self, select: impl Into<String>) -> Self {
        self.select = select.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn searchable_fields(&self) -> &[String] {
        &self.searchable_fields
    }

    pub fn default_order(&self) -> (&str, OrderDirection) {
        (&self.order_by, self.order_direction)
    }

    pub fn id_column(&self) -> &str {
        &self.id_field
    }

    pub fn soft_delete_column(&self) -> &str {
        &self.soft_delete_field
    }

    pub fn select_columns(&self) -> &str {
        &self.select
    }
}

/// Audit columns shared by every soft-deletable table.
///
/// Flatten it into a row struct with `#[serde(flatten)]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl RecordMeta {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
