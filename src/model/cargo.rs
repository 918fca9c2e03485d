use super::RecordId;
use crate::validation::{max_len, optional_max_len, required, Validate, ValidationError};
use resource_list::{ListEntity, RecordMeta};
use serde::{Deserialize, Serialize};

/// A job role a health professional can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cargo {
    pub id: RecordId,
    pub nome: String,
    #[serde(default)]
    pub descricao: Option<String>,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

/// Form payload for creating or editing a [`Cargo`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CargoForm {
    pub nome: String,
    pub descricao: Option<String>,
}

impl CargoForm {
    pub fn new(nome: impl Into<String>) -> Self {
        Self {
            nome: nome.into(),
            descricao: None,
        }
    }

    pub fn with_descricao(mut self, descricao: impl Into<String>) -> Self {
        self.descricao = Some(descricao.into());
        self
    }
}

impl Validate for CargoForm {
    fn validate(&self) -> Result<(), ValidationError> {
        required("nome", &self.nome)?;
        max_len("nome", &self.nome, 120)?;
        optional_max_len("descricao", self.descricao.as_deref(), 500)
    }
}

impl ListEntity for Cargo {
    type Id = RecordId;
    type Create = CargoForm;
    type Update = CargoForm;

    const ENDPOINT: &'static str = "cargos";
    const SEARCHABLE_FIELDS: &'static [&'static str] = &["nome", "descricao"];
    const ORDER_BY: &'static str = "nome";

    fn id(&self) -> &RecordId {
        &self.id
    }
}
