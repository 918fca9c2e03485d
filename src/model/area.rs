use super::RecordId;
use crate::validation::{max_len, optional_max_len, required, Validate, ValidationError};
use resource_list::{ListEntity, RecordMeta};
use serde::{Deserialize, Serialize};

/// A coverage area served by one or more teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: RecordId,
    pub nome: String,
    #[serde(default)]
    pub descricao: Option<String>,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaForm {
    pub nome: String,
    pub descricao: Option<String>,
}

impl Validate for AreaForm {
    fn validate(&self) -> Result<(), ValidationError> {
        required("nome", &self.nome)?;
        max_len("nome", &self.nome, 120)?;
        optional_max_len("descricao", self.descricao.as_deref(), 500)
    }
}

impl ListEntity for Area {
    type Id = RecordId;
    type Create = AreaForm;
    type Update = AreaForm;

    const ENDPOINT: &'static str = "areas";
    const SEARCHABLE_FIELDS: &'static [&'static str] = &["nome", "descricao"];
    const ORDER_BY: &'static str = "nome";

    fn id(&self) -> &RecordId {
        &self.id
    }
}
