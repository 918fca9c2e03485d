use super::RecordId;
use crate::validation::{max_len, optional_max_len, required, Validate, ValidationError};
use resource_list::{ListEntity, RecordMeta};
use serde::{Deserialize, Serialize};

/// A chronic disease tracked in citizens' records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoencaCronica {
    pub id: RecordId,
    pub nome: String,
    #[serde(default)]
    pub descricao: Option<String>,
    /// ICD-10 code, e.g. `E11`.
    #[serde(default)]
    pub cid: Option<String>,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoencaCronicaForm {
    pub nome: String,
    pub descricao: Option<String>,
    pub cid: Option<String>,
}

impl Validate for DoencaCronicaForm {
    fn validate(&self) -> Result<(), ValidationError> {
        required("nome", &self.nome)?;
        max_len("nome", &self.nome, 120)?;
        optional_max_len("descricao", self.descricao.as_deref(), 500)?;
        optional_max_len("cid", self.cid.as_deref(), 8)
    }
}

impl ListEntity for DoencaCronica {
    type Id = RecordId;
    type Create = DoencaCronicaForm;
    type Update = DoencaCronicaForm;

    const ENDPOINT: &'static str = "doencas_cronicas";
    const SEARCHABLE_FIELDS: &'static [&'static str] = &["nome", "descricao"];
    const ORDER_BY: &'static str = "nome";

    fn id(&self) -> &RecordId {
        &self.id
    }
}
