use super::RecordId;
use crate::validation::{digits, max_len, required, Validate, ValidationError};
use resource_list::{ListEntity, RecordMeta};
use serde::{Deserialize, Serialize};

/// Length of the national team identifier (INE).
pub const INE_DIGITS: usize = 10;

/// A family-health team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipe {
    pub id: RecordId,
    pub nome: String,
    pub codigo_ine: String,
    #[serde(default)]
    pub area_id: Option<RecordId>,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquipeForm {
    pub nome: String,
    pub codigo_ine: String,
    pub area_id: Option<RecordId>,
}

impl Validate for EquipeForm {
    fn validate(&self) -> Result<(), ValidationError> {
        required("nome", &self.nome)?;
        max_len("nome", &self.nome, 120)?;
        digits("codigo_ine", &self.codigo_ine, INE_DIGITS)
    }
}

impl ListEntity for Equipe {
    type Id = RecordId;
    type Create = EquipeForm;
    type Update = EquipeForm;

    const ENDPOINT: &'static str = "equipes";
    const SEARCHABLE_FIELDS: &'static [&'static str] = &["nome", "codigo_ine"];
    const ORDER_BY: &'static str = "nome";

    fn id(&self) -> &RecordId {
        &self.id
    }
}
