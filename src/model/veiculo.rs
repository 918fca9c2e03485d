use super::RecordId;
use crate::validation::{max_len, required, Validate, ValidationError};
use resource_list::{ListEntity, RecordMeta};
use serde::{Deserialize, Serialize};

/// A kind of vehicle in the municipal health fleet (ambulance, van, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TipoVeiculo {
    pub id: RecordId,
    pub nome: String,
    /// Seated passengers, driver excluded.
    #[serde(default)]
    pub capacidade: Option<u32>,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TipoVeiculoForm {
    pub nome: String,
    pub capacidade: Option<u32>,
}

impl Validate for TipoVeiculoForm {
    fn validate(&self) -> Result<(), ValidationError> {
        required("nome", &self.nome)?;
        max_len("nome", &self.nome, 80)?;
        match self.capacidade {
            Some(0) => Err(ValidationError::OutOfRange {
                field: "capacidade",
                reason: "must be at least 1",
            }),
            _ => Ok(()),
        }
    }
}

impl ListEntity for TipoVeiculo {
    type Id = RecordId;
    type Create = TipoVeiculoForm;
    type Update = TipoVeiculoForm;

    const ENDPOINT: &'static str = "tipos_veiculo";
    const SEARCHABLE_FIELDS: &'static [&'static str] = &["nome"];
    const ORDER_BY: &'static str = "nome";

    fn id(&self) -> &RecordId {
        &self.id
    }
}
