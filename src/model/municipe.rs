use super::RecordId;
use crate::validation::{digits, max_len, optional_max_len, required, Validate, ValidationError};
use chrono::NaiveDate;
use resource_list::{ListEntity, RecordMeta};
use serde::{Deserialize, Serialize};

pub const CPF_DIGITS: usize = 11;
/// Cartão Nacional de Saúde.
pub const CNS_DIGITS: usize = 15;

/// A citizen registered in the municipal health system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Municipe {
    pub id: RecordId,
    pub nome: String,
    pub cpf: String,
    pub cartao_sus: String,
    #[serde(default)]
    pub data_nascimento: Option<NaiveDate>,
    #[serde(default)]
    pub telefone: Option<String>,
    #[serde(default)]
    pub area_id: Option<RecordId>,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MunicipeForm {
    pub nome: String,
    pub cpf: String,
    pub cartao_sus: String,
    pub data_nascimento: Option<NaiveDate>,
    pub telefone: Option<String>,
    pub area_id: Option<RecordId>,
}

impl Validate for MunicipeForm {
    fn validate(&self) -> Result<(), ValidationError> {
        required("nome", &self.nome)?;
        max_len("nome", &self.nome, 160)?;
        digits("cpf", &self.cpf, CPF_DIGITS)?;
        digits("cartao_sus", &self.cartao_sus, CNS_DIGITS)?;
        optional_max_len("telefone", self.telefone.as_deref(), 20)
    }
}

impl ListEntity for Municipe {
    type Id = RecordId;
    type Create = MunicipeForm;
    type Update = MunicipeForm;

    const ENDPOINT: &'static str = "municipes";
    const SEARCHABLE_FIELDS: &'static [&'static str] = &["nome", "cpf", "cartao_sus"];
    const ORDER_BY: &'static str = "nome";

    fn id(&self) -> &RecordId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> MunicipeForm {
        MunicipeForm {
            nome: "Maria da Silva".into(),
            cpf: "123.456.789-09".into(),
            cartao_sus: "898 0010 1234 5678".into(),
            ..MunicipeForm::default()
        }
    }

    #[test]
    fn formatted_documents_are_accepted() {
        assert_eq!(form().validate(), Ok(()));
    }

    #[test]
    fn short_cns_is_rejected() {
        let form = MunicipeForm {
            cartao_sus: "898001".into(),
            ..form()
        };
        assert_eq!(
            form.validate(),
            Err(ValidationError::Digits {
                field: "cartao_sus",
                expected: 15,
                found: 6
            })
        );
    }
}
