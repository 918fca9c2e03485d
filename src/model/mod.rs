//! # Domain Model
//!
//! The six resources managed by the admin screens. Each one implements
//! [`ListEntity`](resource_list::ListEntity), which tells the generic list
//! controller its endpoint, the columns the search box matches and the column
//! rows are ordered by.
//!
//! | Entity | Endpoint | Searchable fields |
//! |---|---|---|
//! | [`Cargo`] | `cargos` | `nome`, `descricao` |
//! | [`DoencaCronica`] | `doencas_cronicas` | `nome`, `descricao` |
//! | [`TipoVeiculo`] | `tipos_veiculo` | `nome` |
//! | [`Equipe`] | `equipes` | `nome`, `codigo_ine` |
//! | [`Area`] | `areas` | `nome`, `descricao` |
//! | [`Municipe`] | `municipes` | `nome`, `cpf`, `cartao_sus` |
//!
//! All of them are ordered by `nome` and soft-deleted through `deleted_at`.

pub mod area;
pub mod cargo;
pub mod doenca;
pub mod equipe;
pub mod municipe;
pub mod veiculo;

pub use area::{Area, AreaForm};
pub use cargo::{Cargo, CargoForm};
pub use doenca::{DoencaCronica, DoencaCronicaForm};
pub use equipe::{Equipe, EquipeForm};
pub use municipe::{Municipe, MunicipeForm};
pub use veiculo::{TipoVeiculo, TipoVeiculoForm};

/// Primary key of every table.
pub type RecordId = i64;
