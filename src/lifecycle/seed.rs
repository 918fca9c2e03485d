use crate::model::{Area, Cargo, DoencaCronica, Equipe, Municipe, TipoVeiculo};
use resource_list::{InMemoryTransport, ListEntity};
use serde_json::json;
use tracing::info;

/// Fills `transport` with a small municipality for offline use.
///
/// Ids are assigned by the transport in insertion order, so `area_id` values
/// refer to the areas seeded first. Each table also gets one soft-deleted row.
pub async fn seed_sample_data(transport: &InMemoryTransport) {
    transport
        .seed(
            Area::ENDPOINT,
            [
                json!({ "nome": "Área 01 - Centro", "descricao": "Microáreas 1 a 4" }),
                json!({ "nome": "Área 02 - Vila Nova", "descricao": "Microáreas 5 a 9" }),
                json!({ "nome": "Área 03 - Zona Rural", "descricao": "Sítios e assentamentos" }),
                json!({ "nome": "Área 04 - Antiga", "deleted_at": "2024-02-01T09:00:00Z" }),
            ],
        )
        .await;

    let cargos = [
        ("Agente Comunitário de Saúde", Some("Visitas domiciliares")),
        ("Auxiliar de Saúde Bucal", None),
        ("Cirurgião-Dentista", None),
        ("Enfermeiro", Some("Coordenação da equipe")),
        ("Farmacêutico", None),
        ("Médico de Família", None),
        ("Motorista", Some("Transporte sanitário")),
        ("Nutricionista", None),
        ("Psicólogo", None),
        ("Recepcionista", None),
        ("Técnico de Enfermagem", Some("Sala de vacina")),
        ("Fisioterapeuta", None),
    ];
    transport
        .seed(
            Cargo::ENDPOINT,
            cargos
                .iter()
                .map(|(nome, descricao)| json!({ "nome": nome, "descricao": descricao }))
                .chain([json!({ "nome": "Atendente", "deleted_at": "2023-11-20T14:30:00Z" })]),
        )
        .await;

    transport
        .seed(
            DoencaCronica::ENDPOINT,
            [
                json!({ "nome": "Hipertensão arterial", "cid": "I10" }),
                json!({ "nome": "Diabetes mellitus tipo 2", "cid": "E11" }),
                json!({ "nome": "Asma", "cid": "J45" }),
                json!({ "nome": "DPOC", "descricao": "Doença pulmonar obstrutiva crônica", "cid": "J44" }),
                json!({ "nome": "Insuficiência cardíaca", "cid": "I50" }),
                json!({ "nome": "Obesidade", "cid": "E66", "deleted_at": "2024-03-05T10:00:00Z" }),
            ],
        )
        .await;

    transport
        .seed(
            TipoVeiculo::ENDPOINT,
            [
                json!({ "nome": "Ambulância", "capacidade": 2 }),
                json!({ "nome": "Carro de passeio", "capacidade": 4 }),
                json!({ "nome": "Van", "capacidade": 15 }),
                json!({ "nome": "Micro-ônibus", "capacidade": 24, "deleted_at": "2022-08-01T08:00:00Z" }),
            ],
        )
        .await;

    transport
        .seed(
            Equipe::ENDPOINT,
            [
                json!({ "nome": "ESF Centro", "codigo_ine": "0001234567", "area_id": 1 }),
                json!({ "nome": "ESF Vila Nova", "codigo_ine": "0001234568", "area_id": 2 }),
                json!({ "nome": "ESF Rural", "codigo_ine": "0001234569", "area_id": 3 }),
                json!({ "nome": "ESF Extinta", "codigo_ine": "0001234560", "deleted_at": "2024-02-01T09:00:00Z" }),
            ],
        )
        .await;

    transport
        .seed(
            Municipe::ENDPOINT,
            [
                json!({ "nome": "Maria Aparecida Souza", "cpf": "12345678909", "cartao_sus": "700000000000001", "data_nascimento": "1958-04-12", "area_id": 1 }),
                json!({ "nome": "João Batista Lima", "cpf": "98765432100", "cartao_sus": "700000000000002", "data_nascimento": "1971-09-30", "area_id": 2 }),
                json!({ "nome": "Ana Clara Ferreira", "cpf": "11122233344", "cartao_sus": "700000000000003", "telefone": "(11) 98888-0000", "area_id": 1 }),
                json!({ "nome": "Pedro Henrique Alves", "cpf": "55566677788", "cartao_sus": "700000000000004", "area_id": 3 }),
                json!({ "nome": "Maria José Santos", "cpf": "22233344455", "cartao_sus": "700000000000005", "deleted_at": "2024-01-15T16:00:00Z" }),
            ],
        )
        .await;

    info!("Sample data seeded");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_table_gets_live_and_deleted_rows() {
        let transport = InMemoryTransport::new();
        seed_sample_data(&transport).await;

        for endpoint in [
            Area::ENDPOINT,
            Cargo::ENDPOINT,
            DoencaCronica::ENDPOINT,
            TipoVeiculo::ENDPOINT,
            Equipe::ENDPOINT,
            Municipe::ENDPOINT,
        ] {
            let rows = transport.snapshot(endpoint).await;
            assert!(rows.iter().any(|r| r["deleted_at"].is_string()), "{endpoint}");
            assert!(rows.iter().any(|r| r["deleted_at"].is_null()), "{endpoint}");
        }
        assert_eq!(transport.snapshot(Cargo::ENDPOINT).await.len(), 13);
    }
}
