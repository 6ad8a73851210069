mod common;

use axum::http::{Method, StatusCode};
use oficina_api::entities::{ordem_foto, ordem_historico, ordem_peca, ordem_servico};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::{json, Value};

use common::TestApp;

fn number(value: &Value) -> f64 {
    value.as_f64().unwrap_or_else(|| panic!("not a number: {value}"))
}

#[tokio::test]
async fn create_order_defaults_status_and_logs_history() {
    let app = TestApp::new().await;
    let cliente_id = app.seed_client("Maria Silva").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/ordens",
            Some(json!({
                "cliente_id": cliente_id,
                "equipamento": "iPhone 11",
                "defeito": "tela quebrada"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Ordem de serviço criada com sucesso");
    assert_eq!(body["data"]["status"], "aguardando");
    assert_eq!(body["data"]["prioridade"], "normal");
    assert_eq!(body["data"]["cliente_nome"], "Maria Silva");

    let id = body["data"]["id"].as_i64().unwrap() as i32;
    let historico = ordem_historico::Entity::find()
        .filter(ordem_historico::Column::OrdemId.eq(id))
        .all(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(historico.len(), 1);
    assert_eq!(historico[0].status_anterior, None);
    assert_eq!(historico[0].status_novo.as_str(), "aguardando");
    assert_eq!(historico[0].usuario, "Sistema");
    assert_eq!(historico[0].observacoes.as_deref(), Some("Ordem de serviço criada"));
}

#[tokio::test]
async fn create_order_without_client_reports_field_details() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/ordens",
            Some(json!({"equipamento": "Notebook", "defeito": "Não liga"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Cliente, equipamento e defeito são obrigatórios");
    assert_eq!(body["details"]["cliente_id"], "Cliente é obrigatório");
    assert!(body["details"]["equipamento"].is_null());
    assert!(body["details"]["defeito"].is_null());
}

#[tokio::test]
async fn create_order_rejects_unknown_client_and_bad_status() {
    let app = TestApp::new().await;
    let cliente_id = app.seed_client("João").await;

    let (status, body) = app
        .request(Method::POST, "/api/ordens", Some(TestApp::order_payload(9_999)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cliente não encontrado");

    let mut payload = TestApp::order_payload(cliente_id);
    payload["status"] = json!("quebrado");
    let (status, body) = app.request(Method::POST, "/api/ordens", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Status inválido");

    let mut payload = TestApp::order_payload(cliente_id);
    payload["cliente_id"] = json!("abc");
    let (status, body) = app.request(Method::POST, "/api/ordens", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ID do cliente inválido");

    let total = oficina_api::entities::ordem::Entity::find()
        .count(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(total, 0);
}

#[tokio::test]
async fn part_totals_are_recomputed_server_side() {
    let app = TestApp::new().await;
    let cliente_id = app.seed_client("Ana").await;

    let mut payload = TestApp::order_payload(cliente_id);
    payload["tecnico_responsavel"] = json!("Carlos");
    payload["pecas"] = json!([
        {"nome_peca": "Tela", "quantidade": 2, "valor_unitario": 120, "valor_total": 5},
        {"nome_peca": "Cola", "valor_total": 99}
    ]);
    payload["servicos"] = json!([
        {"descricao_servico": "Troca de tela", "valor_servico": "80,50"}
    ]);
    let created = app.create_order(payload).await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = app.get(&format!("/api/ordens/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];

    let pecas = data["pecas"].as_array().unwrap();
    assert_eq!(pecas.len(), 2);
    assert_eq!(pecas[0]["nome_peca"], "Tela");
    assert_eq!(number(&pecas[0]["valor_total"]), 240.0);
    assert_eq!(pecas[1]["quantidade"], 1);
    assert_eq!(number(&pecas[1]["valor_total"]), 0.0);

    let servicos = data["servicos"].as_array().unwrap();
    assert_eq!(servicos[0]["tecnico"], "Carlos");
    assert_eq!(number(&servicos[0]["valor_servico"]), 80.5);
}

#[tokio::test]
async fn get_order_fills_defaults_and_client_fields() {
    let app = TestApp::new().await;
    let cliente_id = app.seed_client("Beatriz").await;
    let created = app.create_order(TestApp::order_payload(cliente_id)).await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = app.get(&format!("/api/ordens/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["defeito"], "Tela quebrada");
    assert_eq!(data["modelo"], "");
    assert_eq!(data["observacoes"], "");
    assert_eq!(data["tecnico_responsavel"], "");
    assert_eq!(number(&data["valor_orcamento"]), 0.0);
    assert_eq!(number(&data["valor_final"]), 0.0);
    assert_eq!(data["cliente_nome"], "Beatriz");
    assert_eq!(data["cliente_cidade"], "São Paulo");
    assert_eq!(data["historico"].as_array().unwrap().len(), 1);
    assert!(data["fotos"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn missing_orders_are_not_found() {
    let app = TestApp::new().await;

    for uri in ["/api/ordens/999", "/api/ordens/abc"] {
        let (status, body) = app.get(uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            json!({"success": false, "error": "Ordem de serviço não encontrada"})
        );
    }

    let (status, _) = app.request(Method::DELETE, "/api/ordens/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .request(Method::PUT, "/api/ordens/999", Some(json!({"equipamento": "x"})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_filters_by_status_priority_and_technician() {
    let app = TestApp::new().await;
    let cliente_a = app.seed_client("Cliente A").await;
    let cliente_b = app.seed_client("Cliente B").await;

    for (cliente_id, status, prioridade, tecnico) in [
        (cliente_a, "pronto", "alta", "Carlos Souza"),
        (cliente_a, "aguardando", "normal", "Marina"),
        (cliente_b, "pronto", "baixa", "carla"),
        (cliente_b, "Em Reparo", "urgente", "CARLOS"),
    ] {
        let mut payload = TestApp::order_payload(cliente_id);
        payload["status"] = json!(status);
        payload["prioridade"] = json!(prioridade);
        payload["tecnico_responsavel"] = json!(tecnico);
        app.create_order(payload).await;
    }

    let (status, body) = app.get("/api/ordens?status=pronto").await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|o| o["status"] == "pronto"));
    assert_eq!(body["pagination"]["total"], 2);

    let (_, body) = app.get("/api/ordens?tecnico=carl").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let (_, body) = app.get("/api/ordens?tecnico=CARLOS").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = app
        .get(&format!("/api/ordens?cliente_id={cliente_b}&prioridade=urgente"))
        .await;
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["status"], "em_andamento");

    let (_, body) = app.get("/api/ordens?status=&tecnico=&cliente_id=").await;
    assert_eq!(body["pagination"]["total"], 4);

    let (status, body) = app.get("/api/ordens?cliente_id=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ID do cliente inválido");
}

#[tokio::test]
async fn list_paginates_newest_first() {
    let app = TestApp::new().await;
    let cliente_id = app.seed_client("Paginado").await;

    let mut ids = Vec::new();
    for i in 0..5 {
        let mut payload = TestApp::order_payload(cliente_id);
        payload["equipamento"] = json!(format!("Aparelho {i}"));
        ids.push(app.create_order(payload).await["id"].as_i64().unwrap());
    }

    let (status, body) = app.get("/api/ordens?page=2&limit=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["pagination"],
        json!({"page": 2, "limit": 2, "total": 5, "total_pages": 3})
    );
    let page_ids: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["id"].as_i64().unwrap())
        .collect();
    assert_eq!(page_ids, vec![ids[2], ids[1]]);

    let (_, body) = app.get("/api/ordens?limit=1000").await;
    assert_eq!(body["pagination"]["limit"], 100);
    assert_eq!(body["data"][0]["cliente_nome"], "Paginado");
}

#[tokio::test]
async fn update_replaces_lines_and_keeps_required_fields() {
    let app = TestApp::new().await;
    let cliente_id = app.seed_client("Atualiza").await;

    let mut payload = TestApp::order_payload(cliente_id);
    payload["marca"] = json!("Apple");
    payload["pecas"] = json!([{"nome_peca": "Bateria", "valor_unitario": 50}]);
    let created = app.create_order(payload).await;
    let id = created["id"].as_i64().unwrap() as i32;

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/api/ordens/{id}"),
            Some(json!({
                "equipamento": "  ",
                "modelo": "A2221",
                "valor_orcamento": "350,00",
                "pecas": [
                    {"nome_peca": "Tela", "quantidade": 1, "valor_unitario": 200},
                    {"nome_peca": "Película", "quantidade": 3, "valor_unitario": 10}
                ]
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Ordem de serviço atualizada com sucesso");
    let data = &body["data"];
    assert_eq!(data["equipamento"], "iPhone 11");
    assert_eq!(data["defeito_relatado"], "Tela quebrada");
    assert_eq!(data["marca"], "Apple");
    assert_eq!(data["modelo"], "A2221");
    assert_eq!(number(&data["valor_orcamento"]), 350.0);
    assert_eq!(data["status"], "aguardando");

    let pecas = ordem_peca::Entity::find()
        .filter(ordem_peca::Column::OrdemId.eq(id))
        .all(&*app.state.db)
        .await
        .unwrap();
    let nomes: Vec<&str> = pecas.iter().map(|p| p.nome_peca.as_str()).collect();
    assert_eq!(nomes, vec!["Tela", "Película"]);

    let historico = ordem_historico::Entity::find()
        .filter(ordem_historico::Column::OrdemId.eq(id))
        .count(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(historico, 1);
}

#[tokio::test]
async fn delete_removes_every_child_row() {
    let app = TestApp::new().await;
    let cliente_id = app.seed_client("Remove").await;

    let mut payload = TestApp::order_payload(cliente_id);
    payload["pecas"] = json!([{"nome_peca": "Conector"}]);
    payload["servicos"] = json!([{"descricao_servico": "Limpeza"}]);
    let id = app.create_order(payload).await["id"].as_i64().unwrap() as i32;

    let (status, _) = app
        .request(
            Method::PATCH,
            &format!("/api/ordens/{id}/status"),
            Some(json!({"status": "pronto"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .request(Method::DELETE, &format!("/api/ordens/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "message": "Ordem de serviço deletada com sucesso"})
    );

    let db = &*app.state.db;
    assert_eq!(
        ordem_peca::Entity::find()
            .filter(ordem_peca::Column::OrdemId.eq(id))
            .count(db)
            .await
            .unwrap(),
        0
    );
    assert_eq!(
        ordem_servico::Entity::find()
            .filter(ordem_servico::Column::OrdemId.eq(id))
            .count(db)
            .await
            .unwrap(),
        0
    );
    assert_eq!(
        ordem_foto::Entity::find()
            .filter(ordem_foto::Column::OrdemId.eq(id))
            .count(db)
            .await
            .unwrap(),
        0
    );
    assert_eq!(
        ordem_historico::Entity::find()
            .filter(ordem_historico::Column::OrdemId.eq(id))
            .count(db)
            .await
            .unwrap(),
        0
    );

    let (status, _) = app.get(&format!("/api/ordens/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_json_body_uses_error_envelope() {
    let app = TestApp::new().await;
    let cliente_id = app.seed_client("Json").await;
    let id = app.create_order(TestApp::order_payload(cliente_id)).await["id"]
        .as_i64()
        .unwrap();

    let (status, body) = app
        .request(Method::PATCH, &format!("/api/ordens/{id}/status"), Some(json!("pronto")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = app.request(Method::POST, "/api/ordens", Some(json!("texto"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn huge_page_numbers_return_an_empty_page() {
    let app = TestApp::new().await;
    let cliente_id = app.seed_client("Paginas").await;
    app.create_order(TestApp::order_payload(cliente_id)).await;

    for uri in [
        "/api/ordens?page=4611686018427387905&limit=2",
        "/api/ordens?page=18446744073709551615&limit=100",
        "/api/clientes?page=18446744073709551615",
    ] {
        let (status, body) = app.get(uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}: {body}");
        assert!(body["data"].as_array().unwrap().is_empty());
        assert_eq!(body["pagination"]["total"], 1);
    }
}
