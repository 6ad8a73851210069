mod common;

use axum::http::{Method, StatusCode};
use oficina_api::entities::{ordem, ordem_foto, ordem_historico, ordem_peca, OrderStatus};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use common::{Part, TestApp};

const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, b'J', b'F', b'I', b'F'];

#[tokio::test]
async fn failed_create_rolls_back_every_row_and_file() {
    let app = TestApp::new().await;
    let cliente_id = app.seed_client("Rollback").await.to_string();
    app.fail_inserts_into("ordem_historico").await;

    let (status, body) = app
        .multipart(
            Method::POST,
            "/api/ordens",
            &[
                Part::Text("cliente_id", &cliente_id),
                Part::Text("equipamento", "Notebook"),
                Part::Text("defeito", "Não liga"),
                Part::Text("pecas", r#"[{"nome_peca":"Fonte","quantidade":1,"valor_unitario":90}]"#),
                Part::File { field: "fotos", file_name: "a.jpg", data: JPEG },
            ],
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{body}");
    assert_eq!(body, json!({"success": false, "error": "Erro interno do servidor"}));

    let db = &*app.state.db;
    assert_eq!(ordem::Entity::find().count(db).await.unwrap(), 0);
    assert_eq!(ordem_peca::Entity::find().count(db).await.unwrap(), 0);
    assert_eq!(ordem_foto::Entity::find().count(db).await.unwrap(), 0);
    assert_eq!(app.stored_files(), 0);
}

#[tokio::test]
async fn failed_update_keeps_status_history_and_lines() {
    let app = TestApp::new().await;
    let cliente_id = app.seed_client("Rollback").await;

    let mut payload = TestApp::order_payload(cliente_id);
    payload["pecas"] = json!([{"nome_peca": "Bateria", "valor_unitario": 50}]);
    let id = app.create_order(payload).await["id"].as_i64().unwrap() as i32;

    app.fail_inserts_into("ordem_fotos").await;

    let (status, _) = app
        .multipart(
            Method::PUT,
            &format!("/api/ordens/{id}"),
            &[
                Part::Text("status", "pronto"),
                Part::Text("pecas", r#"[{"nome_peca":"Tela","valor_unitario":200}]"#),
                Part::File { field: "fotos", file_name: "b.jpg", data: JPEG },
            ],
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let db = &*app.state.db;
    let stored = ordem::Entity::find_by_id(id).one(db).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Aguardando);

    let historico = ordem_historico::Entity::find()
        .filter(ordem_historico::Column::OrdemId.eq(id))
        .all(db)
        .await
        .unwrap();
    assert_eq!(historico.len(), 1);
    assert_eq!(historico[0].status_anterior, None);

    let pecas = ordem_peca::Entity::find()
        .filter(ordem_peca::Column::OrdemId.eq(id))
        .all(db)
        .await
        .unwrap();
    assert_eq!(pecas.len(), 1);
    assert_eq!(pecas[0].nome_peca, "Bateria");
    assert_eq!(app.stored_files(), 0);
}
