mod common;

use std::path::Path;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{Part, TestApp};

const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

#[tokio::test]
async fn multipart_create_stores_photos_and_lines() {
    let app = TestApp::new().await;
    let cliente_id = app.seed_client("Foto").await.to_string();

    let (status, body) = app
        .multipart(
            Method::POST,
            "/api/ordens",
            &[
                Part::Text("cliente_id", &cliente_id),
                Part::Text("equipamento", "Samsung A52"),
                Part::Text("defeito", "Não carrega"),
                Part::Text("valor_orcamento", "199,90"),
                Part::Text("pecas", r#"[{"nome_peca":"Conector","quantidade":"1","valor_unitario":"45"}]"#),
                Part::File { field: "fotos", file_name: "frente.JPG", data: JPEG },
                Part::File { field: "fotos", file_name: "verso.png", data: b"png" },
            ],
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(app.stored_files(), 2);

    let id = body["data"]["id"].as_i64().unwrap();
    let (_, body) = app.get(&format!("/api/ordens/{id}")).await;
    let data = &body["data"];
    assert_eq!(data["valor_orcamento"].as_f64(), Some(199.9));
    assert_eq!(data["pecas"][0]["nome_peca"], "Conector");

    let fotos = data["fotos"].as_array().unwrap();
    assert_eq!(fotos.len(), 2);
    let first = fotos[0]["nome_arquivo"].as_str().unwrap();
    assert!(first.ends_with(".jpg"), "{first}");
    assert!(Path::new(fotos[0]["caminho"].as_str().unwrap()).exists());
}

#[tokio::test]
async fn failed_multipart_create_discards_uploaded_files() {
    let app = TestApp::new().await;

    let (status, body) = app
        .multipart(
            Method::POST,
            "/api/ordens",
            &[
                Part::Text("cliente_id", "777"),
                Part::Text("equipamento", "Tablet"),
                Part::Text("defeito", "Tela"),
                Part::File { field: "fotos", file_name: "a.jpg", data: JPEG },
            ],
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cliente não encontrado");
    assert_eq!(app.stored_files(), 0);
}

#[tokio::test]
async fn upload_appends_photos_to_existing_order() {
    let app = TestApp::new().await;
    let cliente_id = app.seed_client("Upload").await;
    let id = app.create_order(TestApp::order_payload(cliente_id)).await["id"]
        .as_i64()
        .unwrap();

    let (status, body) = app
        .multipart(
            Method::POST,
            &format!("/api/ordens/{id}/fotos"),
            &[
                Part::File { field: "fotos", file_name: "1.jpg", data: JPEG },
                Part::File { field: "fotos", file_name: "vazio.jpg", data: b"" },
            ],
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "1 foto(s) adicionada(s) com sucesso");
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = app.get(&format!("/api/ordens/{id}")).await;
    assert_eq!(body["data"]["fotos"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn upload_without_files_or_order_is_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app
        .multipart(
            Method::POST,
            "/api/ordens/31337/fotos",
            &[Part::File { field: "fotos", file_name: "1.jpg", data: JPEG }],
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Ordem de serviço não encontrada");
    assert_eq!(app.stored_files(), 0);

    let cliente_id = app.seed_client("Sem fotos").await;
    let id = app.create_order(TestApp::order_payload(cliente_id)).await["id"]
        .as_i64()
        .unwrap();

    let (status, body) = app
        .multipart(
            Method::POST,
            &format!("/api/ordens/{id}/fotos"),
            &[Part::Text("descricao", "sem arquivo")],
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "error": "Nenhuma foto foi enviada"}));

    let (status, body) = app
        .request(Method::POST, &format!("/api/ordens/{id}/fotos"), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Nenhuma foto foi enviada");
}

#[tokio::test]
async fn multipart_update_appends_photos() {
    let app = TestApp::new().await;
    let cliente_id = app.seed_client("Atualiza foto").await;
    let id = app.create_order(TestApp::order_payload(cliente_id)).await["id"]
        .as_i64()
        .unwrap();

    app.multipart(
        Method::POST,
        &format!("/api/ordens/{id}/fotos"),
        &[Part::File { field: "fotos", file_name: "antes.jpg", data: JPEG }],
    )
    .await;

    let (status, body) = app
        .multipart(
            Method::PUT,
            &format!("/api/ordens/{id}"),
            &[
                Part::Text("diagnostico", "Placa oxidada"),
                Part::File { field: "fotos", file_name: "depois.jpg", data: JPEG },
            ],
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (_, body) = app.get(&format!("/api/ordens/{id}")).await;
    assert_eq!(body["data"]["diagnostico"], "Placa oxidada");
    assert_eq!(body["data"]["fotos"].as_array().unwrap().len(), 2);
    assert_eq!(app.stored_files(), 2);
}

#[tokio::test]
async fn deleting_an_order_removes_its_files() {
    let app = TestApp::new().await;
    let cliente_id = app.seed_client("Apaga").await.to_string();

    let (status, body) = app
        .multipart(
            Method::POST,
            "/api/ordens",
            &[
                Part::Text("cliente_id", &cliente_id),
                Part::Text("equipamento", "Console"),
                Part::Text("defeito", "Superaquece"),
                Part::File { field: "fotos", file_name: "a.jpg", data: JPEG },
            ],
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(app.stored_files(), 1);
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = app
        .request(Method::DELETE, &format!("/api/ordens/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    // files are removed by a background task
    for _ in 0..50 {
        if app.stored_files() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(app.stored_files(), 0);
}
