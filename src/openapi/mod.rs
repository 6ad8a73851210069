use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Oficina API",
        version = "0.1.0",
        description = r#"
# Oficina API

Back office of a device repair shop.

## Features

- **Service orders**: create, update and track orders with parts, labor lines and photos
- **Status history**: every status change is recorded with the previous and new status
- **Clients**: client records used by the orders
- **Dashboard**: month-to-date figures, daily summary and period reports
- **Categories**: stock and financial categories seeded on startup

## Request bodies

`POST /api/ordens` and `PUT /api/ordens/{id}` accept either a JSON object or
`multipart/form-data`. In forms, `pecas` and `servicos` are JSON-encoded
strings and photos are sent in the `fotos` field.

## Error Handling

Errors share one envelope:

```json
{
  "success": false,
  "error": "Ordem de serviço não encontrada"
}
```

Validation failures on order creation add a `details` object keyed by field.

## Pagination

List endpoints accept `page` (default 1) and `limit` (default 15, max 100)
and answer with `pagination: {page, limit, total, total_pages}`.
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:3001", description = "Local development")
    ),
    tags(
        (name = "Ordens", description = "Service order endpoints"),
        (name = "Dashboard", description = "Statistics and reports"),
        (name = "Clientes", description = "Client endpoints"),
        (name = "Categorias", description = "Stock and financial categories"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        // Orders
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::create_order,
        crate::handlers::orders::update_order,
        crate::handlers::orders::change_status,
        crate::handlers::orders::delete_order,
        crate::handlers::orders::upload_photos,
        crate::handlers::orders::order_stats,
        crate::handlers::orders::order_report,

        // Clients
        crate::handlers::clients::list_clients,
        crate::handlers::clients::search_clients,
        crate::handlers::clients::get_client,
        crate::handlers::clients::create_client,
        crate::handlers::clients::update_client,

        // Categories
        crate::handlers::categories::list_categories,
        crate::handlers::categories::list_financial_categories,

        // Health
        crate::handlers::health::health_check,
        crate::handlers::health::api_status,
    ),
    components(
        schemas(
            crate::errors::ErrorResponse,
            crate::handlers::common::PaginationMeta,
            crate::entities::OrderStatus,
            crate::entities::OrderPriority,
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_order_routes() {
        let json = serde_json::to_string(&ApiDoc::openapi()).unwrap();
        assert!(json.contains("Oficina API"));
        assert!(json.contains("/api/ordens/{id}/status"));
        assert!(json.contains("/api/ordens/relatorio"));
        assert!(json.contains("/api/clientes/search"));
    }
}
