use std::sync::Arc;

use sea_orm::sea_query::Condition;
use sea_orm::{
    ActiveModelTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    Select, Set,
};
use tracing::{error, info, instrument};
use validator::Validate;

use crate::{
    db::DbPool, dto::clients::ClienteRequest, entities::cliente, errors::ServiceError,
    services::contains_ignore_case,
};

pub const CLIENT_NOT_FOUND: &str = "Cliente não encontrado";
const SEARCH_LIMIT: u64 = 20;

fn db_error(action: &'static str) -> impl Fn(DbErr) -> ServiceError {
    move |e| {
        error!(error = %e, action, "Client query failed");
        ServiceError::DatabaseError(e)
    }
}

fn matching(term: Option<&str>) -> Select<cliente::Entity> {
    let select = cliente::Entity::find();
    match term.map(str::trim).filter(|t| !t.is_empty()) {
        None => select,
        Some(term) => select.filter(
            Condition::any()
                .add(contains_ignore_case((cliente::Entity, cliente::Column::Nome), term))
                .add(contains_ignore_case((cliente::Entity, cliente::Column::Telefone), term))
                .add(contains_ignore_case((cliente::Entity, cliente::Column::Email), term)),
        ),
    }
}

/// Client records. Clients are never deleted through the API.
#[derive(Clone)]
pub struct ClientService {
    db: Arc<DbPool>,
}

impl ClientService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Clients ordered by name, optionally narrowed by a search term.
    #[instrument(skip(self))]
    pub async fn list_clients(
        &self,
        term: Option<&str>,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<cliente::Model>, u64), ServiceError> {
        let db = &*self.db;
        let (total, clientes) = tokio::try_join!(
            matching(term).count(db),
            matching(term)
                .order_by_asc(cliente::Column::Nome)
                .order_by_asc(cliente::Column::Id)
                .offset(offset)
                .limit(limit)
                .all(db),
        )
        .map_err(db_error("list clients"))?;
        Ok((clientes, total))
    }

    /// Quick lookup used by the order form; an empty term yields no rows.
    #[instrument(skip(self))]
    pub async fn search_clients(&self, term: &str) -> Result<Vec<cliente::Model>, ServiceError> {
        if term.trim().is_empty() {
            return Ok(Vec::new());
        }
        matching(Some(term))
            .order_by_asc(cliente::Column::Nome)
            .limit(SEARCH_LIMIT)
            .all(&*self.db)
            .await
            .map_err(db_error("search clients"))
    }

    #[instrument(skip(self))]
    pub async fn get_client(&self, id: i32) -> Result<cliente::Model, ServiceError> {
        cliente::Entity::find_by_id(id)
            .one(&*self.db)
            .await
            .map_err(db_error("find client"))?
            .ok_or_else(|| ServiceError::not_found(CLIENT_NOT_FOUND))
    }

    #[instrument(skip(self, request))]
    pub async fn create_client(
        &self,
        request: ClienteRequest,
    ) -> Result<cliente::Model, ServiceError> {
        let request = request.normalized();
        request.validate()?;

        let cliente = cliente::ActiveModel {
            nome: Set(request.nome),
            telefone: Set(request.telefone),
            email: Set(request.email),
            endereco: Set(request.endereco),
            cidade: Set(request.cidade),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(db_error("insert client"))?;

        info!(cliente_id = cliente.id, "Client created");
        Ok(cliente)
    }

    #[instrument(skip(self, request))]
    pub async fn update_client(
        &self,
        id: i32,
        request: ClienteRequest,
    ) -> Result<cliente::Model, ServiceError> {
        let request = request.normalized();
        request.validate()?;

        let mut active: cliente::ActiveModel = self.get_client(id).await?.into();
        active.nome = Set(request.nome);
        active.telefone = Set(request.telefone);
        active.email = Set(request.email);
        active.endereco = Set(request.endereco);
        active.cidade = Set(request.cidade);

        let cliente = active
            .update(&*self.db)
            .await
            .map_err(db_error("update client"))?;

        info!(cliente_id = id, "Client updated");
        Ok(cliente)
    }
}
