use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::SimpleExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use tracing::{error, info, info_span, instrument, Instrument};

use crate::{
    db::DbPool,
    dto::orders::{
        OrderDetail, OrderInput, OrderListQuery, OrderSummary, OrderWithClient, PartInput,
        ServiceLineInput, StatusChangeRequest, UploadedPhoto,
    },
    entities::{
        cliente, ordem, ordem_foto, ordem_historico, ordem_peca, ordem_servico, OrderPriority,
        OrderStatus,
    },
    errors::ServiceError,
    services::contains_ignore_case,
    services::photos::{PhotoStorage, StagedFile},
    services::status::{normalize_status, parse_status},
};

/// Actor recorded on every history entry.
pub const HISTORY_USER: &str = "Sistema";
pub const ORDER_NOT_FOUND: &str = "Ordem de serviço não encontrada";
const REQUIRED_FIELDS_MESSAGE: &str = "Cliente, equipamento e defeito são obrigatórios";
const CREATION_NOTE: &str = "Ordem de serviço criada";

fn db_error(action: &'static str) -> impl Fn(DbErr) -> ServiceError {
    move |e| {
        error!(error = %e, action, "Database operation failed");
        ServiceError::DatabaseError(e)
    }
}

fn status_change_note(from: OrderStatus, to: OrderStatus) -> String {
    format!("Status alterado de {} para {}", from, to)
}

/// Resolves a status label, rejecting anything that is not canonical.
pub fn resolve_status(raw: &str) -> Result<OrderStatus, ServiceError> {
    parse_status(raw).ok_or_else(|| ServiceError::validation("Status inválido"))
}

pub fn resolve_priority(raw: &str) -> Result<OrderPriority, ServiceError> {
    OrderPriority::from_code(raw).ok_or_else(|| ServiceError::validation("Prioridade inválida"))
}

pub fn parse_client_id(raw: &str) -> Result<i32, ServiceError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| ServiceError::validation("ID do cliente inválido"))
}

/// Case-insensitive substring match on the responsible technician.
pub(crate) fn technician_matches(term: &str) -> SimpleExpr {
    contains_ignore_case((ordem::Entity, ordem::Column::TecnicoResponsavel), term)
}

/// Filters of the order listing; blank query values are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilters {
    pub status: Option<String>,
    pub cliente_id: Option<i32>,
    pub prioridade: Option<String>,
    pub tecnico: Option<String>,
}

impl OrderFilters {
    pub fn from_query(query: &OrderListQuery) -> Result<Self, ServiceError> {
        fn present(value: &Option<String>) -> Option<&str> {
            value.as_deref().map(str::trim).filter(|v| !v.is_empty())
        }

        Ok(Self {
            status: present(&query.status).map(normalize_status),
            cliente_id: present(&query.cliente_id).map(parse_client_id).transpose()?,
            prioridade: present(&query.prioridade).map(str::to_lowercase),
            tecnico: present(&query.tecnico).map(str::to_string),
        })
    }

    fn apply(&self, mut select: Select<ordem::Entity>) -> Select<ordem::Entity> {
        if let Some(status) = &self.status {
            select = select.filter(ordem::Column::Status.eq(status.as_str()));
        }
        if let Some(cliente_id) = self.cliente_id {
            select = select.filter(ordem::Column::ClienteId.eq(cliente_id));
        }
        if let Some(prioridade) = &self.prioridade {
            select = select.filter(ordem::Column::Prioridade.eq(prioridade.as_str()));
        }
        if let Some(tecnico) = &self.tecnico {
            select = select.filter(technician_matches(tecnico));
        }
        select
    }
}

/// One page of the order listing plus the filtered total.
#[derive(Debug, Clone)]
pub struct OrderPage {
    pub items: Vec<OrderSummary>,
    pub total: u64,
}

/// Service-order aggregate: the order row plus its parts, labor lines,
/// photos and status history.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
}

impl OrderService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Creates an order with its lines, photos and creation history entry in
    /// one transaction. Staged files are discarded when creation fails.
    #[instrument(skip(self, input, files), fields(photos = files.len()))]
    pub async fn create_order(
        &self,
        input: OrderInput,
        files: Vec<StagedFile>,
    ) -> Result<OrderWithClient, ServiceError> {
        let result = self.insert_order(input, &files).await;
        if result.is_err() && !files.is_empty() {
            PhotoStorage::discard(&files).await;
        }
        result
    }

    async fn insert_order(
        &self,
        input: OrderInput,
        files: &[StagedFile],
    ) -> Result<OrderWithClient, ServiceError> {
        let mut details = BTreeMap::new();
        details.insert(
            "cliente_id".to_string(),
            input.cliente_id.is_none().then(|| "Cliente é obrigatório".to_string()),
        );
        details.insert(
            "equipamento".to_string(),
            input.equipamento.is_none().then(|| "Equipamento é obrigatório".to_string()),
        );
        details.insert(
            "defeito".to_string(),
            input.defeito.is_none().then(|| "Defeito é obrigatório".to_string()),
        );
        let (Some(raw_cliente_id), Some(equipamento), Some(defeito)) = (
            input.cliente_id.as_deref(),
            input.equipamento.clone(),
            input.defeito.clone(),
        ) else {
            return Err(ServiceError::FieldValidation {
                message: REQUIRED_FIELDS_MESSAGE.to_string(),
                details,
            });
        };

        let cliente_id = parse_client_id(raw_cliente_id)?;
        let status = input
            .status
            .as_deref()
            .map(resolve_status)
            .transpose()?
            .unwrap_or_default();
        let prioridade = input
            .prioridade
            .as_deref()
            .map(resolve_priority)
            .transpose()?
            .unwrap_or_default();

        let db = &*self.db;
        let cliente = cliente::Entity::find_by_id(cliente_id)
            .one(db)
            .await
            .map_err(db_error("find client"))?
            .ok_or_else(|| ServiceError::validation("Cliente não encontrado"))?;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        let ordem = ordem::ActiveModel {
            cliente_id: Set(cliente_id),
            equipamento: Set(equipamento),
            marca: Set(input.marca),
            modelo: Set(input.modelo),
            defeito_relatado: Set(defeito),
            diagnostico: Set(input.diagnostico),
            solucao: Set(input.solucao),
            observacoes: Set(input.observacoes),
            status: Set(status),
            prioridade: Set(prioridade),
            valor_orcamento: Set(input.valor_orcamento),
            valor_final: Set(input.valor_final),
            data_previsao: Set(input.data_previsao),
            data_conclusao: Set(input.data_conclusao),
            data_entrega: Set(input.data_entrega),
            tecnico_responsavel: Set(input.tecnico_responsavel.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_error("insert order"))?;

        insert_lines(
            &txn,
            ordem.id,
            ordem.tecnico_responsavel.as_deref(),
            &input.pecas,
            &input.servicos,
        )
        .await
        .map_err(db_error("insert order lines"))?;

        record_history(&txn, ordem.id, None, status, CREATION_NOTE.to_string())
            .await
            .map_err(db_error("insert creation history"))?;

        insert_photos(&txn, ordem.id, files)
            .await
            .map_err(db_error("insert order photos"))?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, ordem_id = ordem.id, "Failed to commit order creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            ordem_id = ordem.id,
            cliente_id,
            pecas = input.pecas.len(),
            servicos = input.servicos.len(),
            "Service order created"
        );

        Ok(OrderWithClient {
            ordem,
            cliente_nome: Some(cliente.nome),
            cliente_telefone: cliente.telefone,
        })
    }

    /// Loads an order with its client and every related collection.
    #[instrument(skip(self))]
    pub async fn get_order(&self, id: i32) -> Result<OrderDetail, ServiceError> {
        let db = &*self.db;

        let (ordem, cliente) = ordem::Entity::find_by_id(id)
            .find_also_related(cliente::Entity)
            .one(db)
            .await
            .map_err(db_error("find order"))?
            .ok_or_else(|| ServiceError::not_found(ORDER_NOT_FOUND))?;

        let (fotos, pecas, servicos, historico) = tokio::try_join!(
            ordem_foto::Entity::find()
                .filter(ordem_foto::Column::OrdemId.eq(id))
                .order_by_asc(ordem_foto::Column::CreatedAt)
                .order_by_asc(ordem_foto::Column::Id)
                .all(db),
            ordem_peca::Entity::find()
                .filter(ordem_peca::Column::OrdemId.eq(id))
                .order_by_asc(ordem_peca::Column::CreatedAt)
                .order_by_asc(ordem_peca::Column::Id)
                .all(db),
            ordem_servico::Entity::find()
                .filter(ordem_servico::Column::OrdemId.eq(id))
                .order_by_asc(ordem_servico::Column::DataExecucao)
                .order_by_asc(ordem_servico::Column::Id)
                .all(db),
            ordem_historico::Entity::find()
                .filter(ordem_historico::Column::OrdemId.eq(id))
                .order_by_desc(ordem_historico::Column::DataAlteracao)
                .order_by_desc(ordem_historico::Column::Id)
                .all(db),
        )
        .map_err(db_error("load order collections"))?;

        Ok(OrderDetail {
            cliente_endereco: cliente.as_ref().and_then(|c| c.endereco.clone()),
            cliente_cidade: cliente.as_ref().and_then(|c| c.cidade.clone()),
            ordem: OrderSummary::new(ordem, cliente.as_ref()),
            fotos,
            pecas,
            servicos,
            historico,
        })
    }

    /// Filtered page of orders, newest entry first.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        filters: &OrderFilters,
        offset: u64,
        limit: u64,
    ) -> Result<OrderPage, ServiceError> {
        let db = &*self.db;

        let (total, rows) = tokio::try_join!(
            filters.apply(ordem::Entity::find()).count(db),
            filters
                .apply(ordem::Entity::find())
                .find_also_related(cliente::Entity)
                .order_by_desc(ordem::Column::DataEntrada)
                .order_by_desc(ordem::Column::Id)
                .offset(offset)
                .limit(limit)
                .all(db),
        )
        .map_err(db_error("list orders"))?;

        let items = rows
            .into_iter()
            .map(|(ordem, cliente)| OrderSummary::new(ordem, cliente.as_ref()))
            .collect();

        Ok(OrderPage { items, total })
    }

    /// Applies a full update and replaces the order's parts and labor lines.
    /// A status change and its history entry commit together with the update.
    #[instrument(skip(self, input, files), fields(photos = files.len()))]
    pub async fn update_order(
        &self,
        id: i32,
        input: OrderInput,
        files: Vec<StagedFile>,
    ) -> Result<OrderWithClient, ServiceError> {
        let result = self.apply_update(id, input, &files).await;
        if result.is_err() && !files.is_empty() {
            PhotoStorage::discard(&files).await;
        }
        result
    }

    async fn apply_update(
        &self,
        id: i32,
        input: OrderInput,
        files: &[StagedFile],
    ) -> Result<OrderWithClient, ServiceError> {
        let requested_status = input.status.as_deref().map(resolve_status).transpose()?;
        let requested_priority = input
            .prioridade
            .as_deref()
            .map(resolve_priority)
            .transpose()?;

        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, ordem_id = id, "Failed to start transaction for order update");
            ServiceError::DatabaseError(e)
        })?;

        let existing = ordem::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(db_error("find order"))?
            .ok_or_else(|| ServiceError::not_found(ORDER_NOT_FOUND))?;

        let previous_status = existing.status;
        let status = requested_status.unwrap_or(previous_status);
        if status != previous_status {
            record_history(
                &txn,
                id,
                Some(previous_status),
                status,
                status_change_note(previous_status, status),
            )
            .await
            .map_err(db_error("insert status history"))?;
        }

        let mut active: ordem::ActiveModel = existing.into();
        if let Some(equipamento) = input.equipamento {
            active.equipamento = Set(equipamento);
        }
        if let Some(defeito) = input.defeito {
            active.defeito_relatado = Set(defeito);
        }
        if let Some(marca) = input.marca {
            active.marca = Set(Some(marca));
        }
        if let Some(diagnostico) = input.diagnostico {
            active.diagnostico = Set(Some(diagnostico));
        }
        if let Some(solucao) = input.solucao {
            active.solucao = Set(Some(solucao));
        }
        active.modelo = Set(input.modelo);
        active.observacoes = Set(input.observacoes);
        active.tecnico_responsavel = Set(input.tecnico_responsavel.clone());
        active.status = Set(status);
        if let Some(prioridade) = requested_priority {
            active.prioridade = Set(prioridade);
        }
        active.valor_orcamento = Set(input.valor_orcamento);
        active.valor_final = Set(input.valor_final);
        active.data_previsao = Set(input.data_previsao);
        active.data_conclusao = Set(input.data_conclusao);
        active.data_entrega = Set(input.data_entrega);

        let ordem = active
            .update(&txn)
            .await
            .map_err(db_error("update order"))?;

        ordem_peca::Entity::delete_many()
            .filter(ordem_peca::Column::OrdemId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_error("delete order parts"))?;
        ordem_servico::Entity::delete_many()
            .filter(ordem_servico::Column::OrdemId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_error("delete order services"))?;

        insert_lines(
            &txn,
            id,
            ordem.tecnico_responsavel.as_deref(),
            &input.pecas,
            &input.servicos,
        )
        .await
        .map_err(db_error("insert order lines"))?;

        insert_photos(&txn, id, files)
            .await
            .map_err(db_error("insert order photos"))?;

        let cliente = ordem
            .find_related(cliente::Entity)
            .one(&txn)
            .await
            .map_err(db_error("find order client"))?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, ordem_id = id, "Failed to commit order update");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            ordem_id = id,
            status = %status,
            status_changed = status != previous_status,
            "Service order updated"
        );

        Ok(OrderWithClient {
            ordem,
            cliente_nome: cliente.as_ref().map(|c| c.nome.clone()),
            cliente_telefone: cliente.and_then(|c| c.telefone),
        })
    }

    /// Sets the status and always appends one history entry.
    #[instrument(skip(self, request))]
    pub async fn change_status(
        &self,
        id: i32,
        request: StatusChangeRequest,
    ) -> Result<(), ServiceError> {
        let raw = request
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ServiceError::validation("Status é obrigatório"))?;
        let status = resolve_status(raw)?;

        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, ordem_id = id, "Failed to start transaction for status change");
            ServiceError::DatabaseError(e)
        })?;

        let existing = ordem::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(db_error("find order"))?
            .ok_or_else(|| ServiceError::not_found(ORDER_NOT_FOUND))?;
        let previous_status = existing.status;

        let mut active: ordem::ActiveModel = existing.into();
        active.status = Set(status);
        active
            .update(&txn)
            .await
            .map_err(db_error("update order status"))?;

        let note = request
            .observacoes
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| status_change_note(previous_status, status));
        record_history(&txn, id, Some(previous_status), status, note)
            .await
            .map_err(db_error("insert status history"))?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, ordem_id = id, "Failed to commit status change");
            ServiceError::DatabaseError(e)
        })?;

        info!(ordem_id = id, from = %previous_status, to = %status, "Order status changed");
        Ok(())
    }

    /// Deletes the order and its rows; stored photo files are removed in the
    /// background afterwards.
    #[instrument(skip(self))]
    pub async fn delete_order(&self, id: i32) -> Result<(), ServiceError> {
        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, ordem_id = id, "Failed to start transaction for order deletion");
            ServiceError::DatabaseError(e)
        })?;

        ordem::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(db_error("find order"))?
            .ok_or_else(|| ServiceError::not_found(ORDER_NOT_FOUND))?;

        let caminhos: Vec<String> = ordem_foto::Entity::find()
            .filter(ordem_foto::Column::OrdemId.eq(id))
            .all(&txn)
            .await
            .map_err(db_error("list order photos"))?
            .into_iter()
            .map(|foto| foto.caminho)
            .collect();

        ordem_foto::Entity::delete_many()
            .filter(ordem_foto::Column::OrdemId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_error("delete order photos"))?;
        ordem_peca::Entity::delete_many()
            .filter(ordem_peca::Column::OrdemId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_error("delete order parts"))?;
        ordem_servico::Entity::delete_many()
            .filter(ordem_servico::Column::OrdemId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_error("delete order services"))?;
        ordem_historico::Entity::delete_many()
            .filter(ordem_historico::Column::OrdemId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_error("delete order history"))?;
        ordem::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(db_error("delete order"))?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, ordem_id = id, "Failed to commit order deletion");
            ServiceError::DatabaseError(e)
        })?;

        info!(ordem_id = id, photos = caminhos.len(), "Service order deleted");

        if !caminhos.is_empty() {
            tokio::spawn(
                PhotoStorage::remove_paths(caminhos)
                    .instrument(info_span!("remove_order_photos", ordem_id = id)),
            );
        }
        Ok(())
    }

    /// Fails with not-found unless the order exists.
    pub async fn ensure_exists(&self, id: i32) -> Result<(), ServiceError> {
        let exists = ordem::Entity::find_by_id(id)
            .count(&*self.db)
            .await
            .map_err(db_error("find order"))?
            > 0;
        if exists {
            Ok(())
        } else {
            Err(ServiceError::not_found(ORDER_NOT_FOUND))
        }
    }

    /// Attaches staged photos to an existing order.
    #[instrument(skip(self, files), fields(photos = files.len()))]
    pub async fn add_photos(
        &self,
        id: i32,
        files: Vec<StagedFile>,
    ) -> Result<Vec<UploadedPhoto>, ServiceError> {
        let result = self.insert_order_photos(id, &files).await;
        if result.is_err() && !files.is_empty() {
            PhotoStorage::discard(&files).await;
        }
        result
    }

    async fn insert_order_photos(
        &self,
        id: i32,
        files: &[StagedFile],
    ) -> Result<Vec<UploadedPhoto>, ServiceError> {
        self.ensure_exists(id).await?;
        if files.is_empty() {
            return Err(ServiceError::validation("Nenhuma foto foi enviada"));
        }

        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, ordem_id = id, "Failed to start transaction for photo upload");
            ServiceError::DatabaseError(e)
        })?;
        let fotos = insert_photos(&txn, id, files)
            .await
            .map_err(db_error("insert order photos"))?;
        txn.commit().await.map_err(|e| {
            error!(error = %e, ordem_id = id, "Failed to commit photo upload");
            ServiceError::DatabaseError(e)
        })?;

        info!(ordem_id = id, photos = fotos.len(), "Photos attached to order");
        Ok(fotos.into_iter().map(UploadedPhoto::from).collect())
    }
}

async fn record_history<C: ConnectionTrait>(
    conn: &C,
    ordem_id: i32,
    status_anterior: Option<OrderStatus>,
    status_novo: OrderStatus,
    observacoes: String,
) -> Result<ordem_historico::Model, DbErr> {
    ordem_historico::ActiveModel {
        ordem_id: Set(ordem_id),
        status_anterior: Set(status_anterior),
        status_novo: Set(status_novo),
        observacoes: Set(Some(observacoes)),
        usuario: Set(HISTORY_USER.to_string()),
        data_alteracao: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await
}

/// Inserts parts and labor lines; lines without a technician inherit the
/// order's one.
async fn insert_lines<C: ConnectionTrait>(
    conn: &C,
    ordem_id: i32,
    tecnico_padrao: Option<&str>,
    pecas: &[PartInput],
    servicos: &[ServiceLineInput],
) -> Result<(), DbErr> {
    let now = Utc::now();

    for peca in pecas {
        ordem_peca::ActiveModel {
            ordem_id: Set(ordem_id),
            nome_peca: Set(peca.nome_peca.clone()),
            codigo_peca: Set(peca.codigo_peca.clone()),
            quantidade: Set(peca.quantidade),
            valor_unitario: Set(peca.valor_unitario),
            valor_total: Set(peca.valor_total()),
            fornecedor: Set(peca.fornecedor.clone()),
            observacoes: Set(peca.observacoes.clone()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }

    for servico in servicos {
        ordem_servico::ActiveModel {
            ordem_id: Set(ordem_id),
            descricao_servico: Set(servico.descricao_servico.clone()),
            tempo_gasto: Set(servico.tempo_gasto),
            valor_servico: Set(servico.valor_servico),
            tecnico: Set(servico
                .tecnico
                .clone()
                .or_else(|| tecnico_padrao.map(str::to_string))),
            observacoes: Set(servico.observacoes.clone()),
            data_execucao: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }

    Ok(())
}

async fn insert_photos<C: ConnectionTrait>(
    conn: &C,
    ordem_id: i32,
    files: &[StagedFile],
) -> Result<Vec<ordem_foto::Model>, DbErr> {
    let now = Utc::now();
    let mut fotos = Vec::with_capacity(files.len());
    for file in files {
        let foto = ordem_foto::ActiveModel {
            ordem_id: Set(ordem_id),
            nome_arquivo: Set(file.nome_arquivo.clone()),
            caminho: Set(file.caminho.clone()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        fotos.push(foto);
    }
    Ok(fotos)
}
