use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ordem::OrderStatus;

/// Append-only audit entry for status changes of a service order.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "ordem_historico")]
#[schema(as = OrdemHistorico)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub ordem_id: i32,
    /// `None` on the creation entry
    pub status_anterior: Option<OrderStatus>,
    pub status_novo: OrderStatus,
    pub observacoes: Option<String>,
    pub usuario: String,
    pub data_alteracao: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::ordem::Entity",
        from = "Column::OrdemId",
        to = "super::ordem::Column::Id",
        on_delete = "Cascade"
    )]
    Ordem,
}

impl Related<super::ordem::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ordem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
