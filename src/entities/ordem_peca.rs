use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A part consumed by a service order. `valor_total` is always computed
/// server-side from `quantidade` and `valor_unitario`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "ordem_pecas")]
#[schema(as = OrdemPeca)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub ordem_id: i32,
    pub nome_peca: String,
    pub codigo_peca: Option<String>,
    pub quantidade: i32,
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub valor_unitario: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub valor_total: Decimal,
    pub fornecedor: Option<String>,
    pub observacoes: Option<String>,
    pub created_at: DateTime<Utc>,
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
