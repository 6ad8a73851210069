use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A labor line executed on a service order.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "ordem_servicos")]
#[schema(as = OrdemServico)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub ordem_id: i32,
    pub descricao_servico: String,
    /// Hours spent
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub tempo_gasto: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub valor_servico: Option<Decimal>,
    pub tecnico: Option<String>,
    pub observacoes: Option<String>,
    pub data_execucao: DateTime<Utc>,
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
