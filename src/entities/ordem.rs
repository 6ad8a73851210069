use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Canonical status codes of a service order.
///
/// Transitions are unconstrained: any status may move to any other one,
/// and every accepted change is recorded in `ordem_historico`.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "aguardando")]
    Aguardando,
    #[sea_orm(string_value = "em_andamento")]
    EmAndamento,
    #[sea_orm(string_value = "aguardando_peca")]
    AguardandoPeca,
    #[sea_orm(string_value = "pronto")]
    Pronto,
    #[sea_orm(string_value = "entregue")]
    Entregue,
    #[sea_orm(string_value = "cancelado")]
    Cancelado,
}

impl OrderStatus {
    /// Fixed order used by dashboards and reports
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Aguardando,
        OrderStatus::EmAndamento,
        OrderStatus::AguardandoPeca,
        OrderStatus::Pronto,
        OrderStatus::Entregue,
        OrderStatus::Cancelado,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Aguardando => "aguardando",
            OrderStatus::EmAndamento => "em_andamento",
            OrderStatus::AguardandoPeca => "aguardando_peca",
            OrderStatus::Pronto => "pronto",
            OrderStatus::Entregue => "entregue",
            OrderStatus::Cancelado => "cancelado",
        }
    }

    /// Exact lookup of a canonical code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == code)
    }

    /// Orders still waiting to be delivered or cancelled.
    pub fn is_open(&self) -> bool {
        !matches!(self, OrderStatus::Entregue | OrderStatus::Cancelado)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Aguardando
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderPriority {
    #[sea_orm(string_value = "baixa")]
    Baixa,
    #[sea_orm(string_value = "normal")]
    Normal,
    #[sea_orm(string_value = "alta")]
    Alta,
    #[sea_orm(string_value = "urgente")]
    Urgente,
}

impl OrderPriority {
    pub const ALL: [OrderPriority; 4] = [
        OrderPriority::Baixa,
        OrderPriority::Normal,
        OrderPriority::Alta,
        OrderPriority::Urgente,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderPriority::Baixa => "baixa",
            OrderPriority::Normal => "normal",
            OrderPriority::Alta => "alta",
            OrderPriority::Urgente => "urgente",
        }
    }

    /// Case-insensitive lookup of a priority code.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim().to_lowercase();
        Self::ALL.into_iter().find(|p| p.as_str() == code)
    }
}

impl Default for OrderPriority {
    fn default() -> Self {
        OrderPriority::Normal
    }
}

/// The `ordens` table.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "ordens")]
#[schema(as = Ordem)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub cliente_id: i32,
    pub equipamento: String,
    pub marca: Option<String>,
    pub modelo: Option<String>,
    pub defeito_relatado: String,
    pub diagnostico: Option<String>,
    pub solucao: Option<String>,
    pub observacoes: Option<String>,
    pub status: OrderStatus,
    pub prioridade: OrderPriority,
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub valor_orcamento: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub valor_final: Option<Decimal>,
    pub data_entrada: DateTime<Utc>,
    pub data_previsao: Option<DateTime<Utc>>,
    pub data_conclusao: Option<DateTime<Utc>>,
    pub data_entrega: Option<DateTime<Utc>>,
    pub tecnico_responsavel: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cliente::Entity",
        from = "Column::ClienteId",
        to = "super::cliente::Column::Id"
    )]
    Cliente,
    #[sea_orm(has_many = "super::ordem_peca::Entity")]
    Pecas,
    #[sea_orm(has_many = "super::ordem_servico::Entity")]
    Servicos,
    #[sea_orm(has_many = "super::ordem_foto::Entity")]
    Fotos,
    #[sea_orm(has_many = "super::ordem_historico::Entity")]
    Historico,
}

impl Related<super::cliente::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cliente.def()
    }
}

impl Related<super::ordem_peca::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pecas.def()
    }
}

impl Related<super::ordem_servico::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Servicos.def()
    }
}

impl Related<super::ordem_foto::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fotos.def()
    }
}

impl Related<super::ordem_historico::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Historico.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now();
        if insert {
            if self.created_at.is_not_set() {
                self.created_at = Set(now);
            }
            if self.data_entrada.is_not_set() {
                self.data_entrada = Set(now);
            }
        }
        self.updated_at = Set(now);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_round_trip_through_lookup() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::from_code(status.as_str()), Some(status));
            assert_eq!(status.to_string(), status.as_str());
            assert_eq!(status.to_value(), status.as_str());
        }
        assert_eq!(OrderStatus::from_code("Pronto"), None);
    }

    #[test]
    fn serde_uses_canonical_codes() {
        assert_eq!(
            serde_json::to_value(OrderStatus::AguardandoPeca).unwrap(),
            "aguardando_peca"
        );
        assert_eq!(
            serde_json::to_value(OrderPriority::Urgente).unwrap(),
            "urgente"
        );
    }

    #[test]
    fn priority_lookup_ignores_case() {
        assert_eq!(OrderPriority::from_code(" Alta "), Some(OrderPriority::Alta));
        assert_eq!(OrderPriority::from_code("máxima"), None);
    }

    #[test]
    fn only_delivered_and_cancelled_are_closed() {
        let closed: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(|s| !s.is_open())
            .collect();
        assert_eq!(closed, vec![OrderStatus::Entregue, OrderStatus::Cancelado]);
    }
}
