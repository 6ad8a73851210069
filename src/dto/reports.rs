use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entities::{OrderPriority, OrderStatus};

/// Dashboard payload of `GET /ordens/stats`
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardStats {
    pub totais: DashboardTotals,
    pub breakdown: DashboardBreakdown,
    #[serde(rename = "ordensRecentes")]
    pub ordens_recentes: Vec<RecentOrder>,
    #[serde(rename = "tecnicosAtivos")]
    pub tecnicos_ativos: Vec<TechnicianActivity>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardTotals {
    /// All orders ever registered
    pub ordens: u64,
    /// All registered clients
    pub clientes: u64,
    /// Final value of this month's orders, cancelled ones excluded
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub faturamento: Decimal,
    /// Final value of this month's delivered orders
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub faturamento_entregue: Decimal,
    /// Budget of this month's orders not yet delivered or cancelled
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub faturamento_pendente: Decimal,
    pub resumo_dia: DailySummary,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DailySummary {
    pub data: NaiveDate,
    /// Orders received today
    pub ordens_abertas: u64,
    /// Orders delivered today
    pub ordens_entregues: u64,
    /// Final value of orders delivered today
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub faturamento: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardBreakdown {
    /// One entry per status, in fixed order, zero-filled
    pub status: Vec<StatusCount>,
    pub prioridade: Vec<PriorityCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PriorityCount {
    pub prioridade: OrderPriority,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecentOrder {
    pub id: i32,
    pub equipamento: String,
    pub status: OrderStatus,
    pub prioridade: OrderPriority,
    pub data_entrada: DateTime<Utc>,
    pub cliente_nome: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TechnicianActivity {
    pub tecnico: String,
    pub total: u64,
}

/// Filters of `GET /ordens/relatorio`, echoed back in the response.
#[derive(Debug, Clone, Default, Deserialize, Serialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// First entry day, `YYYY-MM-DD`
    pub data_inicio: Option<String>,
    /// Last entry day, `YYYY-MM-DD`, inclusive
    pub data_fim: Option<String>,
    /// Exact status code
    pub status: Option<String>,
    /// Case-insensitive substring of the responsible technician
    pub tecnico: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReportItem {
    pub id: i32,
    pub equipamento: String,
    pub marca: Option<String>,
    pub modelo: Option<String>,
    pub defeito: String,
    pub diagnostico: Option<String>,
    pub solucao: Option<String>,
    pub status: OrderStatus,
    pub prioridade: OrderPriority,
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub valor_orcamento: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub valor_final: Option<Decimal>,
    pub data_entrada: DateTime<Utc>,
    pub data_finalizacao: Option<DateTime<Utc>>,
    pub tecnico_responsavel: Option<String>,
    pub cliente_nome: Option<String>,
    pub cliente_telefone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct ReportTotals {
    pub quantidade: u64,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub valor_orcamento: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub valor_final: Decimal,
    pub por_status: BTreeMap<String, u64>,
}

impl ReportTotals {
    /// Folds the totals of the returned rows.
    pub fn from_items(items: &[ReportItem]) -> Self {
        items.iter().fold(Self::default(), |mut totals, item| {
            totals.quantidade += 1;
            totals.valor_orcamento += item.valor_orcamento.unwrap_or_default();
            totals.valor_final += item.valor_final.unwrap_or_default();
            *totals
                .por_status
                .entry(item.status.as_str().to_string())
                .or_insert(0) += 1;
            totals
        })
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderReport {
    pub ordens: Vec<ReportItem>,
    pub totais: ReportTotals,
    pub filtros: ReportQuery,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(status: OrderStatus, orcamento: Option<Decimal>, final_: Option<Decimal>) -> ReportItem {
        ReportItem {
            id: 1,
            equipamento: "Notebook".into(),
            marca: None,
            modelo: None,
            defeito: "não liga".into(),
            diagnostico: None,
            solucao: None,
            status,
            prioridade: OrderPriority::Normal,
            valor_orcamento: orcamento,
            valor_final: final_,
            data_entrada: Utc::now(),
            data_finalizacao: None,
            tecnico_responsavel: None,
            cliente_nome: None,
            cliente_telefone: None,
        }
    }

    #[test]
    fn totals_sum_values_and_group_statuses() {
        let items = vec![
            item(OrderStatus::Pronto, Some(dec!(100)), Some(dec!(90))),
            item(OrderStatus::Pronto, None, Some(dec!(10.5))),
            item(OrderStatus::Entregue, Some(dec!(50)), None),
        ];

        let totals = ReportTotals::from_items(&items);
        assert_eq!(totals.quantidade, 3);
        assert_eq!(totals.valor_orcamento, dec!(150));
        assert_eq!(totals.valor_final, dec!(100.5));
        assert_eq!(totals.por_status.get("pronto"), Some(&2));
        assert_eq!(totals.por_status.get("entregue"), Some(&1));
    }

    #[test]
    fn stats_use_camel_case_collections() {
        let stats = DashboardStats {
            totais: DashboardTotals {
                ordens: 0,
                clientes: 0,
                faturamento: Decimal::ZERO,
                faturamento_entregue: Decimal::ZERO,
                faturamento_pendente: Decimal::ZERO,
                resumo_dia: DailySummary {
                    data: Utc::now().date_naive(),
                    ordens_abertas: 0,
                    ordens_entregues: 0,
                    faturamento: Decimal::ZERO,
                },
            },
            breakdown: DashboardBreakdown {
                status: vec![],
                prioridade: vec![],
            },
            ordens_recentes: vec![],
            tecnicos_ativos: vec![],
        };

        let value = serde_json::to_value(&stats).unwrap();
        assert!(value.get("ordensRecentes").is_some());
        assert!(value.get("tecnicosAtivos").is_some());
        assert_eq!(value["totais"]["faturamento"], 0.0);
    }
}
