use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DbErr, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use tracing::{error, instrument};

use crate::{
    db::DbPool,
    dto::reports::{
        DailySummary, DashboardBreakdown, DashboardStats, DashboardTotals, OrderReport,
        PriorityCount, RecentOrder, ReportItem, ReportQuery, ReportTotals, StatusCount,
        TechnicianActivity,
    },
    entities::{cliente, ordem, OrderPriority, OrderStatus},
    errors::ServiceError,
    services::orders::technician_matches,
    services::status::normalize_status,
};

const RECENT_ORDERS: u64 = 10;
const ACTIVE_TECHNICIANS: u64 = 5;

fn db_error(action: &'static str) -> impl Fn(DbErr) -> ServiceError {
    move |e| {
        error!(error = %e, action, "Dashboard query failed");
        ServiceError::DatabaseError(e)
    }
}

#[derive(Debug, FromQueryResult)]
struct GroupCount {
    key: Option<String>,
    total: i64,
}

/// Money columns of one order, folded in-process.
#[derive(Debug, FromQueryResult)]
struct OrderValues {
    status: OrderStatus,
    valor_orcamento: Option<Decimal>,
    valor_final: Option<Decimal>,
}

/// Half-open UTC range `[start, end)` covering one calendar day.
fn day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.from_utc_datetime(&day.and_time(chrono::NaiveTime::MIN));
    (start, start + Duration::days(1))
}

fn month_start(today: NaiveDate) -> DateTime<Utc> {
    let first = today.with_day(1).unwrap_or(today);
    day_bounds(first).0
}

fn parse_report_day(raw: &Option<String>) -> Result<Option<NaiveDate>, ServiceError> {
    match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ServiceError::validation("Data inválida")),
    }
}

/// Zero-filled counts in the fixed status order.
fn status_breakdown(rows: &[GroupCount]) -> Vec<StatusCount> {
    let counts: HashMap<&str, u64> = rows
        .iter()
        .filter_map(|row| Some((row.key.as_deref()?, row.total.max(0) as u64)))
        .collect();
    OrderStatus::ALL
        .iter()
        .map(|status| StatusCount {
            status: *status,
            total: counts.get(status.as_str()).copied().unwrap_or(0),
        })
        .collect()
}

fn priority_breakdown(rows: Vec<GroupCount>) -> Vec<PriorityCount> {
    let mut counts: Vec<PriorityCount> = rows
        .into_iter()
        .map(|row| PriorityCount {
            prioridade: row
                .key
                .as_deref()
                .and_then(OrderPriority::from_code)
                .unwrap_or_default(),
            total: row.total.max(0) as u64,
        })
        .collect();
    counts.sort_by_key(|c| {
        OrderPriority::ALL
            .iter()
            .position(|p| *p == c.prioridade)
            .unwrap_or(usize::MAX)
    });
    counts.dedup_by(|next, kept| {
        if next.prioridade == kept.prioridade {
            kept.total += next.total;
            true
        } else {
            false
        }
    });
    counts
}

struct MonthRevenue {
    faturamento: Decimal,
    entregue: Decimal,
    pendente: Decimal,
}

fn month_revenue(rows: &[OrderValues]) -> MonthRevenue {
    rows.iter().fold(
        MonthRevenue {
            faturamento: Decimal::ZERO,
            entregue: Decimal::ZERO,
            pendente: Decimal::ZERO,
        },
        |mut acc, row| {
            let final_value = row.valor_final.unwrap_or_default();
            if row.status != OrderStatus::Cancelado {
                acc.faturamento += final_value;
            }
            if row.status == OrderStatus::Entregue {
                acc.entregue += final_value;
            }
            if row.status.is_open() {
                acc.pendente += row.valor_orcamento.unwrap_or_default();
            }
            acc
        },
    )
}

/// Read-only aggregates over orders: dashboard stats and the period report.
#[derive(Clone)]
pub struct DashboardService {
    db: Arc<DbPool>,
}

impl DashboardService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Month-to-date and same-day figures, computed at `now`.
    #[instrument(skip(self))]
    pub async fn stats_at(&self, now: DateTime<Utc>) -> Result<DashboardStats, ServiceError> {
        let db = &*self.db;
        let today = now.date_naive();
        let desde = month_start(today);
        let (dia_inicio, dia_fim) = day_bounds(today);

        let month_orders = || ordem::Entity::find().filter(ordem::Column::DataEntrada.gte(desde));

        let (
            total_ordens,
            total_clientes,
            status_rows,
            priority_rows,
            month_values,
            abertas_hoje,
            entregues_hoje,
            recentes,
            tecnicos,
        ) = tokio::try_join!(
            ordem::Entity::find().count(db),
            cliente::Entity::find().count(db),
            month_orders()
                .select_only()
                .column_as(ordem::Column::Status, "key")
                .column_as(Expr::col(ordem::Column::Id).count(), "total")
                .group_by(ordem::Column::Status)
                .into_model::<GroupCount>()
                .all(db),
            month_orders()
                .select_only()
                .column_as(ordem::Column::Prioridade, "key")
                .column_as(Expr::col(ordem::Column::Id).count(), "total")
                .group_by(ordem::Column::Prioridade)
                .into_model::<GroupCount>()
                .all(db),
            month_orders()
                .select_only()
                .column(ordem::Column::Status)
                .column(ordem::Column::ValorOrcamento)
                .column(ordem::Column::ValorFinal)
                .into_model::<OrderValues>()
                .all(db),
            ordem::Entity::find()
                .filter(ordem::Column::DataEntrada.gte(dia_inicio))
                .filter(ordem::Column::DataEntrada.lt(dia_fim))
                .count(db),
            ordem::Entity::find()
                .filter(ordem::Column::Status.eq(OrderStatus::Entregue))
                .filter(ordem::Column::DataEntrega.gte(dia_inicio))
                .filter(ordem::Column::DataEntrega.lt(dia_fim))
                .select_only()
                .column(ordem::Column::Status)
                .column(ordem::Column::ValorOrcamento)
                .column(ordem::Column::ValorFinal)
                .into_model::<OrderValues>()
                .all(db),
            ordem::Entity::find()
                .find_also_related(cliente::Entity)
                .order_by_desc(ordem::Column::DataEntrada)
                .order_by_desc(ordem::Column::Id)
                .limit(RECENT_ORDERS)
                .all(db),
            month_orders()
                .filter(ordem::Column::TecnicoResponsavel.is_not_null())
                .filter(ordem::Column::TecnicoResponsavel.ne(""))
                .select_only()
                .column_as(ordem::Column::TecnicoResponsavel, "key")
                .column_as(Expr::col(ordem::Column::Id).count(), "total")
                .group_by(ordem::Column::TecnicoResponsavel)
                .order_by_desc(Expr::col(ordem::Column::Id).count())
                .order_by_asc(ordem::Column::TecnicoResponsavel)
                .limit(ACTIVE_TECHNICIANS)
                .into_model::<GroupCount>()
                .all(db),
        )
        .map_err(db_error("compute dashboard stats"))?;

        let revenue = month_revenue(&month_values);

        Ok(DashboardStats {
            totais: DashboardTotals {
                ordens: total_ordens,
                clientes: total_clientes,
                faturamento: revenue.faturamento,
                faturamento_entregue: revenue.entregue,
                faturamento_pendente: revenue.pendente,
                resumo_dia: DailySummary {
                    data: today,
                    ordens_abertas: abertas_hoje,
                    ordens_entregues: entregues_hoje.len() as u64,
                    faturamento: entregues_hoje
                        .iter()
                        .map(|row| row.valor_final.unwrap_or_default())
                        .sum(),
                },
            },
            breakdown: DashboardBreakdown {
                status: status_breakdown(&status_rows),
                prioridade: priority_breakdown(priority_rows),
            },
            ordens_recentes: recentes
                .into_iter()
                .map(|(ordem, cliente)| RecentOrder {
                    id: ordem.id,
                    equipamento: ordem.equipamento,
                    status: ordem.status,
                    prioridade: ordem.prioridade,
                    data_entrada: ordem.data_entrada,
                    cliente_nome: cliente.map(|c| c.nome),
                })
                .collect(),
            tecnicos_ativos: tecnicos
                .into_iter()
                .filter_map(|row| {
                    Some(TechnicianActivity {
                        tecnico: row.key?,
                        total: row.total.max(0) as u64,
                    })
                })
                .collect(),
        })
    }

    pub async fn stats(&self) -> Result<DashboardStats, ServiceError> {
        self.stats_at(Utc::now()).await
    }

    /// Orders matching the period filters, newest first, with totals over
    /// the returned rows.
    #[instrument(skip(self))]
    pub async fn report(&self, query: ReportQuery) -> Result<OrderReport, ServiceError> {
        let inicio = parse_report_day(&query.data_inicio)?;
        let fim = parse_report_day(&query.data_fim)?;

        let mut select = ordem::Entity::find();
        if let Some(day) = inicio {
            select = select.filter(ordem::Column::DataEntrada.gte(day_bounds(day).0));
        }
        if let Some(day) = fim {
            select = select.filter(ordem::Column::DataEntrada.lt(day_bounds(day).1));
        }
        if let Some(status) = query
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            select = select.filter(ordem::Column::Status.eq(normalize_status(status)));
        }
        if let Some(tecnico) = query
            .tecnico
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            select = select.filter(technician_matches(tecnico));
        }

        let rows = select
            .find_also_related(cliente::Entity)
            .order_by_desc(ordem::Column::DataEntrada)
            .order_by_desc(ordem::Column::Id)
            .all(&*self.db)
            .await
            .map_err(db_error("build order report"))?;

        let ordens: Vec<ReportItem> = rows
            .into_iter()
            .map(|(ordem, cliente)| ReportItem {
                id: ordem.id,
                equipamento: ordem.equipamento,
                marca: ordem.marca,
                modelo: ordem.modelo,
                defeito: ordem.defeito_relatado,
                diagnostico: ordem.diagnostico,
                solucao: ordem.solucao,
                status: ordem.status,
                prioridade: ordem.prioridade,
                valor_orcamento: ordem.valor_orcamento,
                valor_final: ordem.valor_final,
                data_entrada: ordem.data_entrada,
                data_finalizacao: ordem.data_conclusao,
                tecnico_responsavel: ordem.tecnico_responsavel,
                cliente_nome: cliente.as_ref().map(|c| c.nome.clone()),
                cliente_telefone: cliente.and_then(|c| c.telefone),
            })
            .collect();

        let totais = ReportTotals::from_items(&ordens);
        Ok(OrderReport {
            ordens,
            totais,
            filtros: query,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn group(key: &str, total: i64) -> GroupCount {
        GroupCount {
            key: Some(key.to_string()),
            total,
        }
    }

    #[test]
    fn status_breakdown_is_fixed_and_zero_filled() {
        let breakdown = status_breakdown(&[group("pronto", 3), group("aguardando", 1)]);
        let totals: Vec<(&str, u64)> = breakdown
            .iter()
            .map(|c| (c.status.as_str(), c.total))
            .collect();
        assert_eq!(
            totals,
            vec![
                ("aguardando", 1),
                ("em_andamento", 0),
                ("aguardando_peca", 0),
                ("pronto", 3),
                ("entregue", 0),
                ("cancelado", 0),
            ]
        );
    }

    #[test]
    fn priority_breakdown_follows_priority_order() {
        let breakdown = priority_breakdown(vec![group("urgente", 2), group("baixa", 1)]);
        assert_eq!(breakdown[0].prioridade, OrderPriority::Baixa);
        assert_eq!(breakdown[1].prioridade, OrderPriority::Urgente);
    }

    #[test]
    fn month_revenue_splits_by_status() {
        let rows = vec![
            OrderValues {
                status: OrderStatus::Entregue,
                valor_orcamento: Some(dec!(100)),
                valor_final: Some(dec!(120)),
            },
            OrderValues {
                status: OrderStatus::Pronto,
                valor_orcamento: Some(dec!(80)),
                valor_final: Some(dec!(75)),
            },
            OrderValues {
                status: OrderStatus::Cancelado,
                valor_orcamento: Some(dec!(50)),
                valor_final: Some(dec!(50)),
            },
            OrderValues {
                status: OrderStatus::Aguardando,
                valor_orcamento: None,
                valor_final: None,
            },
        ];
        let revenue = month_revenue(&rows);
        assert_eq!(revenue.faturamento, dec!(195));
        assert_eq!(revenue.entregue, dec!(120));
        assert_eq!(revenue.pendente, dec!(80));
    }

    #[test]
    fn report_days_must_be_iso_dates() {
        assert_eq!(parse_report_day(&None).unwrap(), None);
        assert_eq!(parse_report_day(&Some(" ".into())).unwrap(), None);
        assert!(parse_report_day(&Some("2024-02-30".into())).is_err());
        assert_eq!(
            parse_report_day(&Some("2024-02-29".into())).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
    }

    #[test]
    fn month_starts_on_first_day_midnight() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 17).unwrap();
        assert_eq!(month_start(day).to_rfc3339(), "2024-03-01T00:00:00+00:00");
    }
}
