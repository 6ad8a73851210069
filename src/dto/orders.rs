use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;
use utoipa::{IntoParams, ToSchema};

use crate::entities::{
    ordem, ordem_foto, ordem_historico, ordem_peca, ordem_servico, OrderPriority, OrderStatus,
};

/// Raw request fields, from a JSON object or the text parts of a multipart form.
pub type FieldMap = Map<String, Value>;

/// A part line as accepted from clients.
#[derive(Debug, Clone, PartialEq)]
pub struct PartInput {
    pub nome_peca: String,
    pub codigo_peca: Option<String>,
    pub quantidade: i32,
    pub valor_unitario: Option<Decimal>,
    pub fornecedor: Option<String>,
    pub observacoes: Option<String>,
}

impl PartInput {
    /// `None` for lines without a part name.
    pub fn from_fields(fields: &FieldMap) -> Option<Self> {
        Some(Self {
            nome_peca: trimmed(fields, "nome_peca")?,
            codigo_peca: trimmed(fields, "codigo_peca"),
            quantidade: fields
                .get("quantidade")
                .and_then(parse_integer)
                .filter(|q| *q > 0)
                .and_then(|q| i32::try_from(q).ok())
                .unwrap_or(1),
            valor_unitario: fields.get("valor_unitario").and_then(parse_decimal),
            fornecedor: trimmed(fields, "fornecedor"),
            observacoes: trimmed(fields, "observacoes"),
        })
    }

    /// Line total; a missing unit value counts as zero.
    pub fn valor_total(&self) -> Decimal {
        Decimal::from(self.quantidade) * self.valor_unitario.unwrap_or(Decimal::ZERO)
    }
}

/// A labor line as accepted from clients.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceLineInput {
    pub descricao_servico: String,
    pub tempo_gasto: Option<Decimal>,
    pub valor_servico: Option<Decimal>,
    pub tecnico: Option<String>,
    pub observacoes: Option<String>,
}

impl ServiceLineInput {
    /// `None` for lines without a description.
    pub fn from_fields(fields: &FieldMap) -> Option<Self> {
        Some(Self {
            descricao_servico: trimmed(fields, "descricao_servico")?,
            tempo_gasto: fields.get("tempo_gasto").and_then(parse_decimal),
            valor_servico: fields.get("valor_servico").and_then(parse_decimal),
            tecnico: trimmed(fields, "tecnico"),
            observacoes: trimmed(fields, "observacoes"),
        })
    }
}

/// Order payload for create and update, parsed once at the request boundary.
///
/// Text fields are trimmed with blanks mapped to `None`; numbers and dates
/// are accepted either as JSON values or as form strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderInput {
    /// Client reference exactly as sent, validated by the service
    pub cliente_id: Option<String>,
    pub equipamento: Option<String>,
    pub marca: Option<String>,
    pub modelo: Option<String>,
    pub defeito: Option<String>,
    pub diagnostico: Option<String>,
    pub solucao: Option<String>,
    pub observacoes: Option<String>,
    pub tecnico_responsavel: Option<String>,
    /// Status label before normalization
    pub status: Option<String>,
    pub prioridade: Option<String>,
    pub valor_orcamento: Option<Decimal>,
    pub valor_final: Option<Decimal>,
    pub data_previsao: Option<DateTime<Utc>>,
    pub data_conclusao: Option<DateTime<Utc>>,
    pub data_entrega: Option<DateTime<Utc>>,
    pub pecas: Vec<PartInput>,
    pub servicos: Vec<ServiceLineInput>,
}

impl OrderInput {
    pub fn from_fields(fields: &FieldMap) -> Self {
        Self {
            cliente_id: trimmed(fields, "cliente_id"),
            equipamento: trimmed(fields, "equipamento"),
            marca: trimmed(fields, "marca"),
            modelo: trimmed(fields, "modelo"),
            defeito: trimmed(fields, "defeito").or_else(|| trimmed(fields, "defeito_relatado")),
            diagnostico: trimmed(fields, "diagnostico"),
            solucao: trimmed(fields, "solucao"),
            observacoes: trimmed(fields, "observacoes"),
            tecnico_responsavel: trimmed(fields, "tecnico_responsavel"),
            status: trimmed(fields, "status"),
            prioridade: trimmed(fields, "prioridade"),
            valor_orcamento: fields.get("valor_orcamento").and_then(parse_decimal),
            valor_final: fields.get("valor_final").and_then(parse_decimal),
            data_previsao: fields.get("data_previsao").and_then(parse_datetime),
            data_conclusao: fields.get("data_conclusao").and_then(parse_datetime),
            data_entrega: fields.get("data_entrega").and_then(parse_datetime),
            pecas: line_items(fields, "pecas")
                .iter()
                .filter_map(PartInput::from_fields)
                .collect(),
            servicos: line_items(fields, "servicos")
                .iter()
                .filter_map(ServiceLineInput::from_fields)
                .collect(),
        }
    }
}

/// Body of `PATCH /ordens/:id/status`
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StatusChangeRequest {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub observacoes: Option<String>,
}

/// Filters accepted by `GET /ordens`. Every value arrives as text so that
/// blank parameters can be ignored instead of rejected.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    /// Exact status code
    pub status: Option<String>,
    /// Exact client id
    pub cliente_id: Option<String>,
    /// Exact priority code
    pub prioridade: Option<String>,
    /// Case-insensitive substring of the responsible technician
    pub tecnico: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Order row joined with its client, returned by create and update.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderWithClient {
    #[serde(flatten)]
    pub ordem: ordem::Model,
    pub cliente_nome: Option<String>,
    pub cliente_telefone: Option<String>,
}

/// Order as listed, with defaults filled in and client fields flattened.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderSummary {
    pub id: i32,
    pub cliente_id: i32,
    pub equipamento: String,
    pub marca: Option<String>,
    pub modelo: String,
    pub defeito: String,
    pub diagnostico: Option<String>,
    pub solucao: Option<String>,
    pub observacoes: String,
    pub status: OrderStatus,
    pub prioridade: OrderPriority,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub valor_orcamento: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub valor_final: Decimal,
    pub data_entrada: DateTime<Utc>,
    pub data_previsao: Option<DateTime<Utc>>,
    pub data_conclusao: Option<DateTime<Utc>>,
    pub data_entrega: Option<DateTime<Utc>>,
    pub tecnico_responsavel: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cliente_nome: Option<String>,
    pub cliente_telefone: Option<String>,
    pub cliente_email: Option<String>,
}

impl OrderSummary {
    pub fn new(
        ordem: ordem::Model,
        cliente: Option<&crate::entities::cliente::Model>,
    ) -> Self {
        Self {
            id: ordem.id,
            cliente_id: ordem.cliente_id,
            equipamento: ordem.equipamento,
            marca: ordem.marca,
            modelo: ordem.modelo.unwrap_or_default(),
            defeito: ordem.defeito_relatado,
            diagnostico: ordem.diagnostico,
            solucao: ordem.solucao,
            observacoes: ordem.observacoes.unwrap_or_default(),
            status: ordem.status,
            prioridade: ordem.prioridade,
            valor_orcamento: ordem.valor_orcamento.unwrap_or_default(),
            valor_final: ordem.valor_final.unwrap_or_default(),
            data_entrada: ordem.data_entrada,
            data_previsao: ordem.data_previsao,
            data_conclusao: ordem.data_conclusao,
            data_entrega: ordem.data_entrega,
            tecnico_responsavel: ordem.tecnico_responsavel.unwrap_or_default(),
            created_at: ordem.created_at,
            updated_at: ordem.updated_at,
            cliente_nome: cliente.map(|c| c.nome.clone()),
            cliente_telefone: cliente.and_then(|c| c.telefone.clone()),
            cliente_email: cliente.and_then(|c| c.email.clone()),
        }
    }
}

/// Single order with every related collection.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub ordem: OrderSummary,
    pub cliente_endereco: Option<String>,
    pub cliente_cidade: Option<String>,
    /// Oldest first
    pub fotos: Vec<ordem_foto::Model>,
    /// Oldest first
    pub pecas: Vec<ordem_peca::Model>,
    /// By execution date
    pub servicos: Vec<ordem_servico::Model>,
    /// Newest first
    pub historico: Vec<ordem_historico::Model>,
}

/// Photo row as returned by the upload endpoint
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UploadedPhoto {
    pub id: i32,
    pub nome_arquivo: String,
    pub caminho: String,
}

impl From<ordem_foto::Model> for UploadedPhoto {
    fn from(model: ordem_foto::Model) -> Self {
        Self {
            id: model.id,
            nome_arquivo: model.nome_arquivo,
            caminho: model.caminho,
        }
    }
}

/// Text view of a field: strings as-is, numbers and booleans rendered.
pub fn text(fields: &FieldMap, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Like [`text`], trimmed and with blanks mapped to `None`.
pub fn trimmed(fields: &FieldMap, key: &str) -> Option<String> {
    text(fields, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn parse_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            Decimal::from_str(&s.replace(',', ".")).ok()
        }
        _ => None,
    }
}

pub fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.trunc() as i64))
        }
        _ => None,
    }
}

/// Accepts RFC 3339 timestamps, `datetime-local` values and plain dates.
pub fn parse_datetime(value: &Value) -> Option<DateTime<Utc>> {
    let raw = value.as_str()?.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Line items sent either as a JSON array or as a JSON-encoded string.
/// Malformed input degrades to an empty list.
fn line_items(fields: &FieldMap, key: &str) -> Vec<FieldMap> {
    let items = match fields.get(key) {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(Value::String(raw)) if raw.trim().is_empty() => return Vec::new(),
        Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(items)) => items,
            Ok(_) => {
                warn!(field = key, "Line items are not a list, ignoring");
                return Vec::new();
            }
            Err(e) => {
                warn!(field = key, error = %e, "Malformed line items, ignoring");
                return Vec::new();
            }
        },
        Some(_) => {
            warn!(field = key, "Unexpected line items shape, ignoring");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect()
}
