use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use tracing::{error, info, instrument};

use crate::{
    db::DbPool,
    entities::{categoria, categoria_financeira, categoria_financeira::TipoCategoria},
    errors::ServiceError,
};

struct StockCategory {
    nome: &'static str,
    descricao: &'static str,
    icone: &'static str,
}

struct FinancialCategory {
    nome: &'static str,
    descricao: &'static str,
    tipo: TipoCategoria,
    icone: &'static str,
    cor: &'static str,
}

const STOCK_CATEGORIES: &[StockCategory] = &[
    StockCategory { nome: "Displays", descricao: "Telas e displays para smartphones", icone: "📱" },
    StockCategory { nome: "Baterias", descricao: "Baterias para celulares e tablets", icone: "🔋" },
    StockCategory { nome: "Conectores", descricao: "Conectores de carga e fones", icone: "🔌" },
    StockCategory { nome: "Placas", descricao: "Placas-mãe e componentes eletrônicos", icone: "🔧" },
    StockCategory { nome: "Capas", descricao: "Capas e películas protetoras", icone: "🛡️" },
    StockCategory { nome: "Fones", descricao: "Fones de ouvido e acessórios de áudio", icone: "🎧" },
    StockCategory { nome: "Carregadores", descricao: "Carregadores e cabos USB", icone: "⚡" },
    StockCategory { nome: "Ferramentas", descricao: "Ferramentas para reparo", icone: "🔨" },
];

const FINANCIAL_CATEGORIES: &[FinancialCategory] = &[
    FinancialCategory {
        nome: "Vendas de Produtos",
        descricao: "Receitas com vendas de acessórios e peças",
        tipo: TipoCategoria::Receita,
        icone: "🛒",
        cor: "#10b981",
    },
    FinancialCategory {
        nome: "Serviços Técnicos",
        descricao: "Receitas com reparos e consertos",
        tipo: TipoCategoria::Receita,
        icone: "🔧",
        cor: "#3b82f6",
    },
    FinancialCategory {
        nome: "Outras Receitas",
        descricao: "Outras entradas financeiras",
        tipo: TipoCategoria::Receita,
        icone: "💰",
        cor: "#8b5cf6",
    },
    FinancialCategory {
        nome: "Compra de Estoque",
        descricao: "Gastos com aquisição de produtos e peças",
        tipo: TipoCategoria::Despesa,
        icone: "📦",
        cor: "#f59e0b",
    },
    FinancialCategory {
        nome: "Aluguel",
        descricao: "Aluguel do estabelecimento",
        tipo: TipoCategoria::Despesa,
        icone: "🏠",
        cor: "#ef4444",
    },
    FinancialCategory {
        nome: "Energia Elétrica",
        descricao: "Conta de energia elétrica",
        tipo: TipoCategoria::Despesa,
        icone: "⚡",
        cor: "#f97316",
    },
    FinancialCategory {
        nome: "Internet/Telefone",
        descricao: "Serviços de comunicação",
        tipo: TipoCategoria::Despesa,
        icone: "📞",
        cor: "#06b6d4",
    },
    FinancialCategory {
        nome: "Ferramentas",
        descricao: "Aquisição de ferramentas e equipamentos",
        tipo: TipoCategoria::Despesa,
        icone: "🔨",
        cor: "#64748b",
    },
    FinancialCategory {
        nome: "Marketing",
        descricao: "Gastos com propaganda e marketing",
        tipo: TipoCategoria::Despesa,
        icone: "📢",
        cor: "#ec4899",
    },
    FinancialCategory {
        nome: "Outras Despesas",
        descricao: "Outras saídas financeiras",
        tipo: TipoCategoria::Despesa,
        icone: "💸",
        cor: "#6b7280",
    },
];

/// Number of rows inserted by one seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub categorias: usize,
    pub financeiras: usize,
}

/// Stock and financial categories.
#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DbPool>,
}

impl CategoryService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Inserts the initial categories whose name is not taken yet.
    /// Running it again inserts nothing.
    #[instrument(skip(self))]
    pub async fn seed_initial_data(&self) -> Result<SeedReport, ServiceError> {
        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for category seeding");
            ServiceError::DatabaseError(e)
        })?;
        let mut report = SeedReport::default();

        for item in STOCK_CATEGORIES {
            let exists = categoria::Entity::find()
                .filter(categoria::Column::Nome.eq(item.nome))
                .count(&txn)
                .await?
                > 0;
            if exists {
                continue;
            }
            categoria::ActiveModel {
                nome: Set(item.nome.to_string()),
                descricao: Set(Some(item.descricao.to_string())),
                icone: Set(Some(item.icone.to_string())),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            report.categorias += 1;
        }

        for item in FINANCIAL_CATEGORIES {
            let exists = categoria_financeira::Entity::find()
                .filter(categoria_financeira::Column::Nome.eq(item.nome))
                .count(&txn)
                .await?
                > 0;
            if exists {
                continue;
            }
            categoria_financeira::ActiveModel {
                nome: Set(item.nome.to_string()),
                descricao: Set(Some(item.descricao.to_string())),
                tipo: Set(item.tipo.clone()),
                icone: Set(Some(item.icone.to_string())),
                cor: Set(Some(item.cor.to_string())),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            report.financeiras += 1;
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit category seeding");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            categorias = report.categorias,
            financeiras = report.financeiras,
            "Initial categories seeded"
        );
        Ok(report)
    }

    pub async fn list_categories(&self) -> Result<Vec<categoria::Model>, ServiceError> {
        Ok(categoria::Entity::find()
            .order_by_asc(categoria::Column::Nome)
            .all(&*self.db)
            .await?)
    }

    /// Financial categories, revenue first.
    pub async fn list_financial_categories(
        &self,
    ) -> Result<Vec<categoria_financeira::Model>, ServiceError> {
        Ok(categoria_financeira::Entity::find()
            .order_by_desc(categoria_financeira::Column::Tipo)
            .order_by_asc(categoria_financeira::Column::Nome)
            .all(&*self.db)
            .await?)
    }
}
