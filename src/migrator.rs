use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_clientes_table::Migration),
            Box::new(m20240301_000002_create_ordens_table::Migration),
            Box::new(m20240301_000003_create_ordem_children_tables::Migration),
            Box::new(m20240301_000004_create_categorias_tables::Migration),
        ]
    }
}

mod m20240301_000001_create_clientes_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_clientes_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Clientes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Clientes::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Clientes::Nome).string().not_null())
                        .col(ColumnDef::new(Clientes::Telefone).string().null())
                        .col(ColumnDef::new(Clientes::Email).string().null())
                        .col(ColumnDef::new(Clientes::Endereco).string().null())
                        .col(ColumnDef::new(Clientes::Cidade).string().null())
                        .col(
                            ColumnDef::new(Clientes::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Clientes::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_clientes_nome")
                        .table(Clientes::Table)
                        .col(Clientes::Nome)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Clientes::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Clientes {
        Table,
        Id,
        Nome,
        Telefone,
        Email,
        Endereco,
        Cidade,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000002_create_ordens_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_ordens_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Ordens::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Ordens::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Ordens::ClienteId).integer().not_null())
                        .col(ColumnDef::new(Ordens::Equipamento).string().not_null())
                        .col(ColumnDef::new(Ordens::Marca).string().null())
                        .col(ColumnDef::new(Ordens::Modelo).string().null())
                        .col(ColumnDef::new(Ordens::DefeitoRelatado).text().not_null())
                        .col(ColumnDef::new(Ordens::Diagnostico).text().null())
                        .col(ColumnDef::new(Ordens::Solucao).text().null())
                        .col(ColumnDef::new(Ordens::Observacoes).text().null())
                        .col(
                            ColumnDef::new(Ordens::Status)
                                .string_len(20)
                                .not_null()
                                .default("aguardando"),
                        )
                        .col(
                            ColumnDef::new(Ordens::Prioridade)
                                .string_len(20)
                                .not_null()
                                .default("normal"),
                        )
                        .col(ColumnDef::new(Ordens::ValorOrcamento).decimal_len(12, 2).null())
                        .col(ColumnDef::new(Ordens::ValorFinal).decimal_len(12, 2).null())
                        .col(
                            ColumnDef::new(Ordens::DataEntrada)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Ordens::DataPrevisao)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Ordens::DataConclusao)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Ordens::DataEntrega)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Ordens::TecnicoResponsavel).string().null())
                        .col(
                            ColumnDef::new(Ordens::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Ordens::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_ordens_cliente_id")
                                .from(Ordens::Table, Ordens::ClienteId)
                                .to(Clientes::Table, Clientes::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            for (name, column) in [
                ("idx_ordens_cliente_id", Ordens::ClienteId),
                ("idx_ordens_status", Ordens::Status),
                ("idx_ordens_data_entrada", Ordens::DataEntrada),
                ("idx_ordens_tecnico", Ordens::TecnicoResponsavel),
            ] {
                manager
                    .create_index(
                        Index::create()
                            .if_not_exists()
                            .name(name)
                            .table(Ordens::Table)
                            .col(column)
                            .to_owned(),
                    )
                    .await?;
            }

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Ordens::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Ordens {
        Table,
        Id,
        ClienteId,
        Equipamento,
        Marca,
        Modelo,
        DefeitoRelatado,
        Diagnostico,
        Solucao,
        Observacoes,
        Status,
        Prioridade,
        ValorOrcamento,
        ValorFinal,
        DataEntrada,
        DataPrevisao,
        DataConclusao,
        DataEntrega,
        TecnicoResponsavel,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Clientes {
        Table,
        Id,
    }
}

mod m20240301_000003_create_ordem_children_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_ordem_children_tables"
        }
    }

    fn ordem_fk(
        name: &str,
        table: impl IntoTableRef,
        column: impl IntoIden,
    ) -> ForeignKeyCreateStatement {
        ForeignKey::create()
            .name(name)
            .from(table, column)
            .to(Ordens::Table, Ordens::Id)
            .on_delete(ForeignKeyAction::Cascade)
            .on_update(ForeignKeyAction::Cascade)
            .to_owned()
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(OrdemPecas::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrdemPecas::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(OrdemPecas::OrdemId).integer().not_null())
                        .col(ColumnDef::new(OrdemPecas::NomePeca).string().not_null())
                        .col(ColumnDef::new(OrdemPecas::CodigoPeca).string().null())
                        .col(
                            ColumnDef::new(OrdemPecas::Quantidade)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(ColumnDef::new(OrdemPecas::ValorUnitario).decimal_len(12, 2).null())
                        .col(
                            ColumnDef::new(OrdemPecas::ValorTotal)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(OrdemPecas::Fornecedor).string().null())
                        .col(ColumnDef::new(OrdemPecas::Observacoes).text().null())
                        .col(
                            ColumnDef::new(OrdemPecas::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(&mut ordem_fk(
                            "fk_ordem_pecas_ordem_id",
                            OrdemPecas::Table,
                            OrdemPecas::OrdemId,
                        ))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrdemServicos::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrdemServicos::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(OrdemServicos::OrdemId).integer().not_null())
                        .col(
                            ColumnDef::new(OrdemServicos::DescricaoServico)
                                .text()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrdemServicos::TempoGasto).decimal_len(8, 2).null())
                        .col(
                            ColumnDef::new(OrdemServicos::ValorServico)
                                .decimal_len(12, 2)
                                .null(),
                        )
                        .col(ColumnDef::new(OrdemServicos::Tecnico).string().null())
                        .col(ColumnDef::new(OrdemServicos::Observacoes).text().null())
                        .col(
                            ColumnDef::new(OrdemServicos::DataExecucao)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(&mut ordem_fk(
                            "fk_ordem_servicos_ordem_id",
                            OrdemServicos::Table,
                            OrdemServicos::OrdemId,
                        ))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrdemFotos::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrdemFotos::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(OrdemFotos::OrdemId).integer().not_null())
                        .col(ColumnDef::new(OrdemFotos::NomeArquivo).string().not_null())
                        .col(ColumnDef::new(OrdemFotos::Caminho).string().not_null())
                        .col(
                            ColumnDef::new(OrdemFotos::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(&mut ordem_fk(
                            "fk_ordem_fotos_ordem_id",
                            OrdemFotos::Table,
                            OrdemFotos::OrdemId,
                        ))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrdemHistorico::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrdemHistorico::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(OrdemHistorico::OrdemId).integer().not_null())
                        .col(
                            ColumnDef::new(OrdemHistorico::StatusAnterior)
                                .string_len(20)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(OrdemHistorico::StatusNovo)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrdemHistorico::Observacoes).text().null())
                        .col(
                            ColumnDef::new(OrdemHistorico::Usuario)
                                .string()
                                .not_null()
                                .default("Sistema"),
                        )
                        .col(
                            ColumnDef::new(OrdemHistorico::DataAlteracao)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(&mut ordem_fk(
                            "fk_ordem_historico_ordem_id",
                            OrdemHistorico::Table,
                            OrdemHistorico::OrdemId,
                        ))
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_ordem_pecas_ordem_id")
                        .table(OrdemPecas::Table)
                        .col(OrdemPecas::OrdemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_ordem_servicos_ordem_id")
                        .table(OrdemServicos::Table)
                        .col(OrdemServicos::OrdemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_ordem_fotos_ordem_id")
                        .table(OrdemFotos::Table)
                        .col(OrdemFotos::OrdemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_ordem_historico_ordem_id")
                        .table(OrdemHistorico::Table)
                        .col(OrdemHistorico::OrdemId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrdemHistorico::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(OrdemFotos::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(OrdemServicos::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(OrdemPecas::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Ordens {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    pub enum OrdemPecas {
        Table,
        Id,
        OrdemId,
        NomePeca,
        CodigoPeca,
        Quantidade,
        ValorUnitario,
        ValorTotal,
        Fornecedor,
        Observacoes,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub enum OrdemServicos {
        Table,
        Id,
        OrdemId,
        DescricaoServico,
        TempoGasto,
        ValorServico,
        Tecnico,
        Observacoes,
        DataExecucao,
    }

    #[derive(DeriveIden)]
    pub enum OrdemFotos {
        Table,
        Id,
        OrdemId,
        NomeArquivo,
        Caminho,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub enum OrdemHistorico {
        Table,
        Id,
        OrdemId,
        StatusAnterior,
        StatusNovo,
        Observacoes,
        Usuario,
        DataAlteracao,
    }
}

mod m20240301_000004_create_categorias_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_categorias_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Categorias::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Categorias::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Categorias::Nome)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Categorias::Descricao).text().null())
                        .col(ColumnDef::new(Categorias::Icone).string().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CategoriasFinanceiras::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CategoriasFinanceiras::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(CategoriasFinanceiras::Nome)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(CategoriasFinanceiras::Descricao).text().null())
                        .col(
                            ColumnDef::new(CategoriasFinanceiras::Tipo)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(ColumnDef::new(CategoriasFinanceiras::Icone).string().null())
                        .col(ColumnDef::new(CategoriasFinanceiras::Cor).string().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CategoriasFinanceiras::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Categorias::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Categorias {
        Table,
        Id,
        Nome,
        Descricao,
        Icone,
    }

    #[derive(DeriveIden)]
    pub enum CategoriasFinanceiras {
        Table,
        Id,
        Nome,
        Descricao,
        Tipo,
        Icone,
        Cor,
    }
}
