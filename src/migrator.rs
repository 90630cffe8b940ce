use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_catalog_tables::Migration),
            Box::new(m20250101_000002_create_fact_tables::Migration),
            Box::new(m20250101_000003_create_forecast_tables::Migration),
            Box::new(m20250101_000004_create_summary_tables::Migration),
        ]
    }
}

// Migration implementations

mod m20250101_000001_create_catalog_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000001_create_catalog_tables"
        }
    }

    /// Cached metric columns shared by products and brands.
    fn metric_col<T: IntoIden>(col: T) -> ColumnDef {
        ColumnDef::new(col).double().not_null().default(0.0).to_owned()
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Categories::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Categories::Name).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Brands::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Brands::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Brands::Name).string().not_null())
                        .col(ColumnDef::new(Brands::CategoryId).integer().null())
                        .col(metric_col(Brands::TrailingRevenue))
                        .col(metric_col(Brands::TrailingMargin))
                        .col(metric_col(Brands::TrailingMarginPct))
                        .col(metric_col(Brands::TrailingUnits))
                        .col(metric_col(Brands::TrailingStockValue))
                        .col(metric_col(Brands::StockUnits))
                        .col(metric_col(Brands::StockValue))
                        .col(metric_col(Brands::OverstockUnits))
                        .col(metric_col(Brands::OverstockValue))
                        .col(
                            ColumnDef::new(Brands::MetricsRefreshedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_brands_category_id")
                        .table(Brands::Table)
                        .col(Brands::CategoryId)
                        .to_owned(),
                )
                .await?;

            let mut groups = Table::create();
            groups
                .table(SeasonalityGroups::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(SeasonalityGroups::Id)
                        .integer()
                        .not_null()
                        .auto_increment()
                        .primary_key(),
                )
                .col(ColumnDef::new(SeasonalityGroups::Name).string().not_null());
            for month in SeasonalityGroups::MONTHS {
                groups.col(ColumnDef::new(month).double().null());
            }
            groups.col(
                ColumnDef::new(SeasonalityGroups::UpdatedAt)
                    .timestamp_with_time_zone()
                    .null(),
            );
            manager.create_table(groups.to_owned()).await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_seasonality_groups_name")
                        .table(SeasonalityGroups::Table)
                        .col(SeasonalityGroups::Name)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Products::ExternalId).string().not_null())
                        .col(ColumnDef::new(Products::Name).string().null())
                        .col(ColumnDef::new(Products::BrandId).integer().null())
                        .col(ColumnDef::new(Products::SeasonalityGroupId).integer().null())
                        .col(
                            ColumnDef::new(Products::Eol)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(metric_col(Products::TrailingRevenue))
                        .col(metric_col(Products::TrailingMargin))
                        .col(metric_col(Products::TrailingMarginPct))
                        .col(metric_col(Products::TrailingUnits))
                        .col(metric_col(Products::TrailingStockValue))
                        .col(metric_col(Products::RecentUnits))
                        .col(metric_col(Products::RecentRevenue))
                        .col(metric_col(Products::StockUnits))
                        .col(metric_col(Products::StockValue))
                        .col(metric_col(Products::OverstockUnits))
                        .col(metric_col(Products::OverstockValue))
                        .col(
                            ColumnDef::new(Products::MetricsRefreshedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_external_id")
                        .table(Products::Table)
                        .col(Products::ExternalId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_brand_id")
                        .table(Products::Table)
                        .col(Products::BrandId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_seasonality_group_id")
                        .table(Products::Table)
                        .col(Products::SeasonalityGroupId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(SeasonalityGroups::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Brands::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Categories {
        Table,
        Id,
        Name,
    }

    #[derive(DeriveIden)]
    enum Brands {
        Table,
        Id,
        Name,
        CategoryId,
        TrailingRevenue,
        TrailingMargin,
        TrailingMarginPct,
        TrailingUnits,
        TrailingStockValue,
        StockUnits,
        StockValue,
        OverstockUnits,
        OverstockValue,
        MetricsRefreshedAt,
    }

    #[derive(DeriveIden, Clone, Copy)]
    enum SeasonalityGroups {
        Table,
        Id,
        Name,
        #[sea_orm(iden = "month_01")]
        Month01,
        #[sea_orm(iden = "month_02")]
        Month02,
        #[sea_orm(iden = "month_03")]
        Month03,
        #[sea_orm(iden = "month_04")]
        Month04,
        #[sea_orm(iden = "month_05")]
        Month05,
        #[sea_orm(iden = "month_06")]
        Month06,
        #[sea_orm(iden = "month_07")]
        Month07,
        #[sea_orm(iden = "month_08")]
        Month08,
        #[sea_orm(iden = "month_09")]
        Month09,
        #[sea_orm(iden = "month_10")]
        Month10,
        #[sea_orm(iden = "month_11")]
        Month11,
        #[sea_orm(iden = "month_12")]
        Month12,
        UpdatedAt,
    }

    impl SeasonalityGroups {
        const MONTHS: [Self; 12] = [
            Self::Month01,
            Self::Month02,
            Self::Month03,
            Self::Month04,
            Self::Month05,
            Self::Month06,
            Self::Month07,
            Self::Month08,
            Self::Month09,
            Self::Month10,
            Self::Month11,
            Self::Month12,
        ];
    }

    #[derive(DeriveIden)]
    enum Products {
        Table,
        Id,
        ExternalId,
        Name,
        BrandId,
        SeasonalityGroupId,
        Eol,
        TrailingRevenue,
        TrailingMargin,
        TrailingMarginPct,
        TrailingUnits,
        TrailingStockValue,
        RecentUnits,
        RecentRevenue,
        StockUnits,
        StockValue,
        OverstockUnits,
        OverstockValue,
        MetricsRefreshedAt,
    }
}

mod m20250101_000002_create_fact_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000002_create_fact_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(FinancialFacts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(FinancialFacts::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(FinancialFacts::ProductId).integer().not_null())
                        .col(ColumnDef::new(FinancialFacts::Metric).string().not_null())
                        .col(ColumnDef::new(FinancialFacts::Month).date().not_null())
                        .col(ColumnDef::new(FinancialFacts::Value).double().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_financial_facts_month")
                        .table(FinancialFacts::Table)
                        .col(FinancialFacts::Month)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_financial_facts_product_id")
                        .table(FinancialFacts::Table)
                        .col(FinancialFacts::ProductId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockSnapshots::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockSnapshots::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        // Unmatched import rows carry no product
                        .col(ColumnDef::new(StockSnapshots::ProductId).integer().null())
                        .col(ColumnDef::new(StockSnapshots::Location).string().not_null())
                        .col(ColumnDef::new(StockSnapshots::Month).date().not_null())
                        .col(
                            ColumnDef::new(StockSnapshots::Quantity)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(StockSnapshots::UnitCost).double().null())
                        .col(
                            ColumnDef::new(StockSnapshots::Value)
                                .double()
                                .not_null()
                                .default(0.0),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_snapshots_product_month")
                        .table(StockSnapshots::Table)
                        .col(StockSnapshots::ProductId)
                        .col(StockSnapshots::Month)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockSnapshots::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(FinancialFacts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum FinancialFacts {
        Table,
        Id,
        ProductId,
        Metric,
        Month,
        Value,
    }

    #[derive(DeriveIden)]
    enum StockSnapshots {
        Table,
        Id,
        ProductId,
        Location,
        Month,
        Quantity,
        UnitCost,
        Value,
    }
}

mod m20250101_000003_create_forecast_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000003_create_forecast_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProductForecasts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductForecasts::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ProductForecasts::ProductId).integer().not_null())
                        .col(ColumnDef::new(ProductForecasts::Metric).string().not_null())
                        .col(ColumnDef::new(ProductForecasts::Month).date().not_null())
                        .col(ColumnDef::new(ProductForecasts::Value).double().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_forecasts_product_metric_month")
                        .table(ProductForecasts::Table)
                        .col(ProductForecasts::ProductId)
                        .col(ProductForecasts::Metric)
                        .col(ProductForecasts::Month)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(BrandForecasts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BrandForecasts::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(BrandForecasts::BrandId).integer().not_null())
                        .col(ColumnDef::new(BrandForecasts::Metric).string().not_null())
                        .col(ColumnDef::new(BrandForecasts::Month).date().not_null())
                        .col(ColumnDef::new(BrandForecasts::Value).double().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_brand_forecasts_brand_metric_month")
                        .table(BrandForecasts::Table)
                        .col(BrandForecasts::BrandId)
                        .col(BrandForecasts::Metric)
                        .col(BrandForecasts::Month)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(BrandForecasts::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ProductForecasts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ProductForecasts {
        Table,
        Id,
        ProductId,
        Metric,
        Month,
        Value,
    }

    #[derive(DeriveIden)]
    enum BrandForecasts {
        Table,
        Id,
        BrandId,
        Metric,
        Month,
        Value,
    }
}

mod m20250101_000004_create_summary_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000004_create_summary_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(BrandFinancialSummaries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BrandFinancialSummaries::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(BrandFinancialSummaries::BrandId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BrandFinancialSummaries::CategoryId)
                                .integer()
                                .null(),
                        )
                        .col(ColumnDef::new(BrandFinancialSummaries::Month).date().not_null())
                        .col(
                            ColumnDef::new(BrandFinancialSummaries::Metric)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BrandFinancialSummaries::TotalValue)
                                .double()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BrandFinancialSummaries::ProductCount)
                                .integer()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_brand_financial_summaries_brand_month")
                        .table(BrandFinancialSummaries::Table)
                        .col(BrandFinancialSummaries::BrandId)
                        .col(BrandFinancialSummaries::Month)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CategoryFinancialSummaries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CategoryFinancialSummaries::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(CategoryFinancialSummaries::CategoryId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CategoryFinancialSummaries::Month)
                                .date()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CategoryFinancialSummaries::Metric)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CategoryFinancialSummaries::TotalValue)
                                .double()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CategoryFinancialSummaries::BrandCount)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CategoryFinancialSummaries::ProductCount)
                                .integer()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_category_financial_summaries_category_month")
                        .table(CategoryFinancialSummaries::Table)
                        .col(CategoryFinancialSummaries::CategoryId)
                        .col(CategoryFinancialSummaries::Month)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(CategoryFinancialSummaries::Table)
                        .to_owned(),
                )
                .await?;
            manager
                .drop_table(Table::drop().table(BrandFinancialSummaries::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum BrandFinancialSummaries {
        Table,
        Id,
        BrandId,
        CategoryId,
        Month,
        Metric,
        TotalValue,
        ProductCount,
    }

    #[derive(DeriveIden)]
    enum CategoryFinancialSummaries {
        Table,
        Id,
        CategoryId,
        Month,
        Metric,
        TotalValue,
        BrandCount,
        ProductCount,
    }
}
