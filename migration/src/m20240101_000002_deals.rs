use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Deals {
    Table,
    Id,
    AccountId,
    Code,
    Biz,
    Contact,
    Email,
    Phone,
    CustPasswordHash,
    EqType,
    EqDetail,
    EqYear,
    EqMake,
    EqModel,
    EqVin,
    EqMileage,
    EqNewUsed,
    EqSerial,
    Amount,
    DealerId,
    DealerName,
    LenderId,
    Stage,
    Source,
    Notes,
    Terms,
    Disposition,
    Accepted,
    TaxChoice,
    ShowTaxChoice,
    ApprovalLetter,
    EmailConfSent,
    EmailCodeSent,
    CreditApp,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum DealHistory {
    Table,
    Id,
    DealId,
    Stage,
    Note,
    CreatedAt,
}

#[derive(DeriveIden)]
enum DealActivities {
    Table,
    Id,
    DealId,
    Type,
    Actor,
    Detail,
    CreatedAt,
}

#[derive(DeriveIden)]
enum DealDocuments {
    Table,
    Id,
    DealId,
    DocId,
    Name,
    UploadedBy,
    FileUrl,
    CreatedAt,
}

#[derive(DeriveIden)]
enum DealStips {
    Table,
    Id,
    DealId,
    Text,
    Done,
    ResolvedBy,
    FileUrl,
    Visibility,
    Category,
    Auto,
    AddedAt,
}

#[derive(DeriveIden)]
enum DealFundingItems {
    Table,
    Id,
    DealId,
    Text,
    Done,
    FileUrl,
    Category,
    Auto,
    AddedAt,
}

#[derive(DeriveIden)]
enum DealNotes {
    Table,
    Id,
    DealId,
    Text,
    Author,
    Pinned,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

// Satellites carry a plain deal_id index and no foreign key: deleting a deal is an
// explicit admin operation that removes its satellites itself.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Deals::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Deals::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Deals::AccountId).uuid())
                    .col(ColumnDef::new(Deals::Code).string_len(32))
                    .col(ColumnDef::new(Deals::Biz).string_len(256).not_null())
                    .col(ColumnDef::new(Deals::Contact).string_len(256))
                    .col(ColumnDef::new(Deals::Email).string_len(320))
                    .col(ColumnDef::new(Deals::Phone).string_len(64))
                    .col(ColumnDef::new(Deals::CustPasswordHash).string_len(256))
                    .col(ColumnDef::new(Deals::EqType).string_len(128))
                    .col(ColumnDef::new(Deals::EqDetail).text())
                    .col(ColumnDef::new(Deals::EqYear).integer())
                    .col(ColumnDef::new(Deals::EqMake).string_len(128))
                    .col(ColumnDef::new(Deals::EqModel).string_len(128))
                    .col(ColumnDef::new(Deals::EqVin).string_len(64))
                    .col(ColumnDef::new(Deals::EqMileage).integer())
                    .col(ColumnDef::new(Deals::EqNewUsed).string_len(8))
                    .col(ColumnDef::new(Deals::EqSerial).string_len(128))
                    .col(ColumnDef::new(Deals::Amount).double())
                    .col(ColumnDef::new(Deals::DealerId).uuid())
                    .col(ColumnDef::new(Deals::DealerName).string_len(256))
                    .col(ColumnDef::new(Deals::LenderId).uuid())
                    .col(ColumnDef::new(Deals::Stage).string_len(16).not_null())
                    .col(ColumnDef::new(Deals::Source).string_len(64))
                    .col(ColumnDef::new(Deals::Notes).text())
                    .col(ColumnDef::new(Deals::Terms).text())
                    .col(ColumnDef::new(Deals::Disposition).text())
                    .col(ColumnDef::new(Deals::Accepted).boolean())
                    .col(ColumnDef::new(Deals::TaxChoice).string_len(64))
                    .col(
                        ColumnDef::new(Deals::ShowTaxChoice)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Deals::ApprovalLetter).text())
                    .col(ColumnDef::new(Deals::EmailConfSent).timestamp_with_time_zone())
                    .col(ColumnDef::new(Deals::EmailCodeSent).timestamp_with_time_zone())
                    .col(ColumnDef::new(Deals::CreditApp).text())
                    .col(
                        ColumnDef::new(Deals::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Deals::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_deals_dealer", Deals::DealerId),
            ("idx_deals_lender", Deals::LenderId),
            ("idx_deals_account", Deals::AccountId),
            ("idx_deals_created", Deals::CreatedAt),
        ] {
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name(name)
                        .table(Deals::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_table(
                Table::create()
                    .table(DealHistory::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DealHistory::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(DealHistory::DealId).uuid().not_null())
                    .col(ColumnDef::new(DealHistory::Stage).string_len(16).not_null())
                    .col(ColumnDef::new(DealHistory::Note).text())
                    .col(
                        ColumnDef::new(DealHistory::CreatedAt)
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
                    .name("idx_deal_history_deal")
                    .table(DealHistory::Table)
                    .col(DealHistory::DealId)
                    .col(DealHistory::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DealActivities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DealActivities::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DealActivities::DealId).uuid().not_null())
                    .col(ColumnDef::new(DealActivities::Type).string_len(64).not_null())
                    .col(
                        ColumnDef::new(DealActivities::Actor)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(ColumnDef::new(DealActivities::Detail).text().not_null())
                    .col(
                        ColumnDef::new(DealActivities::CreatedAt)
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
                    .name("idx_deal_activities_deal")
                    .table(DealActivities::Table)
                    .col(DealActivities::DealId)
                    .col(DealActivities::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DealDocuments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DealDocuments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DealDocuments::DealId).uuid().not_null())
                    .col(ColumnDef::new(DealDocuments::DocId).string_len(128).not_null())
                    .col(ColumnDef::new(DealDocuments::Name).string_len(256).not_null())
                    .col(ColumnDef::new(DealDocuments::UploadedBy).string_len(256))
                    .col(ColumnDef::new(DealDocuments::FileUrl).text())
                    .col(
                        ColumnDef::new(DealDocuments::CreatedAt)
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
                    .name("uq_deal_documents_deal_doc")
                    .table(DealDocuments::Table)
                    .col(DealDocuments::DealId)
                    .col(DealDocuments::DocId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DealStips::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DealStips::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(DealStips::DealId).uuid().not_null())
                    .col(ColumnDef::new(DealStips::Text).text().not_null())
                    .col(
                        ColumnDef::new(DealStips::Done)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(DealStips::ResolvedBy).string_len(256))
                    .col(ColumnDef::new(DealStips::FileUrl).text())
                    .col(
                        ColumnDef::new(DealStips::Visibility)
                            .string_len(16)
                            .not_null()
                            .default("all"),
                    )
                    .col(ColumnDef::new(DealStips::Category).string_len(16))
                    .col(
                        ColumnDef::new(DealStips::Auto)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DealStips::AddedAt)
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
                    .name("idx_deal_stips_deal")
                    .table(DealStips::Table)
                    .col(DealStips::DealId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DealFundingItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DealFundingItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DealFundingItems::DealId).uuid().not_null())
                    .col(ColumnDef::new(DealFundingItems::Text).text().not_null())
                    .col(
                        ColumnDef::new(DealFundingItems::Done)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(DealFundingItems::FileUrl).text())
                    .col(ColumnDef::new(DealFundingItems::Category).string_len(16))
                    .col(
                        ColumnDef::new(DealFundingItems::Auto)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DealFundingItems::AddedAt)
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
                    .name("idx_deal_funding_items_deal")
                    .table(DealFundingItems::Table)
                    .col(DealFundingItems::DealId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DealNotes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DealNotes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(DealNotes::DealId).uuid().not_null())
                    .col(ColumnDef::new(DealNotes::Text).text().not_null())
                    .col(ColumnDef::new(DealNotes::Author).string_len(256).not_null())
                    .col(
                        ColumnDef::new(DealNotes::Pinned)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DealNotes::CreatedAt)
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
                    .name("idx_deal_notes_deal")
                    .table(DealNotes::Table)
                    .col(DealNotes::DealId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DealNotes::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(DealFundingItems::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(DealStips::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DealDocuments::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DealActivities::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DealHistory::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Deals::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}
