use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Dealers {
    Table,
    Id,
    Name,
    Contact,
    Email,
    Phone,
    Address,
    PasswordHash,
    CommissionRate,
    Notes,
    Active,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
    Biz,
    Contact,
    Email,
    Phone,
    Address,
    Industry,
    DateStarted,
    Notes,
    CustPasswordHash,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AccountActivities {
    Table,
    Id,
    AccountId,
    Type,
    Actor,
    Detail,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Lenders {
    Table,
    Id,
    Name,
    Code,
    Contact,
    Email,
    Phone,
    Address,
    TaxRule,
    Lienholder,
    InsListYmm,
    InsListVin,
    InsPropertyCov,
    InsMaxDeductible,
    InsCompCollision,
    InsAcv,
    InsAddlNotes,
    Active,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Dealers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Dealers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Dealers::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Dealers::Contact).string_len(256))
                    .col(ColumnDef::new(Dealers::Email).string_len(320))
                    .col(ColumnDef::new(Dealers::Phone).string_len(64))
                    .col(ColumnDef::new(Dealers::Address).text())
                    .col(ColumnDef::new(Dealers::PasswordHash).string_len(256))
                    .col(ColumnDef::new(Dealers::CommissionRate).double())
                    .col(ColumnDef::new(Dealers::Notes).text())
                    .col(
                        ColumnDef::new(Dealers::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Dealers::CreatedAt)
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
                    .name("idx_dealers_name")
                    .table(Dealers::Table)
                    .col(Dealers::Name)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Accounts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Accounts::Biz).string_len(256).not_null())
                    .col(ColumnDef::new(Accounts::Contact).string_len(256))
                    .col(ColumnDef::new(Accounts::Email).string_len(320))
                    .col(ColumnDef::new(Accounts::Phone).string_len(64))
                    .col(ColumnDef::new(Accounts::Address).text())
                    .col(ColumnDef::new(Accounts::Industry).string_len(128))
                    .col(ColumnDef::new(Accounts::DateStarted).date())
                    .col(ColumnDef::new(Accounts::Notes).text())
                    .col(ColumnDef::new(Accounts::CustPasswordHash).string_len(256))
                    .col(
                        ColumnDef::new(Accounts::CreatedAt)
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
                    .name("idx_accounts_email")
                    .table(Accounts::Table)
                    .col(Accounts::Email)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AccountActivities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccountActivities::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AccountActivities::AccountId).uuid().not_null())
                    .col(
                        ColumnDef::new(AccountActivities::Type)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccountActivities::Actor)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AccountActivities::Detail).text().not_null())
                    .col(
                        ColumnDef::new(AccountActivities::CreatedAt)
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
                    .name("idx_account_activities_account")
                    .table(AccountActivities::Table)
                    .col(AccountActivities::AccountId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Lenders::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Lenders::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Lenders::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Lenders::Code).string_len(32))
                    .col(ColumnDef::new(Lenders::Contact).string_len(256))
                    .col(ColumnDef::new(Lenders::Email).string_len(320))
                    .col(ColumnDef::new(Lenders::Phone).string_len(64))
                    .col(ColumnDef::new(Lenders::Address).text())
                    .col(ColumnDef::new(Lenders::TaxRule).string_len(64))
                    .col(ColumnDef::new(Lenders::Lienholder).text())
                    .col(
                        ColumnDef::new(Lenders::InsListYmm)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Lenders::InsListVin)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Lenders::InsPropertyCov).string_len(128))
                    .col(ColumnDef::new(Lenders::InsMaxDeductible).double())
                    .col(
                        ColumnDef::new(Lenders::InsCompCollision)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Lenders::InsAcv)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Lenders::InsAddlNotes).text())
                    .col(
                        ColumnDef::new(Lenders::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_lenders_name")
                    .table(Lenders::Table)
                    .col(Lenders::Name)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Lenders::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AccountActivities::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Dealers::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}
