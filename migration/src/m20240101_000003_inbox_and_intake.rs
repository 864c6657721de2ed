use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum DealerNotes {
    Table,
    Id,
    DealId,
    DealerId,
    DealerName,
    Text,
    Read,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Reminders {
    Table,
    Id,
    UserId,
    Text,
    DueAt,
    DealId,
    DealBiz,
    Fired,
    Dismissed,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Applications {
    Table,
    Id,
    BusinessName,
    Dba,
    BusinessAddress,
    City,
    State,
    Zip,
    Phone,
    Email,
    FederalTaxId,
    YearsInBusiness,
    EntityType,
    OwnerName,
    OwnerTitle,
    OwnerSsn,
    OwnerDob,
    OwnerAddress,
    OwnerPhone,
    OwnerEmail,
    OwnershipPct,
    EquipmentDescription,
    EquipmentCost,
    VendorName,
    AmountRequested,
    TermRequested,
    AdditionalInfo,
    Status,
    DealId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Profiles {
    Table,
    Id,
    Email,
    Role,
    FullName,
    DealerId,
    AccountId,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DealerNotes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DealerNotes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(DealerNotes::DealId).uuid())
                    .col(ColumnDef::new(DealerNotes::DealerId).uuid().not_null())
                    .col(
                        ColumnDef::new(DealerNotes::DealerName)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(ColumnDef::new(DealerNotes::Text).text().not_null())
                    .col(
                        ColumnDef::new(DealerNotes::Read)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DealerNotes::CreatedAt)
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
                    .name("idx_dealer_notes_dealer_read")
                    .table(DealerNotes::Table)
                    .col(DealerNotes::DealerId)
                    .col(DealerNotes::Read)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Reminders::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Reminders::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Reminders::UserId).uuid().not_null())
                    .col(ColumnDef::new(Reminders::Text).text().not_null())
                    .col(
                        ColumnDef::new(Reminders::DueAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Reminders::DealId).uuid())
                    .col(ColumnDef::new(Reminders::DealBiz).string_len(256))
                    .col(
                        ColumnDef::new(Reminders::Fired)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Reminders::Dismissed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Reminders::CreatedAt)
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
                    .name("idx_reminders_user_due")
                    .table(Reminders::Table)
                    .col(Reminders::UserId)
                    .col(Reminders::DueAt)
                    .to_owned(),
            )
            .await?;

        let mut applications = Table::create();
        applications
            .table(Applications::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(Applications::Id)
                    .uuid()
                    .not_null()
                    .primary_key(),
            )
            .col(
                ColumnDef::new(Applications::BusinessName)
                    .string_len(256)
                    .not_null(),
            )
            .col(ColumnDef::new(Applications::Email).string_len(320).not_null());
        // Free-text form fields, stored as submitted.
        for column in [
            Applications::Dba,
            Applications::BusinessAddress,
            Applications::City,
            Applications::State,
            Applications::Zip,
            Applications::Phone,
            Applications::FederalTaxId,
            Applications::YearsInBusiness,
            Applications::EntityType,
            Applications::OwnerName,
            Applications::OwnerTitle,
            Applications::OwnerSsn,
            Applications::OwnerDob,
            Applications::OwnerAddress,
            Applications::OwnerPhone,
            Applications::OwnerEmail,
            Applications::OwnershipPct,
            Applications::EquipmentDescription,
            Applications::EquipmentCost,
            Applications::VendorName,
            Applications::AmountRequested,
            Applications::TermRequested,
            Applications::AdditionalInfo,
        ] {
            applications.col(ColumnDef::new(column).text());
        }
        applications
            .col(ColumnDef::new(Applications::Status).string_len(16).not_null())
            .col(ColumnDef::new(Applications::DealId).uuid())
            .col(
                ColumnDef::new(Applications::CreatedAt)
                    .timestamp_with_time_zone()
                    .not_null(),
            );
        manager.create_table(applications.to_owned()).await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_applications_email")
                    .table(Applications::Table)
                    .col(Applications::Email)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Profiles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Profiles::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Profiles::Email).string_len(320))
                    .col(ColumnDef::new(Profiles::Role).string_len(16).not_null())
                    .col(ColumnDef::new(Profiles::FullName).string_len(256))
                    .col(ColumnDef::new(Profiles::DealerId).uuid())
                    .col(ColumnDef::new(Profiles::AccountId).uuid())
                    .col(
                        ColumnDef::new(Profiles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Profiles::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Applications::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Reminders::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DealerNotes::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}
