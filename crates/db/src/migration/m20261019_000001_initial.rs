//! Initial schema: tenants, users, clients, company info, chat, files and
//! storage configuration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tenants::Table)
                    .col(id_col(Tenants::Id))
                    .col(ColumnDef::new(Tenants::Name).string_len(255).not_null())
                    .col(timestamp_col(Tenants::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .col(id_col(Users::Id))
                    .col(ColumnDef::new(Users::TenantId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Users::Email)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::DisplayName).string_len(100).not_null())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string_len(20)
                            .not_null()
                            .default("staff"),
                    )
                    .col(
                        ColumnDef::new(Users::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(timestamp_col(Users::CreatedAt))
                    .foreign_key(&mut cascade_to(
                        Users::Table,
                        Users::TenantId,
                        Tenants::Table,
                        Tenants::Id,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Clients::Table)
                    .col(id_col(Clients::Id))
                    .col(ColumnDef::new(Clients::TenantId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Clients::ClientType)
                            .string_len(20)
                            .not_null()
                            .default("corporation"),
                    )
                    .col(ColumnDef::new(Clients::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Clients::Email).string_len(255).null())
                    .col(ColumnDef::new(Clients::Phone).string_len(50).null())
                    .col(ColumnDef::new(Clients::Notes).text().null())
                    .col(timestamp_col(Clients::CreatedAt))
                    .col(timestamp_col(Clients::UpdatedAt))
                    .foreign_key(&mut cascade_to(
                        Clients::Table,
                        Clients::TenantId,
                        Tenants::Table,
                        Tenants::Id,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_clients_tenant")
                    .table(Clients::Table)
                    .col(Clients::TenantId)
                    .col(Clients::CreatedAt)
                    .to_owned(),
            )
            .await?;

        let mut company = Table::create();
        company
            .table(CompanyInfos::Table)
            .col(id_col(CompanyInfos::Id))
            .col(
                ColumnDef::new(CompanyInfos::ClientId)
                    .big_integer()
                    .not_null()
                    .unique_key(),
            );
        for column in [
            CompanyInfos::CompanyName,
            CompanyInfos::PostalCode,
            CompanyInfos::Prefecture,
            CompanyInfos::Address,
            CompanyInfos::Building,
            CompanyInfos::Phone1,
            CompanyInfos::Phone2,
            CompanyInfos::Fax,
            CompanyInfos::Email,
            CompanyInfos::ContactPerson,
            CompanyInfos::Industry,
            CompanyInfos::CorporateNumber,
        ] {
            company.col(ColumnDef::new(column).string_len(255).null());
        }
        company
            .col(ColumnDef::new(CompanyInfos::EmployeeCount).integer().null())
            .col(timestamp_col(CompanyInfos::UpdatedAt))
            .foreign_key(&mut cascade_to(
                CompanyInfos::Table,
                CompanyInfos::ClientId,
                Clients::Table,
                Clients::Id,
            ));
        manager.create_table(company.to_owned()).await?;

        manager
            .create_table(
                Table::create()
                    .table(Messages::Table)
                    .col(id_col(Messages::Id))
                    .col(ColumnDef::new(Messages::ClientId).big_integer().not_null())
                    .col(ColumnDef::new(Messages::Sender).string_len(100).not_null())
                    .col(ColumnDef::new(Messages::Body).text().not_null())
                    .col(timestamp_col(Messages::CreatedAt))
                    .foreign_key(&mut cascade_to(
                        Messages::Table,
                        Messages::ClientId,
                        Clients::Table,
                        Clients::Id,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_messages_client")
                    .table(Messages::Table)
                    .col(Messages::ClientId)
                    .col(Messages::Id)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Files::Table)
                    .col(id_col(Files::Id))
                    .col(ColumnDef::new(Files::ClientId).big_integer().not_null())
                    .col(ColumnDef::new(Files::Filename).string_len(255).not_null())
                    .col(ColumnDef::new(Files::FileUrl).text().not_null())
                    .col(ColumnDef::new(Files::StorageKey).text().not_null())
                    .col(ColumnDef::new(Files::Provider).string_len(20).not_null())
                    .col(ColumnDef::new(Files::StorageConfigId).big_integer().null())
                    .col(ColumnDef::new(Files::ContentType).string_len(255).null())
                    .col(
                        ColumnDef::new(Files::SizeBytes)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Files::Uploader).string_len(100).not_null())
                    .col(timestamp_col(Files::CreatedAt))
                    .foreign_key(&mut cascade_to(
                        Files::Table,
                        Files::ClientId,
                        Clients::Table,
                        Clients::Id,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_files_client")
                    .table(Files::Table)
                    .col(Files::ClientId)
                    .col(Files::Id)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StorageConfigs::Table)
                    .col(id_col(StorageConfigs::Id))
                    .col(
                        ColumnDef::new(StorageConfigs::TenantId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StorageConfigs::Provider)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(ColumnDef::new(StorageConfigs::AccessToken).text().null())
                    .col(
                        ColumnDef::new(StorageConfigs::BucketName)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StorageConfigs::ServiceAccountJson)
                            .text()
                            .null(),
                    )
                    .col(ColumnDef::new(StorageConfigs::Region).string_len(50).null())
                    .col(ColumnDef::new(StorageConfigs::Endpoint).string_len(255).null())
                    .col(
                        ColumnDef::new(StorageConfigs::AccessKeyId)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StorageConfigs::SecretAccessKey)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StorageConfigs::Status)
                            .string_len(20)
                            .not_null()
                            .default("active"),
                    )
                    .col(timestamp_col(StorageConfigs::CreatedAt))
                    .col(timestamp_col(StorageConfigs::UpdatedAt))
                    .foreign_key(&mut cascade_to(
                        StorageConfigs::Table,
                        StorageConfigs::TenantId,
                        Tenants::Table,
                        Tenants::Id,
                    ))
                    .to_owned(),
            )
            .await?;

        // Active-config lookup: tenant + status, newest id first.
        manager
            .create_index(
                Index::create()
                    .name("idx_storage_configs_tenant_status")
                    .table(StorageConfigs::Table)
                    .col(StorageConfigs::TenantId)
                    .col(StorageConfigs::Status)
                    .col(StorageConfigs::Id)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            StorageConfigs::Table.into_iden(),
            Files::Table.into_iden(),
            Messages::Table.into_iden(),
            CompanyInfos::Table.into_iden(),
            Clients::Table.into_iden(),
            Users::Table.into_iden(),
            Tenants::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}

fn id_col<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name)
        .big_integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

fn timestamp_col<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

fn cascade_to<A, B, C, D>(
    table: A,
    column: B,
    ref_table: C,
    ref_column: D,
) -> ForeignKeyCreateStatement
where
    A: IntoTableRef,
    B: IntoIden,
    C: IntoTableRef,
    D: IntoIden,
{
    ForeignKey::create()
        .from(table, column)
        .to(ref_table, ref_column)
        .on_delete(ForeignKeyAction::Cascade)
        .to_owned()
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    TenantId,
    Email,
    DisplayName,
    PasswordHash,
    Role,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Clients {
    Table,
    Id,
    TenantId,
    ClientType,
    Name,
    Email,
    Phone,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden, Clone, Copy)]
enum CompanyInfos {
    Table,
    Id,
    ClientId,
    CompanyName,
    PostalCode,
    Prefecture,
    Address,
    Building,
    Phone1,
    Phone2,
    Fax,
    Email,
    ContactPerson,
    Industry,
    EmployeeCount,
    CorporateNumber,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Messages {
    Table,
    Id,
    ClientId,
    Sender,
    Body,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Files {
    Table,
    Id,
    ClientId,
    Filename,
    FileUrl,
    StorageKey,
    Provider,
    StorageConfigId,
    ContentType,
    SizeBytes,
    Uploader,
    CreatedAt,
}

#[derive(DeriveIden)]
enum StorageConfigs {
    Table,
    Id,
    TenantId,
    Provider,
    AccessToken,
    BucketName,
    ServiceAccountJson,
    Region,
    Endpoint,
    AccessKeyId,
    SecretAccessKey,
    Status,
    CreatedAt,
    UpdatedAt,
}
