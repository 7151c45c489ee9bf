use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Append-only mail log
        manager
            .create_table(
                Table::create()
                    .table(MailLog::Table)
                    .if_not_exists()
                    .col(big_integer(MailLog::Id).auto_increment().primary_key())
                    .col(text(MailLog::ToEmail))
                    .col(text(MailLog::Subject))
                    .col(
                        ColumnDef::new(MailLog::Status)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(text_null(MailLog::ErrorMessage))
                    .col(
                        timestamp_with_time_zone(MailLog::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Postgres has no ADD CONSTRAINT IF NOT EXISTS
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DO $$
                BEGIN
                    IF NOT EXISTS (
                        SELECT 1 FROM pg_constraint WHERE conname = 'chk_mail_log_status'
                    ) THEN
                        ALTER TABLE mail_log
                            ADD CONSTRAINT chk_mail_log_status
                            CHECK (status IN ('success', 'failed'));
                    END IF;
                END
                $$
                "#,
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_mail_log_status")
                    .table(MailLog::Table)
                    .col(MailLog::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_mail_log_created_at")
                    .table(MailLog::Table)
                    .col(MailLog::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Key-value settings (webhook URL)
        manager
            .create_table(
                Table::create()
                    .table(AppSettings::Table)
                    .if_not_exists()
                    .col(string_len(AppSettings::Key, 191).primary_key())
                    .col(text(AppSettings::Value))
                    .col(
                        timestamp_with_time_zone(AppSettings::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AppSettings::Table).if_exists().to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(MailLog::Table).if_exists().to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum MailLog {
    Table,
    Id,
    ToEmail,
    Subject,
    Status,
    ErrorMessage,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AppSettings {
    Table,
    Key,
    Value,
    UpdatedAt,
}
