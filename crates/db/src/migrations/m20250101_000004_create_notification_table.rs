//! Create notification table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Notification::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notification::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Notification::RecipientId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Notification::SenderId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Notification::NotificationType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Notification::PostId).string_len(64))
                    .col(ColumnDef::new(Notification::DedupeKey).string_len(192))
                    .col(
                        ColumnDef::new(Notification::Seen)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Notification::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_recipient")
                            .from(Notification::Table, Notification::RecipientId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_sender")
                            .from(Notification::Table, Notification::SenderId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: dedupe_key - one live follow_request/follow_back per pair.
        // NULL keys never collide, so other types are unaffected.
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_dedupe_key")
                    .table(Notification::Table)
                    .col(Notification::DedupeKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: (recipient_id, seen) (for the feed and unseen count)
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_recipient_seen")
                    .table(Notification::Table)
                    .col(Notification::RecipientId)
                    .col(Notification::Seen)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (for ordering)
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_created_at")
                    .table(Notification::Table)
                    .col(Notification::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notification::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Notification {
    Table,
    Id,
    RecipientId,
    SenderId,
    NotificationType,
    PostId,
    DedupeKey,
    Seen,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
