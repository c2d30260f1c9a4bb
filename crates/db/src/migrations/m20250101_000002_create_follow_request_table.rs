//! Create `follow_request` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FollowRequest::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FollowRequest::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FollowRequest::RequesterId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FollowRequest::TargetId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FollowRequest::PairKey)
                            .string_len(129)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FollowRequest::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(FollowRequest::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_follow_request_requester")
                            .from(FollowRequest::Table, FollowRequest::RequesterId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_follow_request_target")
                            .from(FollowRequest::Table, FollowRequest::TargetId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (requester_id, target_id) - one live request per ordered pair
        manager
            .create_index(
                Index::create()
                    .name("idx_follow_request_requester_target")
                    .table(FollowRequest::Table)
                    .col(FollowRequest::RequesterId)
                    .col(FollowRequest::TargetId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Unique index: pair_key - no crossed requests between the same two users
        manager
            .create_index(
                Index::create()
                    .name("idx_follow_request_pair_key")
                    .table(FollowRequest::Table)
                    .col(FollowRequest::PairKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: target_id (for listing received requests)
        manager
            .create_index(
                Index::create()
                    .name("idx_follow_request_target_id")
                    .table(FollowRequest::Table)
                    .col(FollowRequest::TargetId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FollowRequest::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum FollowRequest {
    Table,
    Id,
    RequesterId,
    TargetId,
    PairKey,
    Status,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
