//! Create friendship table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Friendship::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Friendship::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Friendship::UserId).string_len(64).not_null())
                    .col(ColumnDef::new(Friendship::FriendId).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Friendship::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_friendship_user")
                            .from(Friendship::Table, Friendship::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_friendship_friend")
                            .from(Friendship::Table, Friendship::FriendId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, friend_id) - prevent duplicate edges
        manager
            .create_index(
                Index::create()
                    .name("idx_friendship_user_friend")
                    .table(Friendship::Table)
                    .col(Friendship::UserId)
                    .col(Friendship::FriendId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: friend_id (for listing followers)
        manager
            .create_index(
                Index::create()
                    .name("idx_friendship_friend_id")
                    .table(Friendship::Table)
                    .col(Friendship::FriendId)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (for pagination)
        manager
            .create_index(
                Index::create()
                    .name("idx_friendship_created_at")
                    .table(Friendship::Table)
                    .col(Friendship::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Friendship::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Friendship {
    Table,
    Id,
    UserId,
    FriendId,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
