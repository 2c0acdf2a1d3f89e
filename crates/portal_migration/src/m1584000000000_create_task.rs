use sea_orm_migration::prelude::*;

use crate::record::MigrationRecord;

pub fn migration() -> MigrationRecord {
    MigrationRecord::new("1584000000000_create_task")
        .up(
            Table::create()
                .table(Task::Table)
                .col(
                    ColumnDef::new(Task::Id)
                        .integer()
                        .not_null()
                        .auto_increment()
                        .primary_key(),
                )
                .col(ColumnDef::new(Task::TaskType).string().not_null())
                .col(ColumnDef::new(Task::Status).string().not_null())
                .col(ColumnDef::new(Task::SiteId).string().not_null())
                .col(ColumnDef::new(Task::ProductId).string().not_null())
                .col(ColumnDef::new(Task::MeasurementDate).date().not_null())
                .col(ColumnDef::new(Task::ScheduledAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(Task::Priority).integer().not_null().default(50))
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_task_site")
                        .from(Task::Table, Task::SiteId)
                        .to(Site::Table, Site::Id)
                        .on_delete(ForeignKeyAction::Cascade),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_task_product")
                        .from(Task::Table, Task::ProductId)
                        .to(Product::Table, Product::Id)
                        .on_delete(ForeignKeyAction::Cascade),
                )
                .to_owned(),
        )
        // 任务队列按状态取到期任务
        .up(
            Index::create()
                .name("idx_task_status_scheduled_at")
                .table(Task::Table)
                .col(Task::Status)
                .col(Task::ScheduledAt)
                .to_owned(),
        )
        .down(Table::drop().table(Task::Table).if_exists().to_owned())
}

#[derive(DeriveIden)]
enum Task {
    Table,
    Id,
    TaskType,
    Status,
    SiteId,
    ProductId,
    MeasurementDate,
    ScheduledAt,
    Priority,
}

#[derive(DeriveIden)]
enum Site {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Product {
    Table,
    Id,
}
