//! Bookkeeping for updates that must run at most once per database.

use crate::orm::update_log;
use chrono::Utc;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, Set};

/// Returns true when `key` has already been recorded as completed.
pub async fn has_completed(db: &DatabaseConnection, key: &str) -> Result<bool, DbErr> {
    Ok(update_log::Entity::find_by_id(key)
        .one(db)
        .await?
        .is_some())
}

/// Records `key` as completed now.
///
/// Callers check [`has_completed`] first; inserting the same key twice is a
/// database error.
pub async fn mark_completed(db: &DatabaseConnection, key: &str) -> Result<(), DbErr> {
    let entry = update_log::ActiveModel {
        key: Set(key.to_owned()),
        completed_at: Set(Utc::now().naive_utc()),
    };
    update_log::Entity::insert(entry).exec(db).await?;
    Ok(())
}
