use crate::orm::{actors, users};
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr};
use std::collections::HashMap;

/// Loads the identity behind a raw user id column value.
///
/// A value of 0 is the schema's sentinel for "no user" and resolves to
/// nothing without touching the database.
pub async fn find_user(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Option<users::Model>, DbErr> {
    if user_id == 0 {
        return Ok(None);
    }
    users::Entity::find_by_id(user_id).one(db).await
}

/// Returns the actor id for a user, allocating the actor row on first use.
pub async fn actor_id_for(db: &DatabaseConnection, user: &users::Model) -> Result<i64, DbErr> {
    let existing = actors::Entity::find()
        .filter(actors::Column::UserId.eq(user.id))
        .one(db)
        .await?;
    if let Some(actor) = existing {
        return Ok(actor.id);
    }

    let inserted = actors::Entity::insert(actors::ActiveModel {
        user_id: Set(user.id),
        name: Set(user.name.to_owned()),
        ..Default::default()
    })
    .exec(db)
    .await?;
    Ok(inserted.last_insert_id)
}

/// Resolves raw user ids to actor ids, remembering every answer for the rest
/// of the run. Misses are remembered too, so a deleted user costs one lookup
/// no matter how many columns still reference it.
#[derive(Default)]
pub struct ActorResolver {
    cache: HashMap<i32, Option<i64>>,
}

impl ActorResolver {
    pub async fn resolve(
        &mut self,
        db: &DatabaseConnection,
        user_id: i32,
    ) -> Result<Option<i64>, DbErr> {
        if user_id == 0 {
            return Ok(None);
        }
        if let Some(known) = self.cache.get(&user_id) {
            return Ok(*known);
        }

        let actor_id = match find_user(db, user_id).await? {
            Some(user) => Some(actor_id_for(db, &user).await?),
            None => None,
        };
        self.cache.insert(user_id, actor_id);
        Ok(actor_id)
    }
}
