use crate::actor::ActorResolver;
use crate::update_log;
use sea_orm::sea_query::{Alias, Expr, Query, SelectStatement, UpdateStatement};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr};

/// Update key recorded in `update_log` once the backfill has run.
pub const UPDATE_KEY: &str = "migrate-user-columns-to-actor";

/// One legacy user id column and the actor column replacing it.
pub struct ColumnPair {
    pub user: &'static str,
    pub actor: &'static str,
}

/// Backfill work for one table.
pub struct TableMap {
    pub table: &'static str,
    pub columns: &'static [ColumnPair],
}

/// Every table the backfill touches, in processing order. Column order
/// matches the host schema's definitions.
pub const TABLES: &[TableMap] = &[
    TableMap {
        table: "category",
        columns: &[
            ColumnPair {
                user: "added_user",
                actor: "added_actor",
            },
            ColumnPair {
                user: "edited_user",
                actor: "edited_actor",
            },
            ColumnPair {
                user: "deleted_user",
                actor: "deleted_actor",
            },
        ],
    },
    TableMap {
        table: "forum",
        columns: &[
            ColumnPair {
                user: "last_post_user",
                actor: "last_post_actor",
            },
            ColumnPair {
                user: "added_user",
                actor: "added_actor",
            },
            ColumnPair {
                user: "edited_user",
                actor: "edited_actor",
            },
            ColumnPair {
                user: "deleted_user",
                actor: "deleted_actor",
            },
        ],
    },
    TableMap {
        table: "thread",
        columns: &[
            ColumnPair {
                user: "user",
                actor: "actor",
            },
            ColumnPair {
                user: "deleted_user",
                actor: "deleted_actor",
            },
            ColumnPair {
                user: "edit_user",
                actor: "edit_actor",
            },
            ColumnPair {
                user: "closed_user",
                actor: "closed_actor",
            },
            ColumnPair {
                user: "last_post_user",
                actor: "last_post_actor",
            },
        ],
    },
    TableMap {
        table: "reply",
        columns: &[
            ColumnPair {
                user: "user",
                actor: "actor",
            },
            ColumnPair {
                user: "deleted_user",
                actor: "deleted_actor",
            },
            ColumnPair {
                user: "edit_user",
                actor: "edit_actor",
            },
        ],
    },
];

/// Counters accumulated over one run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Distinct legacy id tuples scanned across all tables.
    pub tuples: u64,
    /// UPDATE statements issued.
    pub updates: u64,
    /// Rows the driver reported affected by those updates. MySQL counts
    /// changed rows, Postgres counts matched rows.
    pub rows_touched: u64,
    /// Column values skipped for the 0 "no user" sentinel.
    pub skipped_zero: u64,
    /// Column values whose user no longer exists.
    pub skipped_missing: u64,
}

/// Populates the actor columns of every table in [`TABLES`].
///
/// Each table is scanned once for the distinct tuples of its legacy user id
/// columns; every non-zero, still-resolvable id is written back as an actor
/// reference to all rows sharing the legacy value. Zero and unresolvable ids
/// leave the actor column untouched. Running this twice leaves the data as
/// one run does, since each update re-matches the same rows with the same
/// value. Completion bookkeeping is the caller's job, not ours.
pub async fn run(db: &DatabaseConnection) -> Result<RunSummary, DbErr> {
    let mut resolver = ActorResolver::default();
    let mut summary = RunSummary::default();
    for map in TABLES {
        backfill_table(db, &mut resolver, map, &mut summary).await?;
    }
    Ok(summary)
}

/// Runs the backfill at most once per database, with `update_log` as the
/// guard.
///
/// [`UPDATE_KEY`] is recorded only after a complete run, so an aborted run
/// stays unrecorded and the next invocation retries it. Returns `None` when
/// a prior run had already been recorded.
pub async fn run_logged(db: &DatabaseConnection) -> Result<Option<RunSummary>, DbErr> {
    if update_log::has_completed(db, UPDATE_KEY).await? {
        return Ok(None);
    }
    let summary = run(db).await?;
    update_log::mark_completed(db, UPDATE_KEY).await?;
    Ok(Some(summary))
}

async fn backfill_table(
    db: &DatabaseConnection,
    resolver: &mut ActorResolver,
    map: &TableMap,
    summary: &mut RunSummary,
) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let rows = db
        .query_all(backend.build(&distinct_user_tuples(map)))
        .await?;
    log::info!("{}: {} distinct user id tuples", map.table, rows.len());

    for row in rows {
        summary.tuples += 1;
        for pair in map.columns {
            // NULL reads as the 0 sentinel; these columns predate NOT NULL.
            let user_id = row.try_get::<Option<i32>>("", pair.user)?.unwrap_or(0);
            if user_id == 0 {
                summary.skipped_zero += 1;
                continue;
            }
            let actor_id = match resolver.resolve(db, user_id).await? {
                Some(actor_id) => actor_id,
                None => {
                    log::debug!(
                        "{}.{}: user {} no longer exists, leaving the actor column unset",
                        map.table,
                        pair.user,
                        user_id
                    );
                    summary.skipped_missing += 1;
                    continue;
                }
            };
            let res = db
                .execute(backend.build(&actor_column_update(map.table, pair, user_id, actor_id)))
                .await?;
            summary.updates += 1;
            summary.rows_touched += res.rows_affected();
        }
    }
    Ok(())
}

/// `SELECT DISTINCT <legacy columns> FROM <table>`
fn distinct_user_tuples(map: &TableMap) -> SelectStatement {
    let mut stmt = Query::select();
    stmt.distinct().from(Alias::new(map.table));
    for pair in map.columns {
        stmt.column(Alias::new(pair.user));
    }
    stmt
}

/// `UPDATE <table> SET <actor column> = ? WHERE <legacy column> = ?`
fn actor_column_update(
    table: &str,
    pair: &ColumnPair,
    user_id: i32,
    actor_id: i64,
) -> UpdateStatement {
    let mut stmt = Query::update();
    stmt.table(Alias::new(table))
        .value(Alias::new(pair.actor), Expr::value(actor_id))
        .and_where(Expr::col(Alias::new(pair.user)).eq(user_id));
    stmt
}
