use crate::db::models::{CountryFilter, CountrySort, CountryUpsert, DbCountry, DbStatus};
use crate::db::schema::SQLITE_INIT;
use crate::error::OrbisError;
use chrono::{DateTime, Utc};
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::{str::FromStr, time::Duration};
use tracing::{debug, info};

const COUNTRY_COLUMNS: &str = "id, name, capital, region, population, currency_code, \
     exchange_rate, estimated_gdp, flag_url, last_refreshed_at";

#[derive(Debug)]
pub enum DbActorMessage {
    /// Upsert every row and replace the meta timestamp inside one transaction.
    /// Replies with the number of rows written.
    ApplyRefresh(
        Vec<CountryUpsert>,
        DateTime<Utc>,
        RpcReplyPort<Result<usize, OrbisError>>,
    ),

    /// Upsert a single row and return its id.
    Upsert(CountryUpsert, RpcReplyPort<Result<i64, OrbisError>>),

    /// List countries matching the filter.
    List(CountryFilter, RpcReplyPort<Result<Vec<DbCountry>, OrbisError>>),

    /// Case-insensitive lookup by name.
    GetByName(String, RpcReplyPort<Result<Option<DbCountry>, OrbisError>>),

    /// Case-insensitive delete by name; replies with affected rows.
    DeleteByName(String, RpcReplyPort<Result<u64, OrbisError>>),

    /// Row count plus the dataset-wide refresh timestamp.
    Status(RpcReplyPort<Result<DbStatus, OrbisError>>),
}

#[derive(Clone)]
pub struct DbActorHandle {
    actor: ActorRef<DbActorMessage>,
}

impl DbActorHandle {
    pub async fn apply_refresh(
        &self,
        rows: Vec<CountryUpsert>,
        refreshed_at: DateTime<Utc>,
    ) -> Result<usize, OrbisError> {
        ractor::call!(self.actor, DbActorMessage::ApplyRefresh, rows, refreshed_at).map_err(
            |e| OrbisError::RactorError(format!("DbActor ApplyRefresh RPC failed: {e}")),
        )?
    }

    pub async fn upsert_country(&self, row: CountryUpsert) -> Result<i64, OrbisError> {
        ractor::call!(self.actor, DbActorMessage::Upsert, row)
            .map_err(|e| OrbisError::RactorError(format!("DbActor Upsert RPC failed: {e}")))?
    }

    pub async fn list_countries(&self, filter: CountryFilter) -> Result<Vec<DbCountry>, OrbisError> {
        ractor::call!(self.actor, DbActorMessage::List, filter)
            .map_err(|e| OrbisError::RactorError(format!("DbActor List RPC failed: {e}")))?
    }

    pub async fn get_country(&self, name: &str) -> Result<Option<DbCountry>, OrbisError> {
        ractor::call!(self.actor, DbActorMessage::GetByName, name.to_string())
            .map_err(|e| OrbisError::RactorError(format!("DbActor GetByName RPC failed: {e}")))?
    }

    /// Returns `true` when at least one row was removed.
    pub async fn delete_country(&self, name: &str) -> Result<bool, OrbisError> {
        let affected = ractor::call!(self.actor, DbActorMessage::DeleteByName, name.to_string())
            .map_err(|e| {
                OrbisError::RactorError(format!("DbActor DeleteByName RPC failed: {e}"))
            })??;
        Ok(affected > 0)
    }

    pub async fn status(&self) -> Result<DbStatus, OrbisError> {
        ractor::call!(self.actor, DbActorMessage::Status)
            .map_err(|e| OrbisError::RactorError(format!("DbActor Status RPC failed: {e}")))?
    }
}

struct DbActorState {
    pool: SqlitePool,
}

struct DbActor;

#[ractor::async_trait]
impl Actor for DbActor {
    type Msg = DbActorMessage;
    type State = DbActorState;
    type Arguments = String;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        database_url: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let connect_opts = SqliteConnectOptions::from_str(database_url.as_str())
            .map_err(|e| ActorProcessingErr::from(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .connect_with(connect_opts)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db connect failed: {e}")))?;

        apply_schema(&pool)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db schema init failed: {e}")))?;

        info!("DbActor initialized");
        Ok(DbActorState { pool })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            DbActorMessage::ApplyRefresh(rows, refreshed_at, reply) => {
                let res = self.apply_refresh(&state.pool, rows, refreshed_at).await;
                let _ = reply.send(res);
            }
            DbActorMessage::Upsert(row, reply) => {
                let res = match state.pool.acquire().await {
                    Ok(mut conn) => upsert_country(&mut *conn, &row).await,
                    Err(e) => Err(e.into()),
                };
                let _ = reply.send(res);
            }
            DbActorMessage::List(filter, reply) => {
                let res = self.list_countries(&state.pool, &filter).await;
                let _ = reply.send(res);
            }
            DbActorMessage::GetByName(name, reply) => {
                let res = self.get_country(&state.pool, &name).await;
                let _ = reply.send(res);
            }
            DbActorMessage::DeleteByName(name, reply) => {
                let res = self.delete_country(&state.pool, &name).await;
                let _ = reply.send(res);
            }
            DbActorMessage::Status(reply) => {
                let res = self.status(&state.pool).await;
                let _ = reply.send(res);
            }
        }
        Ok(())
    }
}

impl DbActor {
    async fn apply_refresh(
        &self,
        pool: &SqlitePool,
        rows: Vec<CountryUpsert>,
        refreshed_at: DateTime<Utc>,
    ) -> Result<usize, OrbisError> {
        let mut tx = pool.begin().await?;

        for row in &rows {
            upsert_country(&mut *tx, row).await?;
        }

        sqlx::query("DELETE FROM meta").execute(&mut *tx).await?;
        sqlx::query("INSERT INTO meta (last_refreshed_at) VALUES (?)")
            .bind(refreshed_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!(rows = rows.len(), %refreshed_at, "Refresh batch committed");
        Ok(rows.len())
    }

    async fn list_countries(
        &self,
        pool: &SqlitePool,
        filter: &CountryFilter,
    ) -> Result<Vec<DbCountry>, OrbisError> {
        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new("SELECT ");
        qb.push(COUNTRY_COLUMNS).push(" FROM countries WHERE 1=1");

        if let Some(region) = filter.region.as_deref() {
            qb.push(" AND region = ").push_bind(region);
        }
        if let Some(currency) = filter.currency_code.as_deref() {
            qb.push(" AND currency_code = ").push_bind(currency);
        }

        match filter.sort {
            CountrySort::Insertion => qb.push(" ORDER BY id"),
            CountrySort::GdpDesc => qb.push(" ORDER BY estimated_gdp DESC, name ASC"),
        };

        let rows = qb.build_query_as::<DbCountry>().fetch_all(pool).await?;
        Ok(rows)
    }

    async fn get_country(
        &self,
        pool: &SqlitePool,
        name: &str,
    ) -> Result<Option<DbCountry>, OrbisError> {
        let row = sqlx::query_as::<_, DbCountry>(&format!(
            "SELECT {COUNTRY_COLUMNS} FROM countries WHERE name_key = ? ORDER BY id LIMIT 1"
        ))
        .bind(name_key(name))
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    async fn delete_country(&self, pool: &SqlitePool, name: &str) -> Result<u64, OrbisError> {
        let res = sqlx::query("DELETE FROM countries WHERE name_key = ?")
            .bind(name_key(name))
            .execute(pool)
            .await?;

        Ok(res.rows_affected())
    }

    async fn status(&self, pool: &SqlitePool) -> Result<DbStatus, OrbisError> {
        let total_countries: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM countries")
            .fetch_one(pool)
            .await?;
        let last_refreshed_at: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT last_refreshed_at FROM meta ORDER BY id LIMIT 1")
                .fetch_optional(pool)
                .await?;

        Ok(DbStatus {
            total_countries,
            last_refreshed_at,
        })
    }
}

async fn upsert_country(conn: &mut SqliteConnection, row: &CountryUpsert) -> Result<i64, OrbisError> {
    let id: i64 = sqlx::query_scalar(
        r#"
    INSERT INTO countries (
        name, name_key, capital, region, population, currency_code, exchange_rate, estimated_gdp, flag_url, last_refreshed_at
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(name) DO UPDATE SET
        name_key=excluded.name_key,
        capital=excluded.capital,
        region=excluded.region,
        population=excluded.population,
        currency_code=excluded.currency_code,
        exchange_rate=excluded.exchange_rate,
        estimated_gdp=excluded.estimated_gdp,
        flag_url=excluded.flag_url,
        last_refreshed_at=excluded.last_refreshed_at
    RETURNING id
    "#,
    )
    .bind(row.name.as_str())
    .bind(name_key(&row.name))
    .bind(row.capital.as_deref())
    .bind(row.region.as_deref())
    .bind(row.population)
    .bind(row.currency_code.as_deref())
    .bind(row.exchange_rate)
    .bind(row.estimated_gdp)
    .bind(row.flag_url.as_deref())
    .bind(row.last_refreshed_at)
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}

/// Lookup key for case-insensitive name matching. Folds the full Unicode range,
/// so "ÅLAND ISLANDS" and "åland islands" share a key.
fn name_key(name: &str) -> String {
    name.to_lowercase()
}

/// Spawn the database actor and return a cloneable handle.
pub async fn spawn(database_url: &str) -> Result<DbActorHandle, OrbisError> {
    let (actor, _jh) = ractor::Actor::spawn(None, DbActor, database_url.to_string())
        .await
        .map_err(|e| OrbisError::RactorError(format!("failed to spawn DbActor: {e}")))?;

    Ok(DbActorHandle { actor })
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), OrbisError> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}
