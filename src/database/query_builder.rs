use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::{Query, QueryAs};
use sqlx::{FromRow, PgExecutor, PgPool, Postgres, Row};

use crate::database::manager::DatabaseError;
use crate::filter::{Filter, Page, PageOf, SqlParam, SqlResult};

/// Runs on the pool or on an open transaction's connection
pub async fn fetch_all<'e, E, T>(exec: E, sql: &SqlResult) -> Result<Vec<T>, DatabaseError>
where
    E: PgExecutor<'e>,
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let mut q = sqlx::query_as::<_, T>(&sql.query);
    for p in sql.params.iter() {
        q = bind_param_query_as(q, p);
    }
    Ok(q.fetch_all(exec).await?)
}

pub async fn fetch_optional<'e, E, T>(exec: E, sql: &SqlResult) -> Result<Option<T>, DatabaseError>
where
    E: PgExecutor<'e>,
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let mut q = sqlx::query_as::<_, T>(&sql.query);
    for p in sql.params.iter() {
        q = bind_param_query_as(q, p);
    }
    Ok(q.fetch_optional(exec).await?)
}

pub async fn count(pool: &PgPool, sql: &SqlResult) -> Result<i64, DatabaseError> {
    let mut q = sqlx::query(&sql.query);
    for p in sql.params.iter() {
        q = bind_param_query(q, p);
    }
    let row = q.fetch_one(pool).await?;
    let count: i64 = row.try_get("count")?;
    Ok(count)
}

/// Runs the count and the windowed select for one page of `filter`
pub async fn fetch_page<T>(pool: &PgPool, filter: &Filter, page: &Page) -> Result<PageOf<T>, DatabaseError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let total = count(pool, &filter.to_count_sql()).await?;
    let rows = fetch_all(pool, &filter.to_page_sql(page)).await?;
    Ok(PageOf { rows, pagination: page.summarize(total) })
}

pub fn bind_param_query<'q>(
    q: Query<'q, Postgres, PgArguments>,
    v: &SqlParam,
) -> Query<'q, Postgres, PgArguments> {
    match v {
        SqlParam::Int(i) => q.bind(*i),
        SqlParam::Text(s) => q.bind(s.clone()),
        SqlParam::Bool(b) => q.bind(*b),
        SqlParam::Date(d) => q.bind(*d),
        SqlParam::Decimal(d) => q.bind(*d),
    }
}

pub fn bind_param_query_as<'q, O>(
    q: QueryAs<'q, Postgres, O, PgArguments>,
    v: &SqlParam,
) -> QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        SqlParam::Int(i) => q.bind(*i),
        SqlParam::Text(s) => q.bind(s.clone()),
        SqlParam::Bool(b) => q.bind(*b),
        SqlParam::Date(d) => q.bind(*d),
        SqlParam::Decimal(d) => q.bind(*d),
    }
}
