use rusqlite::{Connection, Params, Row};

/// Maps a row selected by column name onto a model.
pub trait FromSqliteRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Runs a query and maps every returned row.
pub fn query_all<T, P>(conn: &Connection, sql: &str, params: P) -> rusqlite::Result<Vec<T>>
where
    T: FromSqliteRow,
    P: Params,
{
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>();
    rows
}
