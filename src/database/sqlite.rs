use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;

pub const BUSINESS_TABLE: &str = "businesses";

pub struct SqliteDatabase {}

impl SqliteDatabase {
    /**
    Create the business table if it does not exist yet.

    Rows are kept exactly as they arrive: an id and the raw JSON record. Shaping
    them into something typed happens when they are read back.
    */
    pub fn create_table(
        connection: &PooledConnection<SqliteConnectionManager>,
    ) -> rusqlite::Result<()> {
        connection.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id TEXT PRIMARY KEY,
                    record TEXT NOT NULL
                )",
                BUSINESS_TABLE
            ),
            (),
        )?;
        Ok(())
    }

    /**
    Insert one business record, replacing any record with the same id.
    */
    pub fn insert_business(
        connection: &PooledConnection<SqliteConnectionManager>,
        id: &str,
        record: &str,
    ) -> rusqlite::Result<()> {
        connection.execute(
            &format!(
                "INSERT OR REPLACE INTO {} (id, record) VALUES (?1, ?2)",
                BUSINESS_TABLE
            ),
            rusqlite::params![id, record],
        )?;
        Ok(())
    }

    /**
    Insert many business records in one transaction.

    `data` is a `Vec` of tuples of (id, record).
    */
    pub fn insert_many_businesses(
        connection: &mut PooledConnection<SqliteConnectionManager>,
        data: Vec<(String, String)>,
    ) -> rusqlite::Result<()> {
        let transaction = connection.transaction()?;
        {
            let mut statement = transaction.prepare(&format!(
                "INSERT OR REPLACE INTO {} (id, record) VALUES (?1, ?2)",
                BUSINESS_TABLE
            ))?;
            for (id, record) in data {
                statement.execute(rusqlite::params![id, record])?;
            }
        }
        transaction.commit()
    }

    /**
    Get the raw record for one business.

    Returns an `Ok(None)` if there is no business with that id.
    */
    pub fn query_business(
        connection: &PooledConnection<SqliteConnectionManager>,
        id: &str,
    ) -> rusqlite::Result<Option<String>> {
        let mut statement = connection.prepare(&format!(
            "SELECT record FROM {} WHERE id = ?1",
            BUSINESS_TABLE
        ))?;
        let mut data = statement.query(rusqlite::params![id])?;
        match data.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    /**
    Get every (id, record) pair, ordered by id.
    */
    pub fn query_all_businesses(
        connection: &PooledConnection<SqliteConnectionManager>,
    ) -> rusqlite::Result<Vec<(String, String)>> {
        let mut statement = connection.prepare(&format!(
            "SELECT id, record FROM {} ORDER BY id",
            BUSINESS_TABLE
        ))?;
        let rows = statement.query_map((), |row| {
            let id: String = row.get(0)?;
            let record: String = row.get(1)?;
            Ok((id, record))
        })?;

        let mut data: Vec<(String, String)> = Vec::new();
        for row in rows {
            data.push(row?);
        }
        Ok(data)
    }
}
