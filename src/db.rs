use anyhow::Result;
use rusqlite::Connection;

const DB_PATH: &str = "data/scraper.sqlite";

pub fn connect() -> Result<Connection> {
    std::fs::create_dir_all("data")?;
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS pages (
            id         INTEGER PRIMARY KEY,
            url        TEXT NOT NULL,
            content    TEXT NOT NULL,
            line_count INTEGER NOT NULL,
            char_count INTEGER NOT NULL,
            fetched_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS extractions (
            id         INTEGER PRIMARY KEY,
            page_id    INTEGER NOT NULL REFERENCES pages(id),
            query      TEXT NOT NULL,
            model      TEXT NOT NULL,
            outcome    TEXT NOT NULL CHECK(outcome IN ('table','empty','no_table')),
            row_count  INTEGER,
            raw_output TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_extractions_page ON extractions(page_id);
        ",
    )?;
    Ok(())
}

// ── Pages ──

pub struct PageRow {
    pub id: i64,
    pub url: String,
    pub content: String,
}

pub struct PageSummary {
    pub id: i64,
    pub url: String,
    pub line_count: i64,
    pub char_count: i64,
    pub fetched_at: String,
}

/// Store one scraped page's cleaned text; returns the new page id.
pub fn save_page(conn: &Connection, url: &str, content: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO pages (url, content, line_count, char_count) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            url,
            content,
            content.lines().count() as i64,
            content.len() as i64,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_page(conn: &Connection, id: i64) -> Result<Option<PageRow>> {
    let mut stmt = conn.prepare("SELECT id, url, content FROM pages WHERE id = ?1")?;
    let mut rows = stmt.query_map([id], |row| {
        Ok(PageRow {
            id: row.get(0)?,
            url: row.get(1)?,
            content: row.get(2)?,
        })
    })?;
    rows.next().transpose().map_err(Into::into)
}

/// Most recently scraped page; the default target for `extract`.
pub fn latest_page(conn: &Connection) -> Result<Option<PageRow>> {
    let mut stmt =
        conn.prepare("SELECT id, url, content FROM pages ORDER BY id DESC LIMIT 1")?;
    let mut rows = stmt.query_map([], |row| {
        Ok(PageRow {
            id: row.get(0)?,
            url: row.get(1)?,
            content: row.get(2)?,
        })
    })?;
    rows.next().transpose().map_err(Into::into)
}

pub fn list_pages(conn: &Connection) -> Result<Vec<PageSummary>> {
    let mut stmt = conn.prepare(
        "SELECT id, url, line_count, char_count, fetched_at FROM pages ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(PageSummary {
                id: row.get(0)?,
                url: row.get(1)?,
                line_count: row.get(2)?,
                char_count: row.get(3)?,
                fetched_at: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Extractions ──

pub struct ExtractionLog<'a> {
    pub page_id: i64,
    pub query: &'a str,
    pub model: &'a str,
    /// 'table', 'empty', or 'no_table'
    pub outcome: &'a str,
    pub row_count: Option<i64>,
    pub raw_output: &'a str,
}

pub fn save_extraction(conn: &Connection, log: &ExtractionLog) -> Result<()> {
    conn.execute(
        "INSERT INTO extractions (page_id, query, model, outcome, row_count, raw_output)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            log.page_id, log.query, log.model, log.outcome, log.row_count, log.raw_output,
        ],
    )?;
    Ok(())
}

// ── Stats ──

pub struct Stats {
    pub pages: usize,
    pub extractions: usize,
    pub tables: usize,
    pub empty: usize,
    pub no_table: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let pages: usize = conn.query_row("SELECT COUNT(*) FROM pages", [], |r| r.get(0))?;
    let extractions: usize =
        conn.query_row("SELECT COUNT(*) FROM extractions", [], |r| r.get(0))?;
    let count_outcome = |outcome: &str| -> Result<usize> {
        conn.query_row(
            "SELECT COUNT(*) FROM extractions WHERE outcome = ?1",
            [outcome],
            |r| r.get(0),
        )
        .map_err(Into::into)
    };
    Ok(Stats {
        pages,
        extractions,
        tables: count_outcome("table")?,
        empty: count_outcome("empty")?,
        no_table: count_outcome("no_table")?,
    })
}

// ── Tests ──
