mod chunk;
mod db;
mod export;
mod fetch;
mod llm;
mod normalize;
mod prompt;
mod table;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use crate::normalize::NormalizedText;
use crate::table::{NoTableReason, TableOutcome};

/// Chunk bound for prompt payloads. Content above this still goes out
/// unchunked; the chunker only informs the warning.
const MAX_PROMPT_CHARS: usize = 6000;
const PREVIEW_LINES: usize = 15;

#[derive(Parser)]
#[command(
    name = "llm_scraper",
    about = "Scrape a web page and extract tabular data from it with an LLM"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a page in a headless browser, clean it, and store the text
    Scrape {
        url: String,
        /// Print the full cleaned text instead of a preview
        #[arg(long)]
        full: bool,
    },
    /// Ask the model to extract a table from a stored page
    Extract {
        /// What to extract, in natural language
        query: String,
        /// Page id (default: most recently scraped)
        #[arg(short, long)]
        page: Option<i64>,
        /// Model id on the inference API
        #[arg(short, long, default_value = llm::DEFAULT_MODEL)]
        model: String,
        /// Write the parsed table to a CSV file
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Also print the raw model output
        #[arg(long)]
        raw: bool,
    },
    /// Scrape + extract in one pipeline
    Run {
        url: String,
        query: String,
        #[arg(short, long, default_value = llm::DEFAULT_MODEL)]
        model: String,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// List stored pages
    Pages,
    /// Print a stored page's cleaned text
    Show {
        /// Page id (default: most recently scraped)
        #[arg(short, long)]
        page: Option<i64>,
    },
    /// Show session statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scrape { url, full } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            scrape_page(&conn, &url, full).await.map(|_| ())
        }
        Commands::Extract { query, page, model, out, raw } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let Some(page) = load_page(&conn, page)? else {
                return Ok(());
            };
            extract_from_page(&conn, &page, &query, &model, out.as_deref(), raw).await
        }
        Commands::Run { url, query, model, out } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let Some(page_id) = scrape_page(&conn, &url, false).await? else {
                return Ok(());
            };
            let page = db::get_page(&conn, page_id)?
                .ok_or_else(|| anyhow::anyhow!("Page {} vanished from the store", page_id))?;
            extract_from_page(&conn, &page, &query, &model, out.as_deref(), false).await
        }
        Commands::Pages => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = db::list_pages(&conn)?;
            if pages.is_empty() {
                println!("No pages stored.");
                return Ok(());
            }
            println!(
                "{:>3} | {:<48} | {:>6} | {:>8} | {:<19}",
                "id", "URL", "Lines", "Chars", "Fetched"
            );
            println!("{}", "-".repeat(96));
            for p in &pages {
                println!(
                    "{:>3} | {:<48} | {:>6} | {:>8} | {:<19}",
                    p.id,
                    truncate(&p.url, 48),
                    p.line_count,
                    p.char_count,
                    p.fetched_at,
                );
            }
            Ok(())
        }
        Commands::Show { page } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            match load_page(&conn, page)? {
                Some(p) => {
                    println!("# page {} — {}\n", p.id, p.url);
                    println!("{}", p.content);
                    Ok(())
                }
                None => Ok(()),
            }
        }
        Commands::Stats => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Pages:       {}", s.pages);
            println!("Extractions: {}", s.extractions);
            println!("  tables:    {}", s.tables);
            println!("  empty:     {}", s.empty);
            println!("  no table:  {}", s.no_table);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Fetch + normalize + store one page. Returns the new page id, or `None`
/// when the page yielded no usable content (not an error).
async fn scrape_page(conn: &rusqlite::Connection, url: &str, full: bool) -> Result<Option<i64>> {
    let pb = spinner("Scraping the page...");
    let fetch_url = url.to_string();
    let html = tokio::task::spawn_blocking(move || fetch::fetch_page(&fetch_url)).await??;
    pb.finish_and_clear();

    let Some(region) = normalize::extract_body(&html) else {
        println!("No content region found on {}.", url);
        return Ok(None);
    };

    let text = normalize::clean_text(&region);
    if text.is_empty() {
        println!("Page had no readable text after cleaning.");
        return Ok(None);
    }

    let content = text.as_text();
    let id = db::save_page(conn, url, &content)?;
    println!(
        "Stored page {} ({} lines, {} chars).",
        id,
        text.lines().len(),
        content.len()
    );

    if full {
        println!("\n{}", content);
    } else {
        for line in text.lines().iter().take(PREVIEW_LINES) {
            println!("  {}", line);
        }
        if text.lines().len() > PREVIEW_LINES {
            println!(
                "  ... ({} more lines, see 'show')",
                text.lines().len() - PREVIEW_LINES
            );
        }
    }

    Ok(Some(id))
}

/// One extraction request: build the prompt, call the model, interpret the
/// output, render/export, and log the outcome.
async fn extract_from_page(
    conn: &rusqlite::Connection,
    page: &db::PageRow,
    query: &str,
    model: &str,
    out: Option<&std::path::Path>,
    show_raw: bool,
) -> Result<()> {
    let text = NormalizedText::from_text(&page.content);
    let chunks = chunk::chunk(&text, MAX_PROMPT_CHARS);
    if chunks.len() > 1 {
        warn!(
            "Cleaned text is {} chars ({} chunks at {}); sending unchunked",
            page.content.len(),
            chunks.len(),
            MAX_PROMPT_CHARS
        );
    }

    let prompt = prompt::build_prompt(query, &page.content);

    let pb = spinner("Waiting for the model...");
    let client = reqwest::Client::new();
    let raw = llm::generate(&client, model, &prompt).await;
    pb.finish_and_clear();
    let raw = raw?;

    let outcome = table::extract_table(&raw);
    let (outcome_kind, row_count) = match &outcome {
        TableOutcome::Empty => {
            println!("No matching information found.");
            ("empty", None)
        }
        TableOutcome::NoTable { raw, reason: NoTableReason::NoDelimiter } => {
            println!("Model returned unstructured output:\n");
            println!("{}", raw);
            ("no_table", None)
        }
        TableOutcome::NoTable { raw, reason } => {
            println!("Could not parse a table ({}). Raw output:\n", reason);
            println!("{}", raw);
            ("no_table", None)
        }
        TableOutcome::Table(t) => {
            print_table(t);
            if let Some(path) = out {
                export::write_csv(t, path)?;
                println!("\nWrote {} rows to {}", t.rows.len(), path.display());
            }
            ("table", Some(t.rows.len() as i64))
        }
    };

    if show_raw && !matches!(outcome, TableOutcome::NoTable { .. }) {
        println!("\n--- Raw output ---\n{}", raw);
    }

    db::save_extraction(
        conn,
        &db::ExtractionLog {
            page_id: page.id,
            query,
            model,
            outcome: outcome_kind,
            row_count,
            raw_output: &raw,
        },
    )?;

    Ok(())
}

/// Resolve the target page for an extraction or show: an explicit id, or the
/// most recently scraped page. Prints the miss reason itself.
fn load_page(conn: &rusqlite::Connection, id: Option<i64>) -> Result<Option<db::PageRow>> {
    match id {
        Some(id) => {
            let page = db::get_page(conn, id)?;
            if page.is_none() {
                println!("No page with id {}.", id);
            }
            Ok(page)
        }
        None => {
            let page = db::latest_page(conn)?;
            if page.is_none() {
                println!("No scraped pages yet. Run 'scrape <url>' first.");
            }
            Ok(page)
        }
    }
}

/// Render a parsed table with per-column widths, capped so one verbose cell
/// doesn't blow up the layout.
fn print_table(table: &table::ParsedTable) {
    const MAX_COL_WIDTH: usize = 40;

    let cols = table.header.len();
    let mut widths: Vec<usize> = table.header.iter().map(|h| h.chars().count()).collect();
    for row in &table.rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }
    for w in &mut widths {
        *w = (*w).min(MAX_COL_WIDTH);
    }

    let print_row = |cells: &[String]| {
        let formatted: Vec<String> = (0..cols)
            .map(|i| {
                format!(
                    "{:<width$}",
                    truncate(&cells[i], MAX_COL_WIDTH),
                    width = widths[i]
                )
            })
            .collect();
        println!("| {} |", formatted.join(" | "));
    };

    print_row(&table.header);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    println!("|-{}-|", rule.join("-|-"));
    for row in &table.rows {
        print_row(row);
    }
    println!("\n{} rows", table.rows.len());
}

fn spinner(msg: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
