mod app;
mod cache;
mod config;
mod funds;
mod logging;
mod params;
mod query;
mod sync;
mod view;

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use futures::stream::{self, StreamExt};
use std::path::PathBuf;

use crate::funds::{FundDetail, FundListItem};
use crate::params::{QueryParams, SortOrder};
use crate::view::{ListViewState, SyncState};

/// How many detail requests run at once.
const DETAIL_CONCURRENCY: usize = 4;

#[derive(Parser, Debug)]
#[command(name = "fundview")]
#[command(about = "Browse fund NAV listings through a local TTL cache")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/fundview/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Show one page of the fund list
  List {
    #[arg(long, default_value_t = 1)]
    page: u32,
    /// Rows per page (default from config)
    #[arg(long)]
    page_size: Option<u32>,
    /// Fund type filter
    #[arg(long = "type")]
    fund_type: Option<String>,
    /// Code or name search
    #[arg(long)]
    search: Option<String>,
    /// Sort column: nav, daily_change_pct, code or name
    #[arg(long)]
    sort_by: Option<String>,
    #[arg(long, default_value_t = SortOrder::Desc)]
    sort_order: SortOrder,
  },
  /// Show fund details and recent NAV history
  Detail {
    #[arg(required = true)]
    codes: Vec<String>,
  },
  /// Ask the service to re-ingest recent NAV data, then reload the list
  Sync {
    /// Lookback window in days (default from config)
    #[arg(long)]
    days: Option<u32>,
  },
  /// Maintain the local cache
  Cache {
    #[command(subcommand)]
    action: CacheAction,
  },
}

#[derive(Subcommand, Debug)]
enum CacheAction {
  /// Remove expired entries
  Purge,
  /// Remove every entry
  Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Keep the guard alive so buffered log lines are flushed on exit
  let _log_guard = match logging::log_dir() {
    Some(dir) => Some(logging::init(&dir)?),
    None => None,
  };

  let config = config::Config::load(args.config.as_deref())?;
  let mut app = app::App::from_config(&config)?;

  match args.command {
    Command::List {
      page,
      page_size,
      fund_type,
      search,
      sort_by,
      sort_order,
    } => {
      let params = QueryParams::new(page, page_size.unwrap_or(config.list.page_size))
        .with_fund_type(fund_type.as_deref())
        .with_search(search.as_deref())
        .with_sort(sort_by.as_deref(), sort_order);

      if let Some(column) = params.normalized().sort_by {
        if !crate::params::SORT_FIELDS.contains(&column.as_str()) {
          eprintln!("warning: unknown sort column '{}', the service will ignore it", column);
        }
      }

      app.on_params_changed(params);
      let state = app.settle().await;
      if let Some(notice) = &state.notice {
        return Err(eyre!("{}", notice));
      }
      print_list(state);
    }
    Command::Detail { codes } => {
      let fetch = app.fetch().clone();
      let results: Vec<_> = stream::iter(codes)
        .map(|code| {
          let fetch = fetch.clone();
          async move {
            let result = fetch.fetch_detail(&code).await;
            (code, result)
          }
        })
        .buffered(DETAIL_CONCURRENCY)
        .collect()
        .await;

      let mut failed = 0;
      for (code, result) in results {
        match result {
          Ok(detail) => print_detail(&detail),
          Err(e) => {
            eprintln!("{}: {}", code, e);
            failed += 1;
          }
        }
      }
      if failed > 0 {
        return Err(eyre!("{} fund(s) could not be loaded", failed));
      }
    }
    Command::Sync { days } => {
      let days = days.unwrap_or(config.sync.default_days);
      app.synchronize(days);
      let state = app.settle().await;

      match &state.sync {
        SyncState::Done(outcome) => {
          println!(
            "Synchronized {} day(s): {} NAV record(s) inserted ({:?})",
            days, outcome.inserted_count, outcome.status
          );
          if let Some(message) = &outcome.message {
            println!("{}", message);
          }
          for detail in outcome.details.iter().filter(|d| d.inserted > 0) {
            println!("  {}  +{} of {}", detail.code, detail.inserted, detail.fetched);
          }
          println!();
          print_list(state);
        }
        SyncState::Failed(message) => return Err(eyre!("{}", message)),
        SyncState::Idle | SyncState::Running { .. } => {
          return Err(eyre!("Synchronize did not complete"))
        }
      }
    }
    Command::Cache { action } => {
      let store = app.fetch().store();
      match action {
        CacheAction::Purge => println!("Purged {} expired entries", store.purge_expired()),
        CacheAction::Clear => println!("Removed {} entries", store.clear()),
      }
    }
  }

  Ok(())
}

fn print_list(state: &ListViewState) {
  if let Some(notice) = &state.notice {
    eprintln!("{}", notice);
  }

  println!(
    "{:<8} {:<32} {:<12} {:>10} {:>8} {:<10}",
    "CODE", "NAME", "TYPE", "NAV", "CHG%", "DATE"
  );
  for item in state.items() {
    println!("{}", list_row(item));
  }

  let params = state.params.normalized();
  println!(
    "Page {} of {} ({} funds)",
    params.page,
    state.page_count().max(1),
    state.total()
  );
}

fn list_row(item: &FundListItem) -> String {
  format!(
    "{:<8} {:<32} {:<12} {:>10} {:>8} {:<10}",
    item.code,
    truncate(&item.name, 32),
    item.fund_type.as_deref().unwrap_or("-"),
    item
      .nav
      .map(|n| format!("{:.4}", n))
      .unwrap_or_else(|| "-".into()),
    item
      .daily_change_pct
      .map(|p| format!("{:+.2}", p))
      .unwrap_or_else(|| "-".into()),
    item
      .nav_date
      .map(|d| d.to_string())
      .unwrap_or_else(|| "-".into()),
  )
}

fn print_detail(detail: &FundDetail) {
  println!("{}  {}", detail.code, detail.name);
  println!("  Type:    {}", detail.fund_type.as_deref().unwrap_or("-"));
  println!("  Added:   {}", detail.created_at.format("%Y-%m-%d %H:%M"));
  if let Some(latest) = detail.latest_nav() {
    println!("  Latest:  {:.4} on {}", latest.nav, latest.nav_date);
  }

  // Most recent points first
  for point in detail.navs.iter().rev().take(10) {
    let accumulated = point
      .accumulated_nav
      .map(|a| format!("{:.4}", a))
      .unwrap_or_else(|| "-".into());
    println!("    {}  {:>10.4}  {:>10}", point.nav_date, point.nav, accumulated);
  }
  println!();
}

fn truncate(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    s.to_string()
  } else {
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
  }
}
