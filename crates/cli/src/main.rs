// StreamGrid CLI - headless data-grid operations

mod exit_codes;
mod schema;
mod table;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use exit_codes::{EXIT_ERROR, EXIT_IO, EXIT_PARSE, EXIT_USAGE};
use streamgrid_config::layout::LayoutStore;
use streamgrid_config::settings::Settings;
use streamgrid_engine::events::GridEvent;
use streamgrid_engine::filter::{ColumnPredicate, FilterSpec, PredicateOp};
use streamgrid_engine::grid::{Grid, GridOptions};
use streamgrid_engine::sort::{SortDirection, SortSpec};
use streamgrid_engine::viewport::RowRange;
use streamgrid_io::csv as csv_io;
use streamgrid_io::events as event_io;

#[derive(Parser)]
#[command(name = "sgrid")]
#[command(about = "Headless data-grid viewer: virtualized views over CSV row sets")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// View-state flags shared by `view` and `replay`.
#[derive(Args)]
struct ViewFlags {
    /// Grid schema file (TOML [[column]] entries)
    #[arg(long, value_name = "FILE")]
    schema: PathBuf,

    /// Free-text filter over searchable columns
    #[arg(long, value_name = "TEXT")]
    quick_filter: Option<String>,

    /// Column predicate, repeatable.
    /// OP: equals, contains, before, after, greater, less, empty
    #[arg(long, value_name = "COL:OP[:VALUE]")]
    filter: Vec<String>,

    /// Sort column and direction
    #[arg(long, value_name = "COL[:asc|desc]")]
    sort: Option<String>,

    /// Group by columns, outermost first
    #[arg(long, value_name = "COL[,COL...]")]
    group: Option<String>,

    /// Scroll offset in pixels (enables windowed output)
    #[arg(long, value_name = "PX")]
    offset: Option<u32>,

    /// Container height in pixels (enables windowed output)
    #[arg(long, value_name = "PX")]
    height: Option<u32>,

    /// Export the visible set as CSV to a file, or - for stdout
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Suppress stderr notes (skipped lines, dropped events)
    #[arg(long, short = 'q')]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a CSV row set, apply view state, print the visible window
    #[command(after_help = "\
Examples:
  sgrid view people.csv --schema grid.toml
  sgrid view people.csv --schema grid.toml --sort salary:desc --group dept
  sgrid view people.csv --schema grid.toml --filter 'dept:equals:Eng'
  sgrid view people.csv --schema grid.toml --quick-filter ann
  sgrid view people.csv --schema grid.toml --offset 2000 --height 800
  sgrid view people.csv --schema grid.toml --export - | head -5")]
    View {
        /// CSV data file (header row maps fields to column keys)
        data: PathBuf,

        #[command(flatten)]
        flags: ViewFlags,
    },

    /// Load a CSV row set, apply an NDJSON event file, then view
    #[command(after_help = "\
Examples:
  sgrid replay people.csv pushed.ndjson --schema grid.toml
  sgrid replay people.csv pushed.ndjson --schema grid.toml --summary
  sgrid replay people.csv pushed.ndjson --schema grid.toml --export out.csv")]
    Replay {
        /// CSV data file
        data: PathBuf,

        /// NDJSON change-event file, applied in line order
        events: PathBuf,

        #[command(flatten)]
        flags: ViewFlags,

        /// Print reconcile totals before the window
        #[arg(long)]
        summary: bool,
    },

    /// Inspect or clear persisted column layouts
    Layout {
        #[command(subcommand)]
        command: LayoutCommands,
    },
}

#[derive(Subcommand)]
enum LayoutCommands {
    /// Print the persisted layout for a grid key
    Show {
        /// Grid instance key, e.g. employees.main
        grid_key: String,
    },
    /// Remove the persisted layout for a grid key
    Reset {
        grid_key: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::View { data, flags } => cmd_view(&data, &flags),
        Commands::Replay { data, events, flags, summary } => {
            cmd_replay(&data, &events, &flags, summary)
        }
        Commands::Layout { command } => match command {
            LayoutCommands::Show { grid_key } => cmd_layout_show(&grid_key),
            LayoutCommands::Reset { grid_key } => cmd_layout_reset(&grid_key),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self { code: EXIT_PARSE, message: msg.into(), hint: None }
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ---------------------------------------------------------------------------
// view / replay

fn cmd_view(data: &Path, flags: &ViewFlags) -> Result<(), CliError> {
    let mut grid = build_grid(data, flags)?;
    apply_view_flags(&mut grid, flags)?;
    print_output(&mut grid, flags)
}

fn cmd_replay(
    data: &Path,
    events: &Path,
    flags: &ViewFlags,
    summary: bool,
) -> Result<(), CliError> {
    let mut grid = build_grid(data, flags)?;
    apply_view_flags(&mut grid, flags)?;

    let log = event_io::read_events(events).map_err(CliError::io)?;
    if log.skipped_lines > 0 && !flags.quiet {
        eprintln!("note: skipped {} non-JSON event lines", log.skipped_lines);
    }

    let quiet = flags.quiet;
    grid.set_event_callback(Box::new(move |event| {
        if let GridEvent::EventDropped { reason } = event {
            if !quiet {
                eprintln!("note: dropped event: {}", reason);
            }
        }
    }));
    grid.apply_changes(&log.events);

    if summary {
        let stats = grid.reconcile_stats();
        println!("applied:  {}", stats.applied());
        println!("  inserted:         {}", stats.inserted);
        println!("  replaced:         {}", stats.replaced);
        println!("  implicit created: {}", stats.implicit_created);
        println!("  removed:          {}", stats.removed);
        println!("ignored:  {}", stats.ignored);
        println!("dropped:  {}", stats.dropped);
    }

    print_output(&mut grid, flags)
}

/// Parse the schema, import the data file, and stand up a grid sized from
/// persisted settings.
fn build_grid(data: &Path, flags: &ViewFlags) -> Result<Grid, CliError> {
    let schema_text = std::fs::read_to_string(&flags.schema)
        .map_err(|e| CliError::io(format!("cannot read {}: {}", flags.schema.display(), e)))?;
    let columns = schema::parse(&schema_text).map_err(CliError::parse)?;

    let settings = Settings::load();
    let options = GridOptions {
        row_height: settings.row_height,
        header_height: settings.header_height,
        overscan: settings.overscan,
        container_height: flags.height.unwrap_or(600),
        default_column_width: settings.default_column_width,
    };

    let (rows, report) = csv_io::import(data, &columns).map_err(CliError::io)?;
    if !flags.quiet && (report.skipped_lines > 0 || report.coercion_failures > 0) {
        eprintln!(
            "note: skipped {} lines, {} cells failed coercion",
            report.skipped_lines, report.coercion_failures
        );
    }

    let mut grid = Grid::with_options(columns, options);
    grid.load_rows(rows);
    Ok(grid)
}

fn apply_view_flags(grid: &mut Grid, flags: &ViewFlags) -> Result<(), CliError> {
    let mut filter = FilterSpec::default();
    if let Some(text) = &flags.quick_filter {
        filter.quick = text.clone();
    }
    for raw in &flags.filter {
        filter.predicates.push(parse_predicate(raw)?);
    }
    if !filter.is_passthrough() {
        grid.on_filter_change(filter);
    }

    if let Some(raw) = &flags.sort {
        grid.on_sort_change(Some(parse_sort(raw)?));
    }

    if let Some(raw) = &flags.group {
        let path: Vec<String> =
            raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect();
        grid.on_group_path_change(path);
    }
    Ok(())
}

fn print_output(grid: &mut Grid, flags: &ViewFlags) -> Result<(), CliError> {
    if let Some(target) = &flags.export {
        let delimiter = Settings::load().export_delimiter_byte();
        if target.as_os_str() == "-" {
            let csv = csv_io::export_visible(grid, delimiter).map_err(CliError::other)?;
            print!("{}", csv);
        } else {
            csv_io::export_visible_to(grid, target, delimiter).map_err(CliError::io)?;
        }
        return Ok(());
    }

    // windowed when scroll geometry is given, the whole display otherwise
    let rows = if flags.offset.is_some() || flags.height.is_some() {
        grid.scroll_to(flags.offset.unwrap_or(0));
        grid.render_window()
    } else {
        let len = grid.display_len();
        grid.render(RowRange { first: 0, last: len.saturating_sub(1) })
    };

    let headers: Vec<String> =
        grid.visible_columns().iter().map(|c| c.label.clone()).collect();
    print!("{}", table::format_window(&headers, &rows));
    Ok(())
}

// ---------------------------------------------------------------------------
// flag parsing

/// `COL:OP[:VALUE]`, e.g. `dept:equals:Eng` or `notes:empty`.
fn parse_predicate(raw: &str) -> Result<ColumnPredicate, CliError> {
    let mut parts = raw.splitn(3, ':');
    let column = parts.next().unwrap_or_default();
    let op_text = parts.next().unwrap_or_default();
    let value = parts.next().unwrap_or_default();

    if column.is_empty() || op_text.is_empty() {
        return Err(CliError::usage(format!("bad filter '{}'", raw))
            .with_hint("expected COL:OP[:VALUE], e.g. dept:equals:Eng"));
    }

    let op = match op_text {
        "equals" => PredicateOp::Equals,
        "contains" => PredicateOp::Contains,
        "before" => PredicateOp::Before,
        "after" => PredicateOp::After,
        "greater" => PredicateOp::Greater,
        "less" => PredicateOp::Less,
        "empty" => PredicateOp::IsEmpty,
        other => {
            return Err(CliError::usage(format!("unknown filter operator '{}'", other))
                .with_hint("operators: equals, contains, before, after, greater, less, empty"));
        }
    };

    if op.takes_value() && value.is_empty() {
        return Err(CliError::usage(format!("filter '{}' needs a value", raw)));
    }
    Ok(ColumnPredicate::new(column, op, value))
}

/// `COL[:asc|desc]`; direction defaults to ascending.
fn parse_sort(raw: &str) -> Result<SortSpec, CliError> {
    let (column, direction) = match raw.split_once(':') {
        None => (raw, SortDirection::Ascending),
        Some((col, "asc")) => (col, SortDirection::Ascending),
        Some((col, "desc")) => (col, SortDirection::Descending),
        Some((_, other)) => {
            return Err(CliError::usage(format!("unknown sort direction '{}'", other))
                .with_hint("expected COL:asc or COL:desc"));
        }
    };
    if column.is_empty() {
        return Err(CliError::usage(format!("bad sort '{}'", raw)));
    }
    Ok(SortSpec { column: column.to_string(), direction })
}

// ---------------------------------------------------------------------------
// layout

fn cmd_layout_show(grid_key: &str) -> Result<(), CliError> {
    let store = LayoutStore::load();
    match store.get(grid_key) {
        Some(states) => {
            println!("{:<20} {:>6} {:>8} {:>6}", "column", "width", "visible", "order");
            for state in states {
                println!(
                    "{:<20} {:>6} {:>8} {:>6}",
                    state.key, state.width, state.visible, state.position
                );
            }
            Ok(())
        }
        None => {
            println!("no layout stored for '{}'", grid_key);
            Ok(())
        }
    }
}

fn cmd_layout_reset(grid_key: &str) -> Result<(), CliError> {
    let mut store = LayoutStore::load();
    if store.reset(grid_key) {
        store.save().map_err(CliError::io)?;
        println!("layout for '{}' removed", grid_key);
    } else {
        println!("no layout stored for '{}'", grid_key);
    }
    Ok(())
}
