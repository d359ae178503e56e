//! OnClass Analyzer CLI

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args as ClapArgs, Parser, Subcommand};
use colored::Colorize;
use onclass_analyzer::analyzer::{AnalysisEngine, DetailList, DetailTarget, DetailView};
use onclass_analyzer::config::{
    load_config, starter_config, write_starter_config, Config, CONFIG_FILENAME,
};
use onclass_analyzer::reporter::markdown::default_filename;
use onclass_analyzer::reporter::{ConsoleReporter, DashboardReport, JsonReporter, MarkdownReporter};
use onclass_analyzer::watcher::ExportWatcher;
use onclass_analyzer::{CourseFilter, Intent, Session, SortKey};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// OnClass Analyzer: sentiment, rankings, keywords and engagement from feedback exports
#[derive(Parser, Debug)]
#[command(name = "onclass")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
#[command(subcommand_negates_reqs = true)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Feedback export (.json, or - for stdin); omit when using a subcommand
    #[arg(required = true)]
    path: Option<PathBuf>,

    #[command(flatten)]
    view: ViewArgs,

    /// Output format as JSON
    #[arg(long, short, conflicts_with = "markdown")]
    json: bool,

    /// Export a Markdown report (default file: onclass-analysis[-TAG]-YYYY-MM-DD.md)
    #[arg(long, short)]
    markdown: bool,

    /// Write the report to this file instead of stdout
    #[arg(long, short, value_name = "PATH")]
    out: Option<PathBuf>,

    /// Minimum sentiment score, positive% minus negative% (exit 1 if below)
    #[arg(long, short, allow_negative_numbers = true)]
    threshold: Option<i32>,

    /// Watch the export and re-analyze on change
    #[arg(long)]
    watch: bool,

    /// Quiet mode (one summary line)
    #[arg(long, short)]
    quiet: bool,

    /// Verbose output (timeline and sample comments)
    #[arg(long, short)]
    verbose: bool,

    #[command(flatten)]
    common: CommonArgs,
}

/// Options shared by every command that reads an export
#[derive(ClapArgs, Debug, Clone)]
struct CommonArgs {
    /// Path to config file (default: search .onclassrc.json in the export's directory and parents)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

/// Filter and ranking options
#[derive(ClapArgs, Debug, Clone, Default)]
struct ViewArgs {
    /// Course filter: all, jfya, salon, sc, fc, pre
    #[arg(long, short)]
    filter: Option<String>,

    /// User table sort: count, positive, negative
    #[arg(long, value_name = "KEY")]
    user_sort: Option<SortKey>,

    /// Block ranking sort: count, positive, negative
    #[arg(long, value_name = "KEY")]
    block_sort: Option<SortKey>,

    /// Teacher ranking sort: count, positive, negative
    #[arg(long, value_name = "KEY")]
    teacher_sort: Option<SortKey>,

    /// Teacher ranking page, starting at 1
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    teacher_page: Option<u32>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the feedback behind a teacher, block, user, or keyword
    Detail {
        /// Feedback export (.json, or - for stdin)
        path: PathBuf,

        #[command(flatten)]
        target: TargetArgs,

        /// Course filter: all, jfya, salon, sc, fc, pre
        #[arg(long, short)]
        filter: Option<String>,

        /// Output format as JSON
        #[arg(long, short)]
        json: bool,
    },

    /// Search users by name
    Users {
        /// Feedback export (.json, or - for stdin)
        path: PathBuf,

        /// Case-insensitive name fragment (default: everyone)
        #[arg(long, short = 'Q', default_value = "")]
        query: String,

        /// Show each user's feedback under their row
        #[arg(long, short)]
        expand: bool,

        /// Course filter: all, jfya, salon, sc, fc, pre
        #[arg(long, short)]
        filter: Option<String>,

        /// Output format as JSON
        #[arg(long, short)]
        json: bool,
    },

    /// Create .onclassrc.json with sensible defaults
    Init {
        /// Directory in which to create config (default: current)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Default course filter
        #[arg(long)]
        filter: Option<String>,

        /// Minimum sentiment score
        #[arg(long, allow_negative_numbers = true)]
        threshold: Option<i32>,
    },
}

/// Exactly one drill-down target
#[derive(ClapArgs, Debug)]
#[group(required = true, multiple = false)]
struct TargetArgs {
    /// Teacher name as shown in the ranking (e.g. 田中先生)
    #[arg(long)]
    teacher: Option<String>,

    /// Block name
    #[arg(long)]
    block: Option<String>,

    /// User name
    #[arg(long)]
    user: Option<String>,

    /// Any feedback containing this keyword
    #[arg(long)]
    keyword: Option<String>,

    /// Negative feedback containing this keyword
    #[arg(long)]
    improvement: Option<String>,
}

impl TargetArgs {
    fn into_target(self) -> Option<DetailTarget> {
        self.teacher
            .map(DetailTarget::Teacher)
            .or(self.block.map(DetailTarget::Block))
            .or(self.user.map(DetailTarget::User))
            .or(self.keyword.map(DetailTarget::Keyword))
            .or(self.improvement.map(DetailTarget::Improvement))
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<ExitCode> {
    let mut args = Args::parse();
    init_tracing(&args.common.log_level);
    debug!("onclass v{} starting", env!("CARGO_PKG_VERSION"));

    if let Some(cmd) = args.command.take() {
        return match cmd {
            Commands::Detail {
                path,
                target,
                filter,
                json,
            } => run_detail(&path, target, filter.as_deref(), json, &args.common),
            Commands::Users {
                path,
                query,
                expand,
                filter,
                json,
            } => run_users(&path, &query, expand, filter.as_deref(), json, &args.common),
            Commands::Init {
                dir,
                filter,
                threshold,
            } => run_init(dir.as_deref(), filter.as_deref(), threshold),
        };
    }

    let path = args
        .path
        .clone()
        .context("an export path is required when not using a subcommand")?;
    let config = load_run_config(&path, &args.common, args.view.filter.as_deref(), args.threshold)?;

    let mut session = Session::new(AnalysisEngine::from_config(&config));
    session.load_path(&path)?;
    apply_view(&mut session, &config, &args.view);

    if args.watch {
        return run_watch(&args, &path, &mut session);
    }

    let report = session.report().context("no dataset loaded")?;
    emit(&report, &args)?;

    if let Some(threshold) = config.threshold {
        if report.below_threshold(threshold) {
            if !args.quiet {
                eprintln!(
                    "{}: sentiment score {} is below threshold {}",
                    "Warning".yellow(),
                    report.sentiment_score().unwrap_or_default(),
                    threshold
                );
            }
            return Ok(ExitCode::from(1));
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Directory used for config discovery: the export's parent, or cwd for stdin
fn work_dir_for(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if path != Path::new("-") && !parent.as_os_str().is_empty() => {
            parent.to_path_buf()
        }
        _ => PathBuf::from("."),
    }
}

fn load_run_config(
    path: &Path,
    common: &CommonArgs,
    cli_filter: Option<&str>,
    cli_threshold: Option<i32>,
) -> Result<Config> {
    let config = load_config(&work_dir_for(path), common.config.as_deref())?
        .merge_with_cli(cli_filter, cli_threshold);
    debug!(filter = config.filter_tag(), threshold = ?config.threshold, "config resolved");
    Ok(config)
}

fn apply_view(session: &mut Session, config: &Config, view: &ViewArgs) {
    session.dispatch(Intent::SetFilter(CourseFilter::from_tag(config.filter_tag())));
    if let Some(key) = view.user_sort {
        session.dispatch(Intent::SortUsers(key));
    }
    if let Some(key) = view.block_sort {
        session.dispatch(Intent::SortBlocks(key));
    }
    if let Some(key) = view.teacher_sort {
        session.dispatch(Intent::SortTeachers(key));
    }
    if let Some(page) = view.teacher_page {
        session.dispatch(Intent::SetTeacherPage((page as usize).saturating_sub(1)));
        let shown = session.state().teacher_page + 1;
        if shown < page as usize {
            eprintln!(
                "{}: teacher page {} does not exist, showing page {}",
                "Warning".yellow(),
                page,
                shown
            );
        }
    }
}

/// Write `text` to `out`, or print it
fn write_or_print(text: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("Failed to write report to {}", path.display())),
        None => {
            print!("{}", text);
            Ok(())
        }
    }
}

fn emit(report: &DashboardReport, args: &Args) -> Result<()> {
    if args.markdown {
        let target = args.out.clone().unwrap_or_else(|| {
            PathBuf::from(default_filename(&report.filter, Local::now().date_naive()))
        });
        let text = MarkdownReporter::new().report(report);
        std::fs::write(&target, text)
            .with_context(|| format!("Failed to write Markdown report to {}", target.display()))?;
        if !args.quiet {
            eprintln!(
                "{}: Markdown report written to {}",
                "Info".blue(),
                target.display()
            );
        }
        return Ok(());
    }

    if args.json {
        let text = JsonReporter::new().pretty().report(report) + "\n";
        return write_or_print(&text, args.out.as_deref());
    }

    let mut reporter = ConsoleReporter::new();
    if args.verbose {
        reporter = reporter.verbose();
    }
    if args.out.is_some() {
        reporter = reporter.without_colors();
    }
    let text = if args.quiet {
        reporter.render_quiet(report) + "\n"
    } else {
        reporter.render(report)
    };
    write_or_print(&text, args.out.as_deref())
}

fn run_watch(args: &Args, path: &Path, session: &mut Session) -> Result<ExitCode> {
    if path == Path::new("-") {
        anyhow::bail!("--watch needs a file path, not stdin");
    }
    let watcher = ExportWatcher::watch(path).context("Failed to create file watcher")?;

    if let Some(report) = session.report() {
        emit(&report, args)?;
    }
    eprintln!("{}: Watching {} for changes... (Ctrl+C to stop)", "Info".blue(), watcher.path().display());

    loop {
        if !watcher.next_change(Duration::from_secs(3600)) {
            continue;
        }
        match session.reload_path(path) {
            Ok(()) => {
                info!(path = %path.display(), "export changed, re-analyzing");
                if let Some(report) = session.report() {
                    emit(&report, args)?;
                }
            }
            Err(e) => {
                eprintln!(
                    "{}: {}: {} (keeping previous data)",
                    "Error".red(),
                    path.display(),
                    e
                );
            }
        }
    }
}

fn run_detail(
    path: &Path,
    target: TargetArgs,
    filter: Option<&str>,
    json: bool,
    common: &CommonArgs,
) -> Result<ExitCode> {
    let target = target
        .into_target()
        .context("one of --teacher, --block, --user, --keyword, --improvement is required")?;
    let config = load_run_config(path, common, filter, None)?;
    let mut session = Session::new(AnalysisEngine::from_config(&config));
    session.load_path(path)?;
    session.dispatch(Intent::SetFilter(CourseFilter::from_tag(config.filter_tag())));

    let list = session.detail(target).context("no dataset loaded")?;
    if json {
        println!("{}", JsonReporter::new().pretty().report_detail(&list));
    } else {
        ConsoleReporter::new().report_detail(&list);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_users(
    path: &Path,
    query: &str,
    expand: bool,
    filter: Option<&str>,
    json: bool,
    common: &CommonArgs,
) -> Result<ExitCode> {
    let config = load_run_config(path, common, filter, None)?;
    let mut session = Session::new(AnalysisEngine::from_config(&config));
    session.load_path(path)?;
    session.dispatch(Intent::SetFilter(CourseFilter::from_tag(config.filter_tag())));

    let users = session.search_users(query);
    let refs: Vec<_> = users.iter().collect();
    if !expand {
        if json {
            println!("{}", JsonReporter::new().pretty().report_users(&refs));
        } else {
            ConsoleReporter::new().report_users(&refs);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let feedback: Vec<DetailList> = users
        .iter()
        .filter_map(|u| {
            session.detail_in(DetailTarget::User(u.name().to_string()), DetailView::Inline)
        })
        .collect();
    if json {
        println!(
            "{}",
            JsonReporter::new().pretty().report_users_expanded(&refs, &feedback)
        );
    } else {
        ConsoleReporter::new().report_users_expanded(&refs, &feedback);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_init(dir: Option<&Path>, filter: Option<&str>, threshold: Option<i32>) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let dir = dir.unwrap_or(&cwd);
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() {
        eprintln!(
            "{}: {} already exists; use --dir to write elsewhere or remove it first",
            "Warning".yellow(),
            config_path.display()
        );
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(tag) = filter {
        if let CourseFilter::Other(_) = CourseFilter::from_tag(tag) {
            eprintln!(
                "{}: unknown filter '{}' will show every course",
                "Warning".yellow(),
                tag
            );
        }
    }

    let written = write_starter_config(dir, &starter_config(filter, threshold))?;
    eprintln!("{}: Created {}", "Info".blue(), written.display());
    Ok(ExitCode::SUCCESS)
}
