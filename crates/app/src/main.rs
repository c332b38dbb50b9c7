use std::fmt;
use std::path::PathBuf;

use quiz_core::model::{AppSettingsDraft, LessonId, Topic};
use services::{AppServices, Clock, SelectionPolicy};
use tracing_subscriber::EnvFilter;

mod play;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidTopic { raw: String },
    InvalidCount { raw: String },
    InvalidPolicy { raw: String },
    InvalidRatio { raw: String },
    InvalidLimit { raw: String },
    MissingLesson,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidTopic { raw } => write!(f, "invalid --topic value: {raw}"),
            ArgsError::InvalidCount { raw } => write!(f, "invalid --count value: {raw}"),
            ArgsError::InvalidPolicy { raw } => write!(f, "invalid --policy value: {raw}"),
            ArgsError::InvalidRatio { raw } => write!(f, "invalid passing ratio: {raw}"),
            ArgsError::InvalidLimit { raw } => write!(f, "invalid --limit value: {raw}"),
            ArgsError::MissingLesson => {
                write!(f, "lesson requires --lesson <id> (see the lessons subcommand)")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Quiz,
    Lessons,
    Lesson,
    Matching,
    Streak,
    Theme,
    History,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "quiz" => Some(Self::Quiz),
            "lessons" => Some(Self::Lessons),
            "lesson" => Some(Self::Lesson),
            "matching" => Some(Self::Matching),
            "streak" => Some(Self::Streak),
            "theme" => Some(Self::Theme),
            "history" => Some(Self::History),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    pool_dir: PathBuf,
    progress_url: Option<String>,
    passing_ratio: Option<f64>,
    topic: Topic,
    count: Option<i64>,
    policy: SelectionPolicy,
    lesson: Option<LessonId>,
    search: Option<String>,
    toggle: bool,
    limit: u32,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- quiz     [--topic <name[/section]>] [--section <s>] [--count <n>] [--policy sequential|random]");
    eprintln!("  cargo run -p app -- lessons  [--search <text>]");
    eprintln!("  cargo run -p app -- lesson   --lesson <id>");
    eprintln!("  cargo run -p app -- matching");
    eprintln!("  cargo run -p app -- streak");
    eprintln!("  cargo run -p app -- theme    [--toggle]");
    eprintln!("  cargo run -p app -- history  [--limit <n>]");
    eprintln!();
    eprintln!("Common options:");
    eprintln!("  --db <sqlite_url>     (default: sqlite://quiz.sqlite3)");
    eprintln!("  --dir <path>          directory of JSON question pools (default: data)");
    eprintln!("  --progress-url <url>  post progress to a remote server instead of SQLite");
    eprintln!("  --ratio <0..1>        passing ratio (default: 0.6)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_POOL_DIR, QUIZ_PROGRESS_URL, QUIZ_PASSING_RATIO, RUST_LOG");
}

impl Args {
    fn from_env() -> Result<Self, ArgsError> {
        let db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url);
        let pool_dir =
            PathBuf::from(std::env::var("QUIZ_POOL_DIR").unwrap_or_else(|_| "data".into()));
        let progress_url = std::env::var("QUIZ_PROGRESS_URL")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let passing_ratio = std::env::var("QUIZ_PASSING_RATIO")
            .ok()
            .map(|raw| parse_ratio(&raw))
            .transpose()?;

        Ok(Self {
            db_url,
            pool_dir,
            progress_url,
            passing_ratio,
            topic: Topic::new("quiz_pool"),
            count: None,
            policy: SelectionPolicy::Random,
            lesson: None,
            search: None,
            toggle: false,
            limit: 10,
        })
    }

    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::from_env()?;
        let mut section = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--dir" => parsed.pool_dir = PathBuf::from(require_value(args, "--dir")?),
                "--progress-url" => parsed.progress_url = Some(require_value(args, "--progress-url")?),
                "--ratio" => parsed.passing_ratio = Some(parse_ratio(&require_value(args, "--ratio")?)?),
                "--topic" => {
                    let value = require_value(args, "--topic")?;
                    parsed.topic = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidTopic { raw: value.clone() })?;
                }
                "--section" => section = Some(require_value(args, "--section")?),
                "--count" => {
                    let value = require_value(args, "--count")?;
                    let count = value
                        .trim()
                        .parse::<i64>()
                        .map_err(|_| ArgsError::InvalidCount { raw: value.clone() })?;
                    parsed.count = Some(count);
                }
                "--policy" => {
                    let value = require_value(args, "--policy")?;
                    parsed.policy = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidPolicy { raw: value.clone() })?;
                }
                "--lesson" => parsed.lesson = Some(LessonId::new(require_value(args, "--lesson")?)),
                "--search" => parsed.search = Some(require_value(args, "--search")?),
                "--toggle" => parsed.toggle = true,
                "--limit" => {
                    let value = require_value(args, "--limit")?;
                    parsed.limit = value
                        .trim()
                        .parse()
                        .map_err(|_| ArgsError::InvalidLimit { raw: value.clone() })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if let Some(section) = section {
            parsed.topic = parsed.topic.with_section(section);
        }
        Ok(parsed)
    }
}

fn parse_ratio(raw: &str) -> Result<f64, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidRatio { raw: raw.to_string() })
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let cmd = match argv.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let mut draft = AppSettingsDraft::new();
    draft.progress_base_url = args.progress_url.clone();
    draft.passing_ratio = args.passing_ratio;
    let settings = draft.validate()?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&args.db_url)?;
    let services = AppServices::new_sqlite(
        &args.db_url,
        args.pool_dir.clone(),
        Clock::default_clock(),
        settings,
    )
    .await?;
    tracing::debug!(db = %args.db_url, pools = %args.pool_dir.display(), ?cmd, "services ready");

    let mut terminal = play::Terminal::stdin();
    match cmd {
        Command::Quiz => {
            play::run_quiz(&services, &mut terminal, &args.topic, args.count, args.policy).await
        }
        Command::Lessons => {
            let lessons = services.lessons().list(args.search.as_deref()).await?;
            play::print_catalog(&lessons, args.search.as_deref());
            Ok(())
        }
        Command::Lesson => {
            let lesson = args.lesson.clone().ok_or(ArgsError::MissingLesson)?;
            play::run_lesson(&services, &mut terminal, lesson).await
        }
        Command::Matching => play::run_matching(&services, &mut terminal).await,
        Command::Streak => {
            let streak = services.preferences().check_in().await?;
            let days = if streak.count() == 1 { "day" } else { "days" };
            println!("Login streak: {} {days}", streak.count());
            Ok(())
        }
        Command::Theme => {
            let prefs = services.preferences();
            let theme = if args.toggle {
                prefs.toggle_theme().await?
            } else {
                prefs.theme().await?
            };
            println!("Theme: {theme}");
            Ok(())
        }
        Command::History => {
            let records = services.quiz_loop().recent_progress(args.limit).await?;
            if records.is_empty() {
                println!("No progress recorded yet.");
            }
            for record in records {
                println!(
                    "{}  {:<14} {:>4} pts",
                    record.recorded_at().format("%Y-%m-%d %H:%M"),
                    record.activity(),
                    record.daily_points()
                );
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
