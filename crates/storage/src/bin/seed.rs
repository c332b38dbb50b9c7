use std::fmt;
use std::path::PathBuf;

use quiz_core::model::{Lesson, Question, QuestionPool, Topic};
use serde_json::{Map, Value};
use storage::repository::{LessonRepository, QuestionPoolRepository, Storage};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    pool_dir: PathBuf,
    force: bool,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidDir { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidDir { raw } => write!(f, "invalid --dir value: {raw}"),
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("QUIZ_DB_URL").unwrap_or_else(|_| "sqlite:quiz.sqlite3?mode=rwc".into());
        let mut pool_dir =
            PathBuf::from(std::env::var("QUIZ_POOL_DIR").unwrap_or_else(|_| "data".into()));
        let mut force = false;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--dir" => {
                    let value = require_value(&mut args, "--dir")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDir { raw: value });
                    }
                    pool_dir = PathBuf::from(value);
                }
                "--force" => force = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            pool_dir,
            force,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>   SQLite URL to migrate (default: sqlite:quiz.sqlite3?mode=rwc)");
    eprintln!("  --dir <path>        Directory for JSON question pools (default: data)");
    eprintln!("  --force             Overwrite existing pool and course files");
    eprintln!("  -h, --help          Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  QUIZ_DB_URL, QUIZ_POOL_DIR");
}

fn sample_assessment_pool() -> Result<Vec<Question>, quiz_core::Error> {
    let branches = || {
        vec![
            "Executive".to_string(),
            "Legislative".to_string(),
            "Judiciary".to_string(),
        ]
    };
    Ok(vec![
        Question::multiple_choice("pool-1", "Which branch enforces the law?", branches(), "Executive")?,
        Question::multiple_choice("pool-2", "Which branch makes the law?", branches(), "Legislative")?,
        Question::multiple_choice("pool-3", "Which branch interprets the law?", branches(), "Judiciary")?,
        Question::multiple_choice(
            "pool-4",
            "Whose program was 'Philippines 2000'?",
            vec!["Fidel Ramos".into(), "Joseph Estrada".into(), "Gloria Arroyo".into()],
            "Fidel Ramos",
        )?,
        Question::multiple_choice(
            "pool-5",
            "'Erap Para sa Mahirap' is associated with which president?",
            vec!["Rodrigo Duterte".into(), "Joseph Estrada".into(), "Corazon Aquino".into()],
            "Joseph Estrada",
        )?,
        Question::multiple_choice(
            "pool-6",
            "Which article of the 1987 Constitution is the Bill of Rights?",
            vec!["Article II".into(), "Article III".into(), "Article VI".into()],
            "Article III",
        )?,
    ])
}

fn sample_true_false() -> Result<Vec<Question>, quiz_core::Error> {
    Ok(vec![
        Question::true_false("tf-1", "Suffrage is the right to vote.", true)?,
        Question::true_false("tf-2", "The Judiciary makes the law.", false)?,
        Question::true_false("tf-3", "'Build Build Build' was Rodrigo Duterte's program.", true)?,
    ])
}

fn sample_identification() -> Result<Vec<Question>, quiz_core::Error> {
    Ok(vec![
        Question::identification(
            "id-1",
            "First president of the Fifth Republic.",
            "^corazon( c\\.?)? aquino$",
            Some("Corazon Aquino".into()),
        )?,
        Question::identification(
            "id-2",
            "Which administration used the slogan 'Strong Republic'?",
            "arroyo",
            Some("Gloria Macapagal Arroyo".into()),
        )?,
        Question::identification(
            "id-3",
            "The Bill of Rights is found in which article?",
            "^article (iii|3)$",
            Some("Article III".into()),
        )?,
    ])
}

fn sample_lessons() -> Result<Vec<Lesson>, quiz_core::Error> {
    Ok(vec![
        Lesson::new(
            "branches-of-government",
            "Branches of Government",
            "Power is divided among three co-equal branches. The Legislative \
             branch makes the law, the Executive enforces it, and the Judiciary \
             interprets it.",
        )?
        .with_excerpt("Who makes, enforces, and interprets the law")
        .with_category("constitution"),
        Lesson::new(
            "constitution-1987",
            "1987 Constitution Overview",
            "Ratified in February 1987, the Constitution is the supreme law of the \
             land. Article III holds the Bill of Rights.",
        )?
        .with_excerpt("Introduction to the 1987 Philippine Constitution")
        .with_category("constitution")
        .with_sources(vec![
            "https://www.officialgazette.gov.ph/constitutions/1987-constitution/".into(),
        ]),
        Lesson::new(
            "presidents-since-1987",
            "Presidents since 1987",
            "From Corazon Aquino to the present, each administration left its mark \
             through programs such as 'Philippines 2000' and 'Build Build Build'.",
        )?
        .with_excerpt("Short bios and major acts")
        .with_category("history"),
    ])
}

fn sections(entries: Vec<(&str, Vec<Question>)>) -> Result<Value, serde_json::Error> {
    let mut map = Map::new();
    for (key, questions) in entries {
        map.insert(key.to_string(), serde_json::to_value(questions)?);
    }
    Ok(Value::Object(map))
}

async fn write_json_file(
    args: &Args,
    relative: &str,
    value: &Value,
) -> Result<bool, Box<dyn std::error::Error>> {
    let path = args.pool_dir.join(relative);
    if !args.force && tokio::fs::try_exists(&path).await? {
        eprintln!("skipping {} (exists, use --force)", path.display());
        return Ok(false);
    }
    let body = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(&path, body).await?;
    Ok(true)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    tokio::fs::create_dir_all(args.pool_dir.join("courses")).await?;
    let storage = Storage::sqlite(&args.db_url, args.pool_dir.clone()).await?;

    let mut lesson_one = sample_assessment_pool()?;
    lesson_one.truncate(3);
    let files = [
        (
            "quiz_pool",
            serde_json::to_value(QuestionPool::new(sample_assessment_pool()?)?)?,
        ),
        (
            "interactive_question",
            sections(vec![
                ("true_false", sample_true_false()?),
                ("identification", sample_identification()?),
            ])?,
        ),
        (
            "assessment",
            sections(vec![(
                "branches-of-government",
                lesson_one
                    .into_iter()
                    .chain(sample_true_false()?.into_iter().take(2))
                    .chain(sample_identification()?.into_iter().take(1))
                    .collect(),
            )])?,
        ),
    ];

    let mut written = 0;
    for (name, value) in &files {
        if write_json_file(&args, &format!("{name}.json"), value).await? {
            written += 1;
        }
        // Read back through the repository so malformed samples fail loudly here.
        let pool = storage.pools.load_pool(&Topic::new(*name)).await?;
        println!("{name}: {} questions", pool.len());
    }

    let courses = serde_json::to_value(sample_lessons()?)?;
    if write_json_file(&args, "courses/civics.json", &courses).await? {
        written += 1;
    }
    let catalog = storage.lessons.list_lessons().await?;
    println!("courses: {} lessons", catalog.len());

    println!(
        "Seeded {written} content file(s) into {} and migrated {}",
        args.pool_dir.display(),
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
