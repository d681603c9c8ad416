use std::fmt;

use chrono::{DateTime, Duration, Utc};
use quiz_core::model::{PrincipalId, Profile, QuizResult};
use storage::repository::Storage;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    principal: PrincipalId,
    name: Option<String>,
    email: Option<String>,
    results: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidPrincipal { raw: String },
    InvalidResults { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidPrincipal { raw } => write!(f, "invalid --principal value: {raw:?}"),
            ArgsError::InvalidResults { raw } => write!(f, "invalid --results value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
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

fn parse_principal(raw: String) -> Result<PrincipalId, ArgsError> {
    PrincipalId::new(raw.clone()).map_err(|_| ArgsError::InvalidPrincipal { raw })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("QUIZ_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3?mode=rwc".into());
        let mut principal =
            parse_principal(std::env::var("QUIZ_PRINCIPAL").unwrap_or_else(|_| "demo".into()))?;
        let mut name = Some("Demo Learner".to_string());
        let mut email = None;
        let mut results = 0;
        let mut now: Option<DateTime<Utc>> = None;

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
                "--principal" => {
                    principal = parse_principal(require_value(&mut args, "--principal")?)?;
                }
                "--name" => {
                    name = Some(require_value(&mut args, "--name")?);
                }
                "--email" => {
                    email = Some(require_value(&mut args, "--email")?);
                }
                "--results" => {
                    let value = require_value(&mut args, "--results")?;
                    results = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidResults { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            principal,
            name,
            email,
            results,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Registers a learner profile so quiz results have somewhere to land.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3?mode=rwc)");
    eprintln!("  --principal <id>          Principal id to upsert (default: demo)");
    eprintln!("  --name <name>             Display name (default: Demo Learner)");
    eprintln!("  --email <email>           Optional email");
    eprintln!("  --results <n>             Sample quiz results to append (default: 0)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_PRINCIPAL");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let mut profile = Profile::new(args.principal.clone());
    if let Some(name) = &args.name {
        profile = profile.with_display_name(name.clone());
    }
    if let Some(email) = &args.email {
        profile = profile.with_email(email.clone());
    }
    storage.profiles.upsert_profile(&profile).await?;

    if args.results > 0 {
        let mut history = storage
            .profiles
            .get_profile(&args.principal)
            .await?
            .map(|p| p.quiz_results().to_vec())
            .unwrap_or_default();

        for i in 0..args.results {
            let taken_at = now - Duration::days(i64::from(args.results - i));
            let score = (i % 5) + 1;
            let pct = u8::try_from(score * 20).unwrap_or(100);
            history.push(QuizResult::from_persisted(score, 5, pct, taken_at)?);
        }
        storage
            .profiles
            .merge_quiz_results(&args.principal, &history)
            .await?;
    }

    println!(
        "Seeded profile {} with {} sample results into {}",
        args.principal, args.results, args.db_url
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
