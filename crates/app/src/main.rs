use std::fmt;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, info};
use quiz_core::model::{AnswerMap, Document, PrincipalId, Quiz};
use services::{
    Clock, GenerateOutcome, GenerationConfig, HttpQuizGenerator, NavigationTracker,
    PersistenceStatus, ResultHistoryService, ResultPersister, SessionController, SessionError,
    SessionState, SkipReason,
};
use storage::repository::Storage;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    MissingFile,
    MissingPrincipal,
    InvalidPrincipal { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::MissingFile => write!(f, "--file is required"),
            ArgsError::MissingPrincipal => {
                write!(f, "--principal (or QUIZ_PRINCIPAL) is required")
            }
            ArgsError::InvalidPrincipal { raw } => write!(f, "invalid --principal value: {raw:?}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- take    --file <pdf> [--principal <id>] [--db <sqlite_url>] [--api <url>]");
    eprintln!("  cargo run -p app -- history [--principal <id>] [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:dev.sqlite3");
    eprintln!("  --api http://localhost:8000");
    eprintln!();
    eprintln!("Without a principal, quizzes are scored but not recorded.");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_PRINCIPAL, QUIZ_API_URL, QUIZ_API_TIMEOUT_SECS, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Take,
    History,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "take" => Some(Self::Take),
            "history" => Some(Self::History),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    principal: Option<PrincipalId>,
    file: Option<PathBuf>,
    api_url: Option<String>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| normalize_sqlite_url("sqlite:dev.sqlite3".into()), normalize_sqlite_url);
        let mut principal = std::env::var("QUIZ_PRINCIPAL")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .map(parse_principal)
            .transpose()?;
        let mut file = None;
        let mut api_url = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--principal" => {
                    principal = Some(parse_principal(require_value(args, "--principal")?)?);
                }
                "--file" => {
                    file = Some(PathBuf::from(require_value(args, "--file")?));
                }
                "--api" => {
                    api_url = Some(require_value(args, "--api")?);
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
            file,
            api_url,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim();
    let path = std::path::Path::new(trimmed.strip_prefix("sqlite:").unwrap_or(trimmed));
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

//
// ─── TERMINAL ──────────────────────────────────────────────────────────────────
//

struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print `label` and read one trimmed line. `None` on end of input.
    async fn ask(&mut self, label: &str) -> std::io::Result<Option<String>> {
        print!("{label}");
        std::io::stdout().flush()?;
        Ok(self.lines.next_line().await?.map(|line| line.trim().to_owned()))
    }

    async fn confirm(&mut self, label: &str) -> std::io::Result<bool> {
        let answer = self.ask(label).await?;
        Ok(answer.is_some_and(|a| a.eq_ignore_ascii_case("y")))
    }
}

fn render(tracker: &NavigationTracker) {
    let Some(question) = tracker.current_question() else {
        return;
    };
    let progress = tracker.progress();
    println!();
    println!(
        "Question {}/{} ({} answered)",
        progress.position, progress.total, progress.answered
    );
    println!("{}", question.text());
    let selected = tracker.answer_for(tracker.current_index());
    for option in question.options() {
        let marker = if selected == Some(option.label.as_str()) { '*' } else { ' ' };
        println!(" {marker} {}) {}", option.label, option.text);
    }
}

/// Encouragement shown under the score.
fn feedback(percentage: u8) -> &'static str {
    match percentage {
        80.. => "Excellent work! You really know this material.",
        60..=79 => "Good effort! With a little more study, you'll ace it!",
        _ => "Keep learning! Review the material and try again.",
    }
}

/// Per-question breakdown of a submitted quiz.
fn review_lines(quiz: &Quiz, answers: &AnswerMap) -> Vec<String> {
    let mut lines = Vec::with_capacity(quiz.len() * 3);
    for (i, question) in quiz.iter().enumerate() {
        let picked = answers.get(i);
        let mark = if picked.is_some_and(|label| question.is_correct(label)) {
            "correct"
        } else {
            "wrong"
        };
        lines.push(format!("{}. {} [{mark}]", i + 1, question.text()));
        lines.push(format!("   Your answer: {}", picked.unwrap_or("Not answered")));
        lines.push(format!("   Correct answer: {}", question.correct_answer()));
    }
    lines
}

//
// ─── COMMANDS ──────────────────────────────────────────────────────────────────
//

/// Generate until a quiz is ready, offering a retry after each failure.
/// Returns `false` when the learner gives up.
async fn generate_quiz(
    controller: &SessionController,
    prompt: &mut Prompt,
) -> Result<bool, Box<dyn std::error::Error>> {
    loop {
        println!("Generating quiz...");
        match controller.generate().await {
            Ok(GenerateOutcome::Ready { questions: 0 }) => {
                println!("The document produced no questions.");
                return Ok(true);
            }
            Ok(GenerateOutcome::Ready { questions }) => {
                println!("Quiz ready: {questions} questions.");
                return Ok(true);
            }
            Ok(GenerateOutcome::Discarded) => return Ok(false),
            Err(SessionError::GenerationFailed(reason)) => {
                eprintln!("Could not generate a quiz: {reason}");
                if !prompt.confirm("Retry? [y/N] ").await? {
                    return Ok(false);
                }
                controller.retry()?;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// Drive the in-progress quiz from stdin. Returns `true` once the learner submits.
async fn answer_quiz(
    controller: &SessionController,
    prompt: &mut Prompt,
) -> Result<bool, Box<dyn std::error::Error>> {
    println!("Answer with an option letter; n = next, p = previous, s = submit, q = quit.");
    while let Some(tracker) = controller.current_state().in_progress().cloned() {
        render(&tracker);
        let Some(input) = prompt.ask("> ").await? else {
            return Ok(false);
        };
        match input.to_ascii_lowercase().as_str() {
            "" => {}
            "n" => {
                controller.next()?;
            }
            "p" => {
                controller.previous()?;
            }
            "s" => return Ok(true),
            "q" => return Ok(false),
            label => {
                let label = label.to_ascii_uppercase();
                match controller.select_answer(tracker.current_index(), &label) {
                    Ok(()) if !tracker.is_last() => {
                        controller.next()?;
                    }
                    Ok(()) => {}
                    Err(SessionError::InvalidInput(detail)) => eprintln!("{detail}"),
                    Err(err) => return Err(err.into()),
                }
            }
        }
    }
    Ok(false)
}

async fn take(args: Args, storage: Storage) -> Result<(), Box<dyn std::error::Error>> {
    let path = args.file.ok_or(ArgsError::MissingFile)?;
    let bytes = tokio::fs::read(&path).await?;
    let file_name = path
        .file_name()
        .map_or_else(|| "document.pdf".into(), |n| n.to_string_lossy().into_owned());
    let document = Document::new(file_name, bytes)?;

    let mut config = GenerationConfig::from_env();
    if let Some(api_url) = args.api_url {
        config.base_url = api_url;
    }
    debug!("quiz service at {}", config.base_url);
    let generator = HttpQuizGenerator::new(config)?;

    let mut controller = SessionController::new(
        Arc::new(generator),
        ResultPersister::new(Arc::clone(&storage.profiles)),
        Clock::System,
    );
    if let Some(principal) = args.principal {
        controller = controller.with_principal(principal);
    }

    let mut prompt = Prompt::new();
    controller.select_document(document)?;
    if !generate_quiz(&controller, &mut prompt).await? {
        controller.restart();
        return Ok(());
    }
    if !answer_quiz(&controller, &mut prompt).await? {
        info!("quiz abandoned before submission");
        controller.restart();
        return Ok(());
    }

    let receipt = controller.submit().await?;
    let result = &receipt.result;
    println!();
    println!(
        "Score: {}/{} ({}%)",
        result.score(),
        result.total(),
        result.percentage()
    );
    if result.total() > 0 {
        println!("{}", feedback(result.percentage()));
    }
    if let SessionState::Submitted { quiz, answers, .. } = controller.current_state() {
        println!();
        println!("Question review");
        for line in review_lines(&quiz, &answers) {
            println!("{line}");
        }
    }
    println!();
    match &receipt.persistence {
        PersistenceStatus::Persisted => println!("Result saved to your history."),
        PersistenceStatus::Skipped(SkipReason::NoPrincipal) => {
            println!("Not signed in; result not saved.");
        }
        PersistenceStatus::Skipped(SkipReason::EmptyQuiz) => {}
        PersistenceStatus::ProfileNotFound(id) => {
            eprintln!("No profile for {id}; run the seed binary to create one.");
        }
        PersistenceStatus::Failed(reason) => eprintln!("Could not save result: {reason}"),
    }
    Ok(())
}

async fn history(args: Args, storage: Storage) -> Result<(), Box<dyn std::error::Error>> {
    let principal = args.principal.ok_or(ArgsError::MissingPrincipal)?;
    let service = ResultHistoryService::new(Arc::clone(&storage.profiles));
    let overview = service.overview(&principal).await?;

    println!("{principal}: {} attempts", overview.attempts);
    println!("Overall: {}%", overview.overall_percentage);
    println!("Trend: {:?}", overview.trend);
    println!("Active days: {}", overview.active_days);
    for result in &overview.recent {
        println!(
            "  {}  {}/{} ({}%)",
            result.taken_at().format("%Y-%m-%d %H:%M"),
            result.score(),
            result.total(),
            result.percentage()
        );
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1).peekable();

    let cmd = match argv.peek().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Take,
        Some(first) => {
            let cmd = Command::from_arg(first).ok_or_else(|| {
                eprintln!("unknown subcommand: {first}");
                print_usage();
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
            })?;
            argv.next();
            cmd
        }
    };

    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Storage setup stays in the binary so the library crates remain backend-agnostic.
    prepare_sqlite_file(&parsed.db_url)?;
    let storage = Storage::sqlite(&parsed.db_url).await?;
    info!("opened {}", parsed.db_url);

    match cmd {
        Command::Take => take(parsed, storage).await,
        Command::History => history(parsed, storage).await,
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Question, QuestionOption};

    fn question(text: &str, answer: &str) -> Question {
        Question::new(
            text,
            vec![
                QuestionOption::new("A", "3"),
                QuestionOption::new("B", "4"),
                QuestionOption::new("C", "5"),
                QuestionOption::new("D", "6"),
            ],
            answer,
        )
        .unwrap()
    }

    #[test]
    fn feedback_tiers() {
        assert!(feedback(100).starts_with("Excellent"));
        assert!(feedback(80).starts_with("Excellent"));
        assert!(feedback(79).starts_with("Good effort"));
        assert!(feedback(60).starts_with("Good effort"));
        assert!(feedback(59).starts_with("Keep learning"));
        assert!(feedback(0).starts_with("Keep learning"));
    }

    #[test]
    fn review_shows_picked_and_correct_answers() {
        let quiz = Quiz::new(vec![question("What is 2+2?", "B"), question("What is 2+3?", "C")])
            .unwrap();
        let answers: AnswerMap = [(0, "B")].into_iter().collect();

        let lines = review_lines(&quiz, &answers);
        assert_eq!(
            lines,
            vec![
                "1. What is 2+2? [correct]",
                "   Your answer: B",
                "   Correct answer: B",
                "2. What is 2+3? [wrong]",
                "   Your answer: Not answered",
                "   Correct answer: C",
            ]
        );
    }

    #[test]
    fn sqlite_urls_are_made_absolute() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
        assert_eq!(normalize_sqlite_url("sqlite:///tmp/q.db".into()), "sqlite:///tmp/q.db");
        assert!(normalize_sqlite_url("sqlite:dev.sqlite3".into()).starts_with("sqlite:///"));
    }
}
