use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use revu_core::{
    AllocationResult, Answer, Feedback, FeedbackEvent, allocate, days_until, export_plan,
    now_unix_secs, parse_candidates, unix_to_iso8601,
};
use revu_store::ReviewStore;

#[derive(Parser)]
#[command(name = "revu", about = "Review session planner and spaced-repetition scheduler")]
struct Cli {
    /// Learner id (defaults to `user` in config.toml)
    #[arg(long, global = true)]
    user: Option<String>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan a review session from a candidate pool
    Plan(PlanArgs),

    /// Record the answer to one question
    Review(ReviewArgs),

    /// List questions due for review
    Due,

    /// Show session and review statistics
    Stats,

    /// Print the effective configuration
    Config,
}

#[derive(Args)]
struct PlanArgs {
    /// JSON file with candidate questions
    candidates: PathBuf,

    #[arg(long)]
    max_questions: Option<usize>,

    /// Session time budget in minutes (fractions allowed)
    #[arg(long)]
    minutes: Option<f64>,

    /// Give half the session to this difficulty level (1-5)
    #[arg(long)]
    prefer: Option<u8>,

    /// Rank by weight and priority only, ignoring difficulty quotas
    #[arg(long)]
    no_balance: bool,

    /// Skip breaking up runs from the same content
    #[arg(long)]
    no_cluster: bool,

    /// Seed for the presentation shuffle
    #[arg(long)]
    seed: Option<u64>,

    /// Print the plan as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ReviewArgs {
    question: String,

    /// Content item the question belongs to
    #[arg(long)]
    content: String,

    #[command(flatten)]
    answer: AnswerArgs,

    /// Seconds the learner took to answer
    #[arg(long)]
    response_time: Option<f64>,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct AnswerArgs {
    /// SM-2 quality, 0 (blackout) to 5 (perfect)
    #[arg(long)]
    quality: Option<u8>,

    #[arg(long)]
    got_it: bool,

    #[arg(long)]
    revisit: bool,
}

impl AnswerArgs {
    fn answer(&self) -> Answer {
        match (self.quality, self.got_it) {
            (Some(q), _) => Answer::Quality(q),
            (None, true) => Answer::Feedback(Feedback::GotIt),
            (None, false) => Answer::Feedback(Feedback::Revisit),
        }
    }
}

fn open_store() -> Result<ReviewStore> {
    let base_dir = std::env::var("REVU_DATA_DIR").ok().map(PathBuf::from);
    ReviewStore::open(base_dir.as_deref()).context("failed to open review store")
}

fn user_id<'a>(cli: &'a Cli, store: &'a ReviewStore) -> &'a str {
    cli.user.as_deref().unwrap_or(&store.config().user)
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Plan(args) => cmd_plan(&cli, args),
        Commands::Review(args) => cmd_review(&cli, args),
        Commands::Due => cmd_due(&cli),
        Commands::Stats => cmd_stats(&cli),
        Commands::Config => cmd_config(),
    }
}

fn read_candidates(path: &Path) -> Result<Vec<revu_core::Question>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_candidates(&content).with_context(|| format!("invalid candidates in {}", path.display()))
}

fn cmd_plan(cli: &Cli, args: &PlanArgs) -> Result<()> {
    let store = open_store()?;
    let pool = read_candidates(&args.candidates)?;

    let mut options = store.config().allocation.to_options();
    if let Some(max) = args.max_questions {
        options.max_questions = max;
    }
    if let Some(minutes) = args.minutes {
        options.target_duration_minutes = minutes;
    }
    if args.prefer.is_some() {
        options.difficulty_preference = args.prefer;
    }
    if args.no_balance {
        options.balance_by_difficulty = false;
    }
    if args.no_cluster {
        options.prevent_clustering = false;
    }

    let mut rng = match args.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };
    let plan = allocate(&pool, &options, &mut rng).context("failed to plan session")?;

    let user = user_id(cli, &store);
    let session_id = store
        .store()
        .record_session(user, &plan, now_unix_secs())
        .context("failed to record session")?;
    tracing::info!("planned session {session_id} for '{user}'");

    if args.json {
        println!("{}", export_plan(&plan)?);
    } else {
        print_plan(&plan);
    }
    Ok(())
}

fn print_plan(plan: &AllocationResult) {
    println!(
        "session: {} questions, {:.1} min ({})",
        plan.len(),
        plan.estimated_total_time_minutes,
        plan.strategy
    );
    if plan.is_empty() {
        println!("(no questions fit the session budget)");
        return;
    }
    for (i, q) in plan.questions.iter().enumerate() {
        println!(
            "{:>3}. {}  [{}]  difficulty {}  {}s",
            i + 1,
            q.id,
            q.content_id,
            q.difficulty_level,
            q.estimated_time_seconds
        );
    }
    let content: Vec<String> = plan
        .content_distribution
        .iter()
        .map(|(id, n)| format!("{id}={n}"))
        .collect();
    let difficulty: Vec<String> = plan
        .difficulty_distribution
        .iter()
        .map(|(level, n)| format!("{level}={n}"))
        .collect();
    println!("content:    {}", content.join(", "));
    println!("difficulty: {}", difficulty.join(" "));
}

fn cmd_review(cli: &Cli, args: &ReviewArgs) -> Result<()> {
    let store = open_store()?;
    let user = user_id(cli, &store);

    let event = FeedbackEvent {
        content_id: args.content.clone(),
        question_id: args.question.clone(),
        answer: args.answer.answer(),
        response_time_seconds: args.response_time,
    };
    let now = now_unix_secs();
    let record = store
        .store()
        .record_feedback(user, &event, &store.config().feedback, now)
        .context("failed to record review")?;

    println!("question:    {}", record.question_id);
    println!("repetitions: {}", record.state.repetitions);
    println!("ease:        {:.2}", record.state.ease_factor);
    println!("interval:    {} day(s)", record.state.interval);
    println!(
        "next due:    {} (in {} day(s))",
        unix_to_iso8601(record.next_review_due_at),
        days_until(record.next_review_due_at, now)
    );
    Ok(())
}

fn cmd_due(cli: &Cli) -> Result<()> {
    let store = open_store()?;
    let user = user_id(cli, &store);
    let now = now_unix_secs();

    let due = store
        .store()
        .due_reviews(user, now)
        .context("failed to load due reviews")?;

    if due.is_empty() {
        println!("(nothing due)");
        return Ok(());
    }
    for record in &due {
        println!(
            "{}  [{}]  due {}  (interval {}d)",
            record.question_id,
            record.content_id,
            unix_to_iso8601(record.next_review_due_at),
            record.state.interval
        );
    }
    if cli.verbose {
        eprintln!("--- due: {} question(s) for '{user}' ---", due.len());
    }
    Ok(())
}

fn cmd_stats(cli: &Cli) -> Result<()> {
    let store = open_store()?;
    let user = user_id(cli, &store);

    let tracked = store
        .store()
        .review_count(user)
        .context("failed to count review states")?;
    let summary = store
        .store()
        .session_summary(user)
        .context("failed to load session stats")?;

    println!("data dir:   {}", store.base_dir().display());
    println!("user:       {user}");
    println!("tracked:    {tracked}");
    println!("sessions:   {}", summary.sessions);
    println!("questions:  {}", summary.total_questions);
    println!("minutes:    {:.1}", summary.total_minutes);
    Ok(())
}

fn cmd_config() -> Result<()> {
    let store = open_store()?;
    print!("{}", store.config().to_toml()?);
    Ok(())
}
