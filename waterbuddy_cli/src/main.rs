use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use waterbuddy_core::*;

const STATE_FILE: &str = "state.json";
const WEEKLY_FILE: &str = "weekly_data.csv";

const TIPS: [&str; 4] = [
    "Keep a bottle on your desk to sip often.",
    "Drink a glass before meals.",
    "Add lemon or mint to make water more refreshing.",
    "Small sips throughout the day add up.",
];

#[derive(Parser)]
#[command(name = "waterbuddy")]
#[command(about = "Daily water intake tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up your profile and compute a daily goal
    Setup {
        /// Age group (child, teen, adult, senior)
        #[arg(long)]
        age_group: String,

        /// Body weight; non-numeric input counts as 70
        #[arg(long, allow_negative_numbers = true)]
        weight: String,

        /// Weight unit (kg or lb)
        #[arg(long, default_value = "kg", value_parser = parse_unit)]
        unit: WeightUnit,

        /// Your name
        #[arg(long)]
        name: Option<String>,
    },

    /// Show or change the daily goal
    Goal {
        /// Set a manual goal in ml (minimum 500)
        #[arg(long, conflicts_with = "clear", allow_negative_numbers = true)]
        set: Option<String>,

        /// Drop the manual goal and use the computed one
        #[arg(long)]
        clear: bool,
    },

    /// Log a drink (defaults to the quick amount)
    Log {
        /// Amount in ml
        #[arg(allow_negative_numbers = true)]
        amount: Option<String>,
    },

    /// Log one of the configured quick amounts
    Quick {
        /// 1-based position in the quick amount list
        index: usize,
    },

    /// Show today's progress (default)
    Status,

    /// Save today's total to the weekly history and start a new day
    Commit {
        /// Date to save under (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Show the weekly summary
    Week,

    /// Clear the weekly history
    ResetWeek {
        /// Don't ask for confirmation
        #[arg(long)]
        yes: bool,
    },
}

fn parse_unit(s: &str) -> std::result::Result<WeightUnit, String> {
    s.parse::<WeightUnit>().map_err(|e| e.to_string())
}

/// The loaded session plus where to save it
struct Session {
    tracker: Tracker<CsvWeeklyStore>,
    started_on: NaiveDate,
    state_path: PathBuf,
    today: NaiveDate,
}

impl Session {
    fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let state_path = data_dir.join(STATE_FILE);
        let state = SessionState::load(&state_path)?;
        let today = Local::now().date_naive();

        if state.is_stale(today) {
            eprintln!(
                "Note: the open log was started on {0}. Run `waterbuddy commit --date {0}` to save it under that day.",
                state.started_on
            );
        }

        let started_on = state.started_on;
        let store = CsvWeeklyStore::new(data_dir.join(WEEKLY_FILE));
        Ok(Self {
            tracker: state.into_tracker(store),
            started_on,
            state_path,
            today,
        })
    }

    fn save(&self) -> Result<()> {
        SessionState::from_tracker(&self.tracker, self.started_on, self.today)
            .save(&self.state_path)
    }
}

fn main() -> Result<()> {
    waterbuddy_core::logging::init_with_level("warn");

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);

    match cli.command {
        Some(Commands::Setup {
            age_group,
            weight,
            unit,
            name,
        }) => cmd_setup(&data_dir, &age_group, &weight, unit, name),
        Some(Commands::Goal { set, clear }) => cmd_goal(&data_dir, set, clear),
        Some(Commands::Log { amount }) => cmd_log(&data_dir, amount, &config),
        Some(Commands::Quick { index }) => cmd_quick(&data_dir, index, &config),
        Some(Commands::Commit { date }) => cmd_commit(&data_dir, date),
        Some(Commands::Week) => cmd_week(&data_dir, &config),
        Some(Commands::ResetWeek { yes }) => cmd_reset_week(&data_dir, yes),
        Some(Commands::Status) | None => cmd_status(&data_dir, &config),
    }
}

fn cmd_setup(
    data_dir: &Path,
    age_group: &str,
    weight: &str,
    unit: WeightUnit,
    name: Option<String>,
) -> Result<()> {
    let mut session = Session::open(data_dir)?;

    let profile = Profile {
        name,
        age_group: AgeGroup::parse_lenient(age_group),
        weight_value: parse_weight(weight),
        weight_unit: unit,
        goal_override_ml: None,
    };
    session.tracker.set_profile(profile);
    session.save()?;

    let profile = session.tracker.profile();
    if let Some(ref name) = profile.name {
        println!("Hi {}!", name);
    }
    println!("Age group: {}", profile.age_group);
    println!("Computed goal: {} ml", profile.computed_goal());
    if profile.goal_override_ml.is_some() {
        println!("Manual goal in use: {} ml", session.tracker.daily_goal());
    }
    Ok(())
}

fn cmd_goal(data_dir: &Path, set: Option<String>, clear: bool) -> Result<()> {
    let mut session = Session::open(data_dir)?;

    let command = if clear {
        Some(Command::ClearGoal)
    } else if let Some(raw) = set {
        match parse_amount(&raw) {
            Some(goal) => Some(Command::SetGoal(goal)),
            None => {
                eprintln!("Warning: '{}' is not a valid number. Goal unchanged.", raw);
                None
            }
        }
    } else {
        None
    };

    if let Some(command) = command {
        session.tracker.apply(command)?;
        session.save()?;
    }

    let tracker = &session.tracker;
    match tracker.profile().goal_override_ml {
        Some(_) => println!("Daily goal: {} ml (manual)", tracker.daily_goal()),
        None => println!("Daily goal: {} ml", tracker.daily_goal()),
    }
    Ok(())
}

fn cmd_log(data_dir: &Path, amount: Option<String>, config: &Config) -> Result<()> {
    let amount = match amount {
        None => config.intake.quick_amount_ml,
        Some(raw) => match parse_amount(&raw) {
            Some(v) => v,
            None => {
                eprintln!("Warning: '{}' is not a valid number. Nothing logged.", raw);
                return Ok(());
            }
        },
    };
    log_and_report(data_dir, amount)
}

fn cmd_quick(data_dir: &Path, index: usize, config: &Config) -> Result<()> {
    let amounts = &config.intake.quick_amounts;
    match index.checked_sub(1).and_then(|i| amounts.get(i)) {
        Some(&amount) => log_and_report(data_dir, amount),
        None => {
            eprintln!(
                "Warning: choose a quick amount between 1 and {} ({:?} ml).",
                amounts.len(),
                amounts
            );
            Ok(())
        }
    }
}

fn log_and_report(data_dir: &Path, amount: i64) -> Result<()> {
    let mut session = Session::open(data_dir)?;

    match session.tracker.apply(Command::Log(amount))? {
        Outcome::Logged { total_ml } => {
            session.save()?;
            let mood = session.tracker.mood();
            println!(
                "✓ Logged {} ml. Total: {} ml ({}%)",
                amount, total_ml, mood.percentage
            );
            println!("{} {}", mood.tier.emoji(), mood.message);
        }
        _ => {
            eprintln!("Warning: enter an amount > 0. Nothing logged.");
        }
    }
    Ok(())
}

fn cmd_status(data_dir: &Path, config: &Config) -> Result<()> {
    let session = Session::open(data_dir)?;
    let tracker = &session.tracker;

    let total = tracker.current_total();
    let goal = tracker.daily_goal();
    let mood = tracker.mood();

    println!("{}", Local::now().format("%A, %d %b %Y"));
    if let Some(ref name) = tracker.profile().name {
        println!("Hi {}!", name);
    }
    println!();
    println!("  {}  {}", mood.tier.emoji(), mood.message);
    println!();
    println!("  {}", progress_bar(mood.percentage, 30));
    println!("  Total: {} ml   •   {}%   (goal {} ml)", total, mood.percentage, goal);
    println!(
        "  Remaining: {} ml",
        waterbuddy_core::mood::remaining_ml(total, goal as i64)
    );

    let recent = tracker.recent_history(config.display.history_entries);
    if !recent.is_empty() {
        println!();
        for entry in recent {
            let at = entry.at.with_timezone(&Local);
            println!("  {} — {} ml", at.format("%I:%M %p"), entry.amount_ml);
        }
    }

    println!();
    println!("Tip: {}", tip_for(session.today));
    Ok(())
}

fn cmd_commit(data_dir: &Path, date: Option<NaiveDate>) -> Result<()> {
    let mut session = Session::open(data_dir)?;
    let date = date.unwrap_or(session.today);
    if date != session.started_on && !session.tracker.ledger().is_empty() {
        tracing::info!(
            "Committing intake started on {} under {}",
            session.started_on,
            date
        );
    }

    // On failure the error propagates before the cleared ledger is saved
    let outcome = session.tracker.apply(Command::CommitDay(date))?;
    session.save()?;

    if let Outcome::Committed { date, total_ml } = outcome {
        println!("✓ Saved {} ml for {} to weekly history.", total_ml, date);
        println!("  New day started.");
    }
    Ok(())
}

fn cmd_week(data_dir: &Path, config: &Config) -> Result<()> {
    let session = Session::open(data_dir)?;
    let records = session.tracker.weekly()?;

    println!("Weekly Summary");
    if records.is_empty() {
        println!("No weekly data yet. Save a day to populate this.");
        return Ok(());
    }

    for record in &records {
        println!("{} — {} ml", record.date, record.total_ml);
    }
    println!("{}", "-".repeat(config.display.chart_width));

    let max = records.iter().map(|r| r.total_ml).max().unwrap_or(0);
    for record in &records {
        let bar = "█".repeat(bar_length(record.total_ml, max, config.display.chart_width));
        println!(
            "{} |{} {} ml",
            record.date.format("%m-%d"),
            bar,
            record.total_ml
        );
    }
    Ok(())
}

fn cmd_reset_week(data_dir: &Path, yes: bool) -> Result<()> {
    if !yes && !confirm("Clear weekly data?")? {
        println!("Weekly history kept.");
        return Ok(());
    }

    let mut session = Session::open(data_dir)?;
    session.tracker.apply(Command::ResetWeek)?;
    println!("✓ Weekly history cleared.");
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Bar length for `value` scaled so that `max` fills `width`
fn bar_length(value: u64, max: u64, width: usize) -> usize {
    if max == 0 {
        return 0;
    }
    ((value as u128 * width as u128) / max as u128) as usize
}

fn progress_bar(percentage: u8, width: usize) -> String {
    let filled = width * percentage as usize / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

fn tip_for(date: NaiveDate) -> &'static str {
    TIPS[date.ordinal0() as usize % TIPS.len()]
}
