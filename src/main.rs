use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use inquire::{Confirm, Select, Text};
use log::{debug, info};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

use fieldservice_desk::calendar::{count_by_day, today_iso, CalendarMonth};
use fieldservice_desk::clock::{
    format_range, from_twenty_four_hour, parse_clock_time, to_twenty_four_hour, AppointmentTimeRange,
};
use fieldservice_desk::model::{AppointmentBook, EstimateFile};
use fieldservice_desk::pricing::{format_money, Discount, EstimateDraft, LineItem};
use fieldservice_desk::report::{agenda_table, customer_header, line_items_table, month_table, summary_table};
use fieldservice_desk::settings::{settings_path, Settings};

// ==========================================
// Constants
// ==========================================
const NO_DISCOUNT_OPT: &str = "No discount";
const PERCENT_OPT: &str = "Percentage (%)";
const FIXED_OPT: &str = "Fixed amount";

// ==========================================
// CLI
// ==========================================

#[derive(Parser)]
#[command(name = "fsd", about = "Estimate pricing and appointment calendar for field service jobs")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Price an estimate from a TOML file, or enter it interactively
    Estimate {
        /// Estimate file (customer, tax_rate, discount, [[items]])
        file: Option<PathBuf>,
    },
    /// Show a month grid with appointment counts
    Calendar {
        /// Month to show as YYYY-MM (defaults to the current month)
        #[arg(long)]
        month: Option<String>,
        /// Appointment book TOML file
        #[arg(long)]
        appointments: Option<PathBuf>,
    },
    /// Format an appointment time range, e.g. `fsd range "09:00 AM" "2 hours"`
    Range {
        start: String,
        duration: Option<String>,
    },
    /// List appointments with their time ranges
    Agenda {
        /// Appointment book TOML file
        file: PathBuf,
        /// Only show this day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },
    /// Configure default tax rate and currency symbol
    Config,
}

// ==========================================
// Main Function
// ==========================================

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    let config_path = settings_path();
    let settings = Settings::load(&config_path)?;
    debug!("Loaded settings from {}", config_path.display());

    match command {
        Commands::Estimate { file } => run_estimate(file.as_deref(), &settings),
        Commands::Calendar { month, appointments } => run_calendar(month.as_deref(), appointments.as_deref()),
        Commands::Range { start, duration } => {
            run_range(&start, duration.as_deref().unwrap_or(""));
            Ok(())
        }
        Commands::Agenda { file, date } => run_agenda(&file, date.as_deref()),
        Commands::Config => setup_config_wizard(&config_path, &settings),
    }
}

fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

// ==========================================
// 1. Estimates
// ==========================================

fn run_estimate(file: Option<&Path>, settings: &Settings) -> Result<()> {
    let symbol = settings.currency_symbol.as_str();

    let draft = match file {
        Some(path) => {
            let estimate: EstimateFile = load_toml(path)?;
            if let Some(customer) = &estimate.customer {
                println!("\n{}\n", customer_header(customer));
            }
            estimate
                .into_draft(settings.default_tax_rate)
                .with_context(|| format!("Invalid estimate in {}", path.display()))?
        }
        None => build_estimate_interactively(settings)?,
    };

    if draft.items().is_empty() {
        println!("❌ No items entered.");
        return Ok(());
    }

    println!("{}", line_items_table(&draft, symbol));
    println!("{}", summary_table(&draft, symbol));
    Ok(())
}

fn prompt_decimal(message: &str, default: &str) -> Result<Decimal> {
    loop {
        let input = Text::new(message).with_default(default).prompt()?;
        let cleaned = input.trim().trim_start_matches('$').replace(',', "");
        match cleaned.parse::<Decimal>() {
            Ok(value) => return Ok(value),
            Err(_) => println!("❌ '{}' is not a number.", input.trim()),
        }
    }
}

fn prompt_quantity() -> Result<u32> {
    loop {
        let input = Text::new("Quantity:").with_default("1").prompt()?;
        match input.trim().parse::<u32>() {
            Ok(qty) if qty >= 1 => return Ok(qty),
            _ => println!("❌ Quantity must be a whole number of at least 1."),
        }
    }
}

fn build_estimate_interactively(settings: &Settings) -> Result<EstimateDraft> {
    let symbol = settings.currency_symbol.as_str();
    let mut draft = EstimateDraft::new(Decimal::ZERO)?;

    println!("\n--- Enter Line Items ---");
    println!("(Leave the name empty to finish)");

    loop {
        let name = Text::new("Item name:").prompt()?;
        if name.trim().is_empty() {
            break;
        }

        let rate = prompt_decimal("Unit rate:", "0")?;
        let quantity = prompt_quantity()?;

        match LineItem::new(name.trim(), rate, quantity) {
            Ok(item) => {
                draft.add_item(item)?;
                println!("   Subtotal so far: {}", format_money(draft.subtotal(), symbol));
            }
            Err(e) => println!("❌ {}", e),
        }
    }

    if draft.items().is_empty() {
        return Ok(draft);
    }

    ask_for_tax(&mut draft, settings)?;
    ask_for_discount(&mut draft, symbol)?;
    Ok(draft)
}

fn ask_for_tax(draft: &mut EstimateDraft, settings: &Settings) -> Result<()> {
    let apply_tax = Confirm::new("Add tax to total?").with_default(true).prompt()?;
    if !apply_tax {
        return Ok(());
    }

    let default_rate = settings.default_tax_rate.normalize().to_string();
    loop {
        let rate = prompt_decimal("Tax rate % (e.g. 8.875):", &default_rate)?;
        match draft.set_tax_rate(rate) {
            Ok(()) => return Ok(()),
            Err(e) => println!("❌ {}", e),
        }
    }
}

/// Re-prompts until a discount fits the subtotal or the user declines.
/// A rejected candidate leaves the earlier discount in place.
fn ask_for_discount(draft: &mut EstimateDraft, symbol: &str) -> Result<()> {
    loop {
        let choice = Select::new("Discount:", vec![NO_DISCOUNT_OPT, PERCENT_OPT, FIXED_OPT]).prompt()?;
        let candidate = match choice {
            PERCENT_OPT => Discount::Percentage(prompt_decimal("Percent off:", "10")?),
            FIXED_OPT => Discount::FixedAmount(prompt_decimal("Amount off:", "0")?),
            _ => return Ok(()),
        };

        match draft.apply_discount(candidate) {
            Ok(amount) => {
                println!("✅ Discount applied: -{}", format_money(amount, symbol));
                return Ok(());
            }
            Err(e) => {
                println!("❌ {}", e);
                if let Some(previous) = draft.discount() {
                    println!("   Keeping {}", previous.label());
                }
            }
        }
    }
}

// ==========================================
// 2. Calendar & Appointments
// ==========================================

fn run_calendar(month: Option<&str>, appointments: Option<&Path>) -> Result<()> {
    let month = match month {
        Some(text) => CalendarMonth::parse(text).with_context(|| format!("Invalid month '{}', expected YYYY-MM", text))?,
        None => CalendarMonth::current(),
    };
    let book: AppointmentBook = match appointments {
        Some(path) => load_toml(path)?,
        None => AppointmentBook::default(),
    };
    info!("Rendering {} with {} appointments", month.title(), book.appointments.len());

    let counts = count_by_day(book.dates());
    let grid = month.grid(&today_iso());

    println!("\n--- {} ---", month.title());
    println!("{}", month_table(&grid, &counts));
    println!("◀ {}   |   {} ▶", month.previous().title(), month.next().title());
    Ok(())
}

fn run_agenda(file: &Path, date: Option<&str>) -> Result<()> {
    let book: AppointmentBook = load_toml(file)?;

    let list = match date {
        Some(text) => {
            let day = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
                .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", text))?;
            book.on(day)
        }
        None => book.sorted(),
    };

    if list.is_empty() {
        println!("(No appointments found)");
        return Ok(());
    }
    println!("{}", agenda_table(&list));
    Ok(())
}

fn run_range(start: &str, duration: &str) {
    // 24-hour input is accepted and shown in 12-hour form
    let start = match parse_clock_time(start) {
        Some(_) => start.trim().to_string(),
        None => from_twenty_four_hour(start).unwrap_or_else(|| start.to_string()),
    };

    println!("🕘 {}", format_range(&start, duration));

    match AppointmentTimeRange::compute(&start, duration) {
        Some(range) if range.start_time != range.end_time => {
            if let (Some(from), Some(to)) = (to_twenty_four_hour(&range.start_time), to_twenty_four_hour(&range.end_time)) {
                println!("   24h: {} - {}", from, to);
            }
        }
        Some(_) => {}
        None => println!("⚠️  Could not read '{}' as a clock time.", start),
    }
}

// ==========================================
// 3. Config
// ==========================================

fn setup_config_wizard(path: &Path, current: &Settings) -> Result<()> {
    println!("\n⚙️  --- Configuration Setup ---");
    println!("📂 Settings file: {}", path.display());

    let default_rate = current.default_tax_rate.normalize().to_string();
    let default_tax_rate = loop {
        let rate = prompt_decimal("Default tax rate %:", &default_rate)?;
        if rate >= Decimal::ZERO {
            break rate;
        }
        println!("❌ Tax rate cannot be negative.");
    };
    let currency_symbol = Text::new("Currency symbol:").with_default(&current.currency_symbol).prompt()?;

    let settings = Settings { default_tax_rate, currency_symbol: currency_symbol.trim().to_string() };
    settings.save(path)?;
    println!("✅ Settings saved.");
    Ok(())
}
