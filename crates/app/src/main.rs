use std::io::{BufRead, Write};

use chrono::{Local, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use ledger::{
    Amount, BillingCycle, Category, CategoryFilter, Expense, ExpenseDraft, ExpenseFilter,
    FileStore, Ledger, LedgerError, MonthFilter, PaymentMethod, export,
};

mod settings;

#[derive(Parser, Debug)]
#[command(name = "homebudget")]
#[command(about = "Personal expense ledger with plan-gated monthly quota")]
struct Cli {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override the data directory.
    #[arg(long)]
    data_dir: Option<String>,
    /// Override the log level.
    #[arg(long)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a new expense.
    Add(AddArgs),
    /// List expenses, optionally filtered by category and month.
    List(ListArgs),
    /// Replace an expense, keeping its id and creation timestamp.
    Edit(EditArgs),
    /// Delete one expense by id.
    Remove(RemoveArgs),
    /// Delete every expense.
    Clear(ClearArgs),
    /// Show aggregate statistics.
    Stats,
    /// Write the collection to a CSV file.
    Export(ExportArgs),
    /// Load expenses from a CSV export.
    Import(ImportArgs),
    /// Show the active plan and the remaining monthly quota.
    Plan,
    /// Apply a pro upgrade after checkout.
    Upgrade(UpgradeArgs),
}

#[derive(Args, Debug)]
struct AddArgs {
    #[arg(long)]
    amount: Amount,
    #[arg(long)]
    category: Category,
    /// Defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value = "other")]
    payment_method: PaymentMethod,
}

#[derive(Args, Debug)]
struct ListArgs {
    #[arg(long, default_value = "all")]
    category: CategoryFilter,
    /// `all` or `YYYY-MM`.
    #[arg(long, default_value = "all")]
    month: MonthFilter,
}

#[derive(Args, Debug)]
struct EditArgs {
    #[arg(long)]
    id: i64,
    #[arg(long)]
    amount: Amount,
    #[arg(long)]
    category: Category,
    #[arg(long)]
    date: NaiveDate,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value = "other")]
    payment_method: PaymentMethod,
}

#[derive(Args, Debug)]
struct RemoveArgs {
    #[arg(long)]
    id: i64,
    /// Skip the confirmation prompt.
    #[arg(long)]
    yes: bool,
}

#[derive(Args, Debug)]
struct ClearArgs {
    /// Skip the confirmation prompt.
    #[arg(long)]
    yes: bool,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Output path; defaults to homebudget-export-<today>.csv.
    #[arg(long)]
    output: Option<String>,
}

#[derive(Args, Debug)]
struct ImportArgs {
    #[arg(long)]
    input: String,
}

#[derive(Args, Debug)]
struct UpgradeArgs {
    /// `monthly` or `yearly`.
    #[arg(long)]
    cycle: BillingCycle,
    /// Identifier handed back by the checkout flow.
    #[arg(long)]
    subscription_id: String,
}

fn main() {
    let cli = Cli::parse();

    let settings = match settings::load(cli.config.as_deref(), cli.data_dir, cli.log_level) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("configuration error: {err}");
            std::process::exit(2);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "homebudget={level},ledger={level}",
            level = settings.level
        ))
        .init();

    let ledger = Ledger::builder()
        .store(FileStore::new(&settings.data_dir))
        .build();
    let mut ledger = match ledger {
        Ok(ledger) => ledger,
        Err(err) => {
            tracing::error!("failed to open ledger: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(cli.command, &mut ledger) {
        eprintln!("{err}");
        if matches!(err, LedgerError::QuotaExceeded(_)) {
            eprintln!("Upgrade to PRO for unlimited expenses: homebudget upgrade --help");
        }
        std::process::exit(1);
    }
}

fn run(command: Command, ledger: &mut Ledger<FileStore>) -> Result<(), LedgerError> {
    let now = Utc::now();
    let today = Local::now().date_naive();

    match command {
        Command::Add(args) => {
            let mut draft = ExpenseDraft::new(
                args.amount,
                args.category,
                args.date.unwrap_or(today),
            );
            draft.description = args.description;
            draft.payment_method = args.payment_method;

            let expense = ledger.add(draft, now)?;
            println!("Recorded #{}: {}", expense.id, expense);
            if let Some(remaining) = ledger.remaining_this_month(today, now)? {
                println!("{remaining} expenses left this month on the free plan.");
            }
            Ok(())
        }
        Command::List(args) => {
            let filter = ExpenseFilter::new(args.category, args.month);
            print_table(ledger.list_all(), &filter);
            Ok(())
        }
        Command::Edit(args) => {
            let mut draft = ExpenseDraft::new(args.amount, args.category, args.date);
            draft.description = args.description;
            draft.payment_method = args.payment_method;

            let expense = ledger.update(args.id, draft)?;
            println!("Updated #{}: {}", expense.id, expense);
            Ok(())
        }
        Command::Remove(args) => {
            if !args.yes && !confirm("Delete this expense?") {
                println!("Aborted.");
                return Ok(());
            }
            if ledger.remove(args.id)? {
                println!("Expense {} deleted.", args.id);
            } else {
                println!("No expense with id {}.", args.id);
            }
            Ok(())
        }
        Command::Clear(args) => {
            if !args.yes && !confirm("Delete ALL expenses? This cannot be undone.") {
                println!("Aborted.");
                return Ok(());
            }
            ledger.clear()?;
            println!("All expenses deleted.");
            Ok(())
        }
        Command::Stats => {
            let overview = ledger.overview(today, now)?;
            let plan = ledger.current_plan(now)?;

            println!("Total spent:      € {}", overview.lifetime_total);
            println!(
                "This month:       {} expenses, € {}",
                overview.month_count, overview.month_total
            );
            println!("Monthly average:  € {}", overview.monthly_average);
            match overview.top_category {
                Some((category, total)) => {
                    println!("Top category:     {category} (€ {total})");
                }
                None => println!("Top category:     -"),
            }
            println!("Spend days:       {}", overview.distinct_spend_days);
            match overview.remaining_this_month {
                Some(remaining) => println!(
                    "Plan {}:        {} left this month ({}% used)",
                    plan.tier, remaining, overview.progress_percentage
                ),
                None => println!("Plan {}:         unlimited", plan.tier),
            }
            Ok(())
        }
        Command::Export(args) => {
            let path = args
                .output
                .unwrap_or_else(|| export::export_file_name(today));
            let document = ledger.export_csv()?;
            std::fs::write(&path, document)?;
            println!("Exported {} expenses to {path}.", ledger.list_all().len());
            Ok(())
        }
        Command::Import(args) => {
            let document = std::fs::read_to_string(&args.input)?;
            let count = ledger.import_csv(&document, now)?;
            println!("Imported {count} expenses from {}.", args.input);
            Ok(())
        }
        Command::Plan => {
            let plan = ledger.current_plan(now)?;
            println!("Plan: {}", plan.tier);
            match plan.max_expenses_per_month {
                Some(cap) => {
                    let remaining = ledger
                        .remaining_this_month(today, now)?
                        .unwrap_or(cap);
                    println!("Monthly quota: {cap} ({remaining} left this month)");
                }
                None => println!("Monthly quota: unlimited"),
            }
            match plan.max_categories {
                Some(cap) => println!("Categories: up to {cap}"),
                None => println!("Categories: unlimited"),
            }
            Ok(())
        }
        Command::Upgrade(args) => {
            let plan = ledger.upgrade(args.cycle, &args.subscription_id, now)?;
            println!("Welcome to HomeBudget PRO! Active plan: {}", plan.tier);
            Ok(())
        }
    }
}

fn print_table(expenses: Vec<&Expense>, filter: &ExpenseFilter) {
    let visible: Vec<&Expense> = expenses
        .into_iter()
        .filter(|expense| filter.is_visible(expense))
        .collect();

    if visible.is_empty() {
        println!("No expenses recorded. Add the first one!");
        return;
    }

    println!(
        "{:<16} {:<12} {:<32} {:<10} {:<12} {:>10}",
        "Id", "Date", "Description", "Category", "Payment", "Amount"
    );
    for expense in visible {
        println!(
            "{:<16} {:<12} {:<32} {:<10} {:<12} {:>10}",
            expense.id,
            expense.date.format("%d/%m/%Y").to_string(),
            expense.description,
            expense.category.display_name(),
            expense.payment_method.display_name(),
            format!("€ {}", expense.amount),
        );
    }
}

fn confirm(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
