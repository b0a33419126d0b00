use amortize::extra::ExtraPayment;
use amortize::loan::LoanSpec;
use amortize::report::AmortizationReport;
use clap::Parser;
use log::{info, warn};
use simple_logger::SimpleLogger;
use std::{fs, process};

/// Amortization schedule with optional extra principal payments
#[derive(Parser, Debug)]
#[command(name = "amortize", version, about)]
struct Cli {
    /// Loan amount
    #[arg(long)]
    principal: f64,

    /// Number of monthly payments
    #[arg(long)]
    months: u32,

    /// Annual euribor rate, in percent
    #[arg(long)]
    euribor: f64,

    /// Annual spread over euribor, in percent
    #[arg(long, default_value_t = 0.)]
    spread: f64,

    /// Monthly life insurance
    #[arg(long, default_value_t = 0.)]
    life_insurance: f64,

    /// Monthly house insurance
    #[arg(long, default_value_t = 0.)]
    house_insurance: f64,

    /// Re-amortize the remaining balance over the remaining term every month
    #[arg(long)]
    recalculate: bool,

    /// JSON file holding an array of extra payment rules
    #[arg(long)]
    rules: Option<String>,

    /// Print the whole report as JSON
    #[arg(long)]
    json: bool,

    #[arg(long, default_value = "warn")]
    log_level: log::LevelFilter,
}

fn read_rules(path: &str) -> Result<Vec<ExtraPayment>, Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(path)?;
    let rules: Vec<ExtraPayment> = serde_json::from_str(&contents)?;
    for rule in rules.iter().filter(|rule| !rule.is_effective()) {
        warn!("ignoring extra payment rule that can never apply: {:?}", rule);
    }
    Ok(rules)
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let spec = LoanSpec::new(cli.principal, cli.months, cli.euribor, cli.spread)
        .with_insurance(cli.life_insurance, cli.house_insurance)
        .with_recalculation(cli.recalculate);
    spec.validate()?;

    let rules = match cli.rules.as_deref() {
        Some(path) => read_rules(path)?,
        None => Vec::new(),
    };
    info!("{}, {} extra payment rule(s)", spec, rules.len());

    let report = AmortizationReport::calculate(spec, &rules);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.summary);
        println!();
        report.schedule.show_amortization();
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = SimpleLogger::new().with_level(cli.log_level).init() {
        eprintln!("failed to initialise logging: {e}");
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

// schedules and reports can be moved across threads by callers
#[cfg(test)]
fn is_normal<T: Sized + Send + Sync + Unpin>() {}

#[test]
fn normal_types() {
    is_normal::<amortize::loan::ScheduleRow>();
    is_normal::<amortize::loan::AmortizationSchedule>();
    is_normal::<AmortizationReport>();
}
