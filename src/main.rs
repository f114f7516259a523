//! split-engine CLI
//!
//! Settle group expenses from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Compute a settlement plan from an outing JSON file
//! split-engine split --input outing.json
//!
//! # Output as JSON
//! split-engine split --input outing.json --format json
//!
//! # Treat the input as an itemized bill (tax/service applied)
//! split-engine split --input bill.json --bill
//!
//! # Show net balances only
//! split-engine balances --input outing.json
//!
//! # Generate a random outing for testing
//! split-engine generate --participants 10 --items 30
//! ```

use split_engine::core::balance::BalanceSheet;
use split_engine::core::bill::Bill;
use split_engine::core::expense::Outing;
use split_engine::settlement::planner::SettlementPlanner;
use split_engine::simulation::generator::{generate_random_outing, OutingConfig};
use std::fs;
use std::process;

fn print_usage() {
    eprintln!(
        r#"split-engine — group expense settlement and payment planning

USAGE:
    split-engine <COMMAND> [OPTIONS]

COMMANDS:
    split       Compute a settlement plan from an outing
    balances    Show net balances per participant
    generate    Generate a random outing (for testing)
    help        Show this message

OPTIONS (split, balances):
    --input <FILE>      Path to JSON outing file
    --bill              Treat the input as an itemized bill
    --format <FORMAT>   Output format: text (default) or json

OPTIONS (generate):
    --participants <N>  Number of participants (default: 10)
    --items <N>         Number of expense items (default: 30)
    --output <FILE>     Write to file instead of stdout

EXAMPLES:
    split-engine split --input outing.json
    split-engine split --input bill.json --bill --format json
    split-engine balances --input outing.json
    split-engine generate --participants 5 --items 12 --output test.json"#
    );
}

struct InputOptions {
    path: String,
    bill: bool,
    format: String,
}

fn parse_input_options(args: &[String]) -> InputOptions {
    let mut input_path = None;
    let mut bill = false;
    let mut format = "text".to_string();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                input_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--input requires a file path");
                    process::exit(1);
                }));
            }
            "--bill" => {
                bill = true;
            }
            "--format" => {
                i += 1;
                format = args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--format requires 'text' or 'json'");
                    process::exit(1);
                });
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let path = input_path.unwrap_or_else(|| {
        eprintln!("Error: --input <FILE> is required");
        process::exit(1);
    });

    InputOptions { path, bill, format }
}

fn load_outing(options: &InputOptions) -> Outing {
    let content = fs::read_to_string(&options.path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{}': {}", options.path, e);
        process::exit(1);
    });

    if options.bill {
        let bill: Bill = serde_json::from_str(&content).unwrap_or_else(|e| {
            eprintln!("Error parsing bill JSON: {}", e);
            eprintln!("Expected format:");
            eprintln!(
                r#"{{
  "paid_by": "alice",
  "tax_rate": "0.05",
  "service_charge": "0.10",
  "items": [
    {{ "name": "pizza", "price": "20.00", "quantity": 1, "consumed_by": ["alice", "bob"] }}
  ]
}}"#
            );
            process::exit(1);
        });
        bill.to_outing().unwrap_or_else(|e| {
            eprintln!("Invalid bill: {}", e);
            process::exit(1);
        })
    } else {
        serde_json::from_str(&content).unwrap_or_else(|e| {
            eprintln!("Error parsing outing JSON: {}", e);
            eprintln!("Expected format:");
            eprintln!(
                r#"{{
  "participants": ["alice", "bob", "carol"],
  "items": [
    {{ "amount": "300.00", "payer": "alice", "consumers": ["alice", "bob", "carol"] }}
  ]
}}"#
            );
            process::exit(1);
        })
    }
}

fn compute_balances_or_exit(outing: &Outing) -> BalanceSheet {
    BalanceSheet::from_outing(outing).unwrap_or_else(|e| {
        eprintln!("Invalid outing: {}", e);
        process::exit(1);
    })
}

fn cmd_split(args: &[String]) {
    let options = parse_input_options(args);
    let outing = load_outing(&options);
    let sheet = compute_balances_or_exit(&outing);

    let plan = SettlementPlanner::plan(&sheet).unwrap_or_else(|e| {
        eprintln!("Internal settlement fault: {}", e);
        process::exit(2);
    });

    if options.format == "json" {
        println!("{}", serde_json::to_string_pretty(&plan).unwrap());
    } else {
        println!("{}", plan);
    }
}

#[derive(serde::Serialize)]
struct BalanceOutput {
    participant: String,
    balance: String,
    status: String,
}

fn cmd_balances(args: &[String]) {
    let options = parse_input_options(args);
    let outing = load_outing(&options);
    let sheet = compute_balances_or_exit(&outing);

    if options.format == "json" {
        let balances: Vec<BalanceOutput> = sheet
            .positions()
            .iter()
            .map(|(participant, balance)| BalanceOutput {
                participant: participant.to_string(),
                balance: balance.to_string(),
                status: if balance.is_positive() {
                    "CREDITOR".to_string()
                } else {
                    "DEBTOR".to_string()
                },
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&balances).unwrap());
    } else {
        println!("=== Net Balances ===");
        println!("Gross total: {}", outing.gross_total());
        println!("To settle:   {}", sheet.total_owed());
        for (participant, balance) in sheet.positions() {
            let status = if balance.is_positive() {
                "CREDITOR"
            } else {
                "DEBTOR"
            };
            println!(
                "  {:<20} {:>12}  [{}]",
                participant.to_string(),
                balance.to_string(),
                status
            );
        }
        if sheet.is_empty() {
            println!("  (everyone is settled)");
        }
    }
}

fn cmd_generate(args: &[String]) {
    let mut participants = 10usize;
    let mut items = 30usize;
    let mut output_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--participants" => {
                i += 1;
                participants = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--participants requires a number");
                    process::exit(1);
                });
            }
            "--items" => {
                i += 1;
                items = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--items requires a number");
                    process::exit(1);
                });
            }
            "--output" => {
                i += 1;
                output_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--output requires a file path");
                    process::exit(1);
                }));
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let config = OutingConfig {
        participant_count: participants,
        item_count: items,
        ..Default::default()
    };
    let outing = generate_random_outing(&config);
    let json = serde_json::to_string_pretty(&outing).unwrap();

    if let Some(path) = output_path {
        fs::write(&path, &json).unwrap_or_else(|e| {
            eprintln!("Error writing to '{}': {}", path, e);
            process::exit(1);
        });
        eprintln!(
            "Generated {} items across {} participants → {}",
            outing.len(),
            participants,
            path
        );
    } else {
        println!("{}", json);
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "split" => cmd_split(rest),
        "balances" => cmd_balances(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
