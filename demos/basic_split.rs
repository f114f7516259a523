//! Basic expense splitting example.
//!
//! Demonstrates the full pipeline: outing → net balances → settlement plan.

use split_engine::core::balance::BalanceSheet;
use split_engine::core::expense::{ExpenseItem, Outing};
use split_engine::core::money::Money;
use split_engine::core::participant::ParticipantId;
use split_engine::settlement::planner::SettlementPlanner;

fn main() {
    println!("╔═══════════════════════════════════════╗");
    println!("║  split-engine: Basic Split Example    ║");
    println!("╚═══════════════════════════════════════╝\n");

    let alice = ParticipantId::new("alice");
    let bob = ParticipantId::new("bob");
    let carol = ParticipantId::new("carol");
    let dave = ParticipantId::new("dave");

    let mut outing = Outing::new(vec![
        alice.clone(),
        bob.clone(),
        carol.clone(),
        dave.clone(),
    ]);

    // A weekend of shared costs
    outing.add(
        ExpenseItem::new(
            alice.clone(),
            Money::from_major(180),
            vec![alice.clone(), bob.clone(), carol.clone(), dave.clone()],
        )
        .with_label("cabin"),
    );
    outing.add(
        ExpenseItem::new(
            bob.clone(),
            Money::from_minor(9_420),
            vec![bob.clone(), carol.clone(), dave.clone()],
        )
        .with_label("groceries"),
    );
    outing.add(
        ExpenseItem::new(
            carol.clone(),
            Money::from_minor(4_650),
            vec![alice.clone(), dave.clone()],
        )
        .with_label("fuel"),
    );

    println!("━━━ Expenses ━━━\n");
    for item in outing.items() {
        println!(
            "  {:<12} {:>10}  paid by {}",
            item.label().unwrap_or("(unlabeled)"),
            item.amount().to_string(),
            item.payer()
        );
    }
    println!("\n  Gross total: {}\n", outing.gross_total());

    let sheet = BalanceSheet::from_outing(&outing).expect("outing is valid");

    println!("━━━ Net Balances ━━━\n");
    for (participant, balance) in sheet.positions() {
        let status = if balance.is_positive() {
            "CREDITOR"
        } else {
            "DEBTOR"
        };
        println!(
            "  {:<12} {:>10}  [{}]",
            participant.to_string(),
            balance.to_string(),
            status
        );
    }
    println!();

    let plan = SettlementPlanner::plan(&sheet).expect("sheet is balanced");
    println!("{}", plan);
}
