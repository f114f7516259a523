//! Weighted splits and itemized bills.
//!
//! Demonstrates per-consumer weights and expanding a taxed restaurant
//! bill into expense items.

use rust_decimal_macros::dec;
use split_engine::core::balance::BalanceSheet;
use split_engine::core::bill::{Bill, BillItem};
use split_engine::core::expense::{ExpenseItem, Outing};
use split_engine::core::money::Money;
use split_engine::core::participant::ParticipantId;
use split_engine::settlement::planner::SettlementPlanner;

fn main() {
    let alice = ParticipantId::new("alice");
    let bob = ParticipantId::new("bob");
    let carol = ParticipantId::new("carol");

    // --- Scenario 1: weighted split ---
    println!("━━━ Scenario 1: Weighted Split ━━━\n");

    let mut outing = Outing::new(vec![alice.clone(), bob.clone(), carol.clone()]);
    // carol had two portions, the others one each
    outing.add(
        ExpenseItem::new(
            alice.clone(),
            Money::from_major(100),
            vec![alice.clone(), bob.clone(), carol.clone()],
        )
        .with_weights(vec![dec!(1), dec!(1), dec!(2)])
        .with_label("barbecue"),
    );

    let sheet = BalanceSheet::from_outing(&outing).expect("outing is valid");
    for (participant, balance) in sheet.positions() {
        println!("  {:<8} {:>10}", participant.to_string(), balance.to_string());
    }

    let plan = SettlementPlanner::plan(&sheet).expect("sheet is balanced");
    println!("\n{}", plan);

    // --- Scenario 2: itemized bill with tax and service ---
    println!("━━━ Scenario 2: Itemized Bill ━━━\n");

    let bill = Bill::new(bob.clone())
        .with_tax_rate(dec!(0.05))
        .with_service_charge(dec!(0.10))
        .with_item(BillItem::new(
            "pasta",
            Money::from_major(12),
            2,
            vec![alice.clone(), bob.clone()],
        ))
        .with_item(BillItem::new(
            "wine",
            Money::from_major(30),
            1,
            vec![alice.clone(), bob.clone(), carol.clone()],
        ))
        .with_item(BillItem::new(
            "tiramisu",
            Money::from_minor(850),
            1,
            vec![carol.clone()],
        ));

    let outing = bill.to_outing().expect("bill is valid");
    println!("  Bill total with surcharges: {}\n", outing.gross_total());

    let sheet = BalanceSheet::from_outing(&outing).expect("outing is valid");
    let plan = SettlementPlanner::plan(&sheet).expect("sheet is balanced");
    println!("{}", plan);
}
