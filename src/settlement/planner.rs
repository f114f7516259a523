use crate::core::balance::BalanceSheet;
use crate::core::money::Money;
use crate::core::participant::ParticipantId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};
use thiserror::Error;

/// Internal-fault errors from settlement planning.
///
/// These never indicate bad user input — input validation happens in the
/// aggregator. A violation here means an upstream invariant broke, so it
/// is logged and surfaced rather than silently corrected.
#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("balance sheet is unbalanced: residual {residual}")]
    Unbalanced { residual: Money },
    #[error("nonzero residual after settlement: {participant} retains {amount}")]
    ResidualBalance {
        participant: ParticipantId,
        amount: Money,
    },
}

/// A single payment: the owning plan's debtor pays `to` this `amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub to: ParticipantId,
    pub amount: Money,
}

/// All payments one debtor must make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentPlan {
    pub debtor: ParticipantId,
    pub payments: Vec<Payment>,
}

impl PaymentPlan {
    /// Total outgoing amount for this debtor.
    pub fn total(&self) -> Money {
        self.payments.iter().map(|p| p.amount).sum()
    }
}

/// The full settlement: payment plans grouped by debtor.
///
/// Plans appear in the order each debtor was first matched by the
/// greedy loop, which is deterministic for identical input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPlan {
    plans: Vec<PaymentPlan>,
}

impl SettlementPlan {
    pub fn plans(&self) -> &[PaymentPlan] {
        &self.plans
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Total number of individual payments.
    pub fn payment_count(&self) -> usize {
        self.plans.iter().map(|p| p.payments.len()).sum()
    }

    /// Total amount changing hands.
    pub fn total_transferred(&self) -> Money {
        self.plans.iter().map(|p| p.total()).sum()
    }

    /// Total outgoing amount for a debtor.
    pub fn outgoing_total(&self, debtor: &ParticipantId) -> Money {
        self.plans
            .iter()
            .filter(|plan| &plan.debtor == debtor)
            .map(|plan| plan.total())
            .sum()
    }

    /// Total incoming amount for a creditor.
    pub fn incoming_total(&self, creditor: &ParticipantId) -> Money {
        self.plans
            .iter()
            .flat_map(|plan| plan.payments.iter())
            .filter(|payment| &payment.to == creditor)
            .map(|payment| payment.amount)
            .sum()
    }

    /// Verify conservation against the sheet the plan was built from:
    /// every debtor pays out exactly the magnitude of their negative
    /// balance, every creditor receives exactly their positive balance.
    pub fn conserves(&self, sheet: &BalanceSheet) -> bool {
        sheet.debtors().all(|(debtor, balance)| {
            self.outgoing_total(debtor) == balance.abs()
        }) && sheet.creditors().all(|(creditor, balance)| {
            self.incoming_total(creditor) == balance
        })
    }
}

impl std::fmt::Display for SettlementPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Settlement Plan ===")?;
        writeln!(f, "Payments:    {}", self.payment_count())?;
        writeln!(f, "Transferred: {}", self.total_transferred())?;
        for plan in &self.plans {
            writeln!(f, "\n{} pays:", plan.debtor)?;
            for payment in &plan.payments {
                writeln!(f, "  {:>10}  to {}", payment.amount.to_string(), payment.to)?;
            }
        }
        Ok(())
    }
}

/// One side of the matching: a participant and the positive magnitude
/// of their remaining balance. Max-heap order is magnitude descending,
/// ties broken by ascending participant ID for determinism.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OpenPosition {
    magnitude: Money,
    participant: ParticipantId,
}

impl Ord for OpenPosition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.magnitude
            .cmp(&other.magnitude)
            .then_with(|| other.participant.cmp(&self.participant))
    }
}

impl PartialOrd for OpenPosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The settlement planner.
///
/// Greedy matching: repeatedly settle the largest-magnitude creditor
/// against the largest-magnitude debtor. Each iteration zeroes at least
/// one participant, so the plan never exceeds `n - 1` payments for `n`
/// nonzero balances, in `O(n log n)` overall.
///
/// True minimum-payment-count settlement is NP-hard and is not
/// attempted.
pub struct SettlementPlanner;

impl SettlementPlanner {
    /// Produce the payments that clear every balance on the sheet.
    pub fn plan(sheet: &BalanceSheet) -> Result<SettlementPlan, SettlementError> {
        let residual: Money = sheet.positions().values().copied().sum();
        if !residual.is_zero() {
            log::error!("balance sheet arrived unbalanced, residual {residual}");
            return Err(SettlementError::Unbalanced { residual });
        }

        let mut creditors: BinaryHeap<OpenPosition> = sheet
            .creditors()
            .map(|(participant, balance)| OpenPosition {
                magnitude: balance,
                participant: participant.clone(),
            })
            .collect();
        let mut debtors: BinaryHeap<OpenPosition> = sheet
            .debtors()
            .map(|(participant, balance)| OpenPosition {
                magnitude: balance.abs(),
                participant: participant.clone(),
            })
            .collect();

        // Plans keep first-payment order; the map locates a debtor's
        // plan without scanning the whole vector each round.
        let mut plans: Vec<PaymentPlan> = Vec::new();
        let mut plan_index: BTreeMap<ParticipantId, usize> = BTreeMap::new();
        loop {
            let (creditor, debtor) = match (creditors.pop(), debtors.pop()) {
                (Some(c), Some(d)) => (c, d),
                (None, None) => break,
                // Zero-sum input guarantees both sides empty together; a
                // leftover on either side is a fault in this planner.
                (Some(leftover), None) | (None, Some(leftover)) => {
                    log::error!(
                        "settlement left {} holding {}",
                        leftover.participant,
                        leftover.magnitude
                    );
                    return Err(SettlementError::ResidualBalance {
                        participant: leftover.participant,
                        amount: leftover.magnitude,
                    });
                }
            };

            let amount = creditor.magnitude.min(debtor.magnitude);
            let payment = Payment {
                to: creditor.participant.clone(),
                amount,
            };
            match plan_index.get(&debtor.participant) {
                Some(&at) => plans[at].payments.push(payment),
                None => {
                    plan_index.insert(debtor.participant.clone(), plans.len());
                    plans.push(PaymentPlan {
                        debtor: debtor.participant.clone(),
                        payments: vec![payment],
                    });
                }
            }

            let creditor_rest = creditor.magnitude - amount;
            if creditor_rest.is_positive() {
                creditors.push(OpenPosition {
                    magnitude: creditor_rest,
                    participant: creditor.participant,
                });
            }
            let debtor_rest = debtor.magnitude - amount;
            if debtor_rest.is_positive() {
                debtors.push(OpenPosition {
                    magnitude: debtor_rest,
                    participant: debtor.participant,
                });
            }
        }

        Ok(SettlementPlan { plans })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(name: &str) -> ParticipantId {
        ParticipantId::new(name)
    }

    fn sheet(positions: Vec<(&str, i64)>) -> BalanceSheet {
        BalanceSheet::from_positions(
            positions
                .into_iter()
                .map(|(name, major)| (p(name), Money::from_major(major))),
        )
    }

    #[test]
    fn test_single_creditor_two_debtors() {
        let sheet = sheet(vec![("alice", 200), ("bob", -100), ("carol", -100)]);
        let plan = SettlementPlanner::plan(&sheet).unwrap();

        assert_eq!(plan.payment_count(), 2);
        assert_eq!(plan.incoming_total(&p("alice")), Money::from_major(200));
        assert_eq!(plan.outgoing_total(&p("bob")), Money::from_major(100));
        assert_eq!(plan.outgoing_total(&p("carol")), Money::from_major(100));
        assert!(plan.conserves(&sheet));
    }

    #[test]
    fn test_chained_settlement_within_bound() {
        // {A: +300, B: +100, C: -250, D: -150} must settle in <= 3 payments.
        let sheet = sheet(vec![("A", 300), ("B", 100), ("C", -250), ("D", -150)]);
        let plan = SettlementPlanner::plan(&sheet).unwrap();

        assert!(plan.payment_count() <= 3);
        assert!(plan.conserves(&sheet));

        // D pays twice (B, then A's remainder); both payments must land
        // in D's single plan rather than split across duplicates.
        assert_eq!(plan.plans().len(), 2);
        let d_plan = plan
            .plans()
            .iter()
            .find(|pp| pp.debtor == p("D"))
            .unwrap();
        assert_eq!(d_plan.payments.len(), 2);
        assert_eq!(d_plan.total(), Money::from_major(150));
    }

    #[test]
    fn test_empty_sheet_produces_empty_plan() {
        let plan = SettlementPlanner::plan(&BalanceSheet::default()).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.payment_count(), 0);
        assert_eq!(plan.total_transferred(), Money::ZERO);
    }

    #[test]
    fn test_two_party_settlement() {
        let sheet = sheet(vec![("alice", 40), ("bob", -40)]);
        let plan = SettlementPlanner::plan(&sheet).unwrap();

        assert_eq!(plan.payment_count(), 1);
        let only = &plan.plans()[0];
        assert_eq!(only.debtor, p("bob"));
        assert_eq!(only.payments[0].to, p("alice"));
        assert_eq!(only.payments[0].amount, Money::from_major(40));
    }

    #[test]
    fn test_deterministic_tie_break() {
        // Equal magnitudes everywhere: ties resolve by ascending ID.
        let sheet = sheet(vec![("c1", 50), ("c2", 50), ("d1", -50), ("d2", -50)]);
        let plan1 = SettlementPlanner::plan(&sheet).unwrap();
        let plan2 = SettlementPlanner::plan(&sheet).unwrap();

        assert_eq!(plan1, plan2);
        assert_eq!(plan1.plans()[0].debtor, p("d1"));
        assert_eq!(plan1.plans()[0].payments[0].to, p("c1"));
    }

    #[test]
    fn test_no_self_payment() {
        let sheet = sheet(vec![("alice", 75), ("bob", -25), ("carol", -50)]);
        let plan = SettlementPlanner::plan(&sheet).unwrap();
        for payment_plan in plan.plans() {
            for payment in &payment_plan.payments {
                assert_ne!(payment.to, payment_plan.debtor);
            }
        }
    }

    #[test]
    fn test_unbalanced_sheet_is_internal_fault() {
        let sheet = BalanceSheet::from_positions(vec![(p("alice"), Money::from_major(10))]);
        let result = SettlementPlanner::plan(&sheet);
        assert!(matches!(
            result,
            Err(SettlementError::Unbalanced { residual }) if residual == Money::from_major(10)
        ));
    }

    #[test]
    fn test_plan_json_shape() {
        let sheet = sheet(vec![("alice", 100), ("bob", -100)]);
        let plan = SettlementPlanner::plan(&sheet).unwrap();
        let json = serde_json::to_string(&plan).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["plans"][0]["debtor"], "bob");
        assert_eq!(parsed["plans"][0]["payments"][0]["to"], "alice");
        assert_eq!(parsed["plans"][0]["payments"][0]["amount"], "100.00");
    }

    #[test]
    fn test_display_summary() {
        let sheet = sheet(vec![("alice", 100), ("bob", -100)]);
        let plan = SettlementPlanner::plan(&sheet).unwrap();
        let rendered = plan.to_string();
        assert!(rendered.contains("Payments:    1"));
        assert!(rendered.contains("bob pays:"));
    }
}
