use crate::core::expense::{scaled_weights, ExpenseItem, InvalidOutingError, Outing};
use crate::core::money::Money;
use crate::core::participant::ParticipantId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The net position of every participant after aggregating an outing.
///
/// A positive balance means the participant is owed (net creditor).
/// A negative balance means the participant owes (net debtor).
/// Participants who end up exactly settled are dropped, so the sheet
/// never produces phantom transactions downstream.
///
/// Invariant: the positions sum to exactly zero. Aggregation works in
/// integer minor units throughout, so this holds exactly, not up to an
/// epsilon.
///
/// # Examples
///
/// ```
/// use split_engine::core::balance::BalanceSheet;
/// use split_engine::core::expense::{ExpenseItem, Outing};
/// use split_engine::core::money::Money;
/// use split_engine::core::participant::ParticipantId;
///
/// let mut outing = Outing::new(vec![
///     ParticipantId::new("alice"),
///     ParticipantId::new("bob"),
/// ]);
/// outing.add(ExpenseItem::new(
///     ParticipantId::new("alice"),
///     Money::from_major(10),
///     vec![ParticipantId::new("bob")],
/// ));
///
/// let sheet = BalanceSheet::from_outing(&outing).unwrap();
/// assert_eq!(sheet.balance(&ParticipantId::new("alice")), Money::from_major(10));
/// assert_eq!(sheet.balance(&ParticipantId::new("bob")), -Money::from_major(10));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheet {
    /// ParticipantId -> net balance. Positive = creditor, negative = debtor.
    positions: BTreeMap<ParticipantId, Money>,
}

impl BalanceSheet {
    /// Aggregate an outing into net balances.
    ///
    /// Validates every domain invariant first (see [`Outing::validate`]),
    /// then credits each payer the full item amount and debits each
    /// consumer their share, all in integer cents.
    ///
    /// # Rounding
    ///
    /// When an amount does not divide evenly, shares are floored and the
    /// leftover cents are handed out one at a time to consumers in
    /// ascending `ParticipantId` order (weighted items: only consumers
    /// with a positive weight). Per-item shares always sum exactly to
    /// the item amount, so the sheet always balances to zero.
    pub fn from_outing(outing: &Outing) -> Result<Self, InvalidOutingError> {
        outing.validate()?;

        let mut positions: BTreeMap<ParticipantId, Money> = BTreeMap::new();
        for (index, item) in outing.items().iter().enumerate() {
            *positions.entry(item.payer().clone()).or_insert(Money::ZERO) += item.amount();

            // Validation already vetted the weights; a failure here would
            // mean the two checks disagree, so surface it, never wrap.
            let shares = split_item(item)
                .ok_or(InvalidOutingError::UnrepresentableWeights { index })?;
            for (consumer, share) in shares {
                log::debug!(
                    "item {}: {} consumes {} of {}",
                    item.id(),
                    consumer,
                    share,
                    item.amount()
                );
                *positions.entry(consumer).or_insert(Money::ZERO) -= share;
            }
        }

        positions.retain(|_, balance| !balance.is_zero());

        let sheet = Self { positions };
        debug_assert!(sheet.is_balanced());
        Ok(sheet)
    }

    /// Build a sheet directly from positions. Zero entries are dropped;
    /// duplicate keys accumulate.
    pub fn from_positions(positions: impl IntoIterator<Item = (ParticipantId, Money)>) -> Self {
        let mut map: BTreeMap<ParticipantId, Money> = BTreeMap::new();
        for (participant, amount) in positions {
            *map.entry(participant).or_insert(Money::ZERO) += amount;
        }
        map.retain(|_, balance| !balance.is_zero());
        Self { positions: map }
    }

    /// The net position of a participant. Settled participants read zero.
    pub fn balance(&self, participant: &ParticipantId) -> Money {
        self.positions
            .get(participant)
            .copied()
            .unwrap_or(Money::ZERO)
    }

    /// All nonzero positions, in ascending participant order.
    pub fn positions(&self) -> &BTreeMap<ParticipantId, Money> {
        &self.positions
    }

    /// Participants owed money, in ascending participant order.
    pub fn creditors(&self) -> impl Iterator<Item = (&ParticipantId, Money)> {
        self.positions
            .iter()
            .filter(|(_, balance)| balance.is_positive())
            .map(|(participant, balance)| (participant, *balance))
    }

    /// Participants owing money, in ascending participant order.
    pub fn debtors(&self) -> impl Iterator<Item = (&ParticipantId, Money)> {
        self.positions
            .iter()
            .filter(|(_, balance)| balance.is_negative())
            .map(|(participant, balance)| (participant, *balance))
    }

    /// Verify the zero-sum invariant: positions sum to exactly zero.
    pub fn is_balanced(&self) -> bool {
        self.positions.values().copied().sum::<Money>() == Money::ZERO
    }

    /// Total amount owed to creditors (equals total owed by debtors).
    pub fn total_owed(&self) -> Money {
        self.positions
            .values()
            .copied()
            .filter(|balance| balance.is_positive())
            .sum()
    }

    /// Number of participants with a nonzero balance.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Split one item's amount across its consumers.
///
/// Returns (consumer, share) pairs in ascending `ParticipantId` order
/// with shares summing exactly to the item amount, or `None` when the
/// weights cannot be scaled to integers without overflow (validation
/// rejects such items up front). All arithmetic is checked.
fn split_item(item: &ExpenseItem) -> Option<Vec<(ParticipantId, Money)>> {
    let total = item.amount().minor_units();

    // Pair consumers with their scaled weight and fix the deterministic
    // order. Scaling uses a common power of ten per item, so the integer
    // weights keep their exact ratios.
    let mut consumers: Vec<(ParticipantId, Option<i128>)> = match item.weights() {
        Some(weights) => {
            let (scaled, _) = scaled_weights(weights)?;
            item.consumers()
                .iter()
                .cloned()
                .zip(scaled.into_iter().map(Some))
                .collect()
        }
        None => item
            .consumers()
            .iter()
            .cloned()
            .map(|c| (c, None))
            .collect(),
    };
    consumers.sort_by(|a, b| a.0.cmp(&b.0));

    let mut shares: Vec<(ParticipantId, i64)> = match item.weights() {
        None => {
            let n = consumers.len() as i64;
            let base = total / n;
            consumers
                .iter()
                .map(|(consumer, _)| (consumer.clone(), base))
                .collect()
        }
        Some(_) => {
            let weight_sum: i128 = consumers.iter().filter_map(|(_, w)| *w).sum();
            consumers
                .iter()
                .map(|(consumer, weight)| {
                    let weight = weight.unwrap_or(0);
                    let share = (total as i128).checked_mul(weight)? / weight_sum;
                    Some((consumer.clone(), share as i64))
                })
                .collect::<Option<Vec<_>>>()?
        }
    };

    // Floor division leaves at most one cent per consumer unallocated.
    // Hand the remainder out in ascending key order, skipping zero-weight
    // consumers so they stay at exactly zero.
    let allocated: i64 = shares.iter().map(|(_, share)| *share).sum();
    let mut remainder = total - allocated;
    for (i, (_, weight)) in consumers.iter().enumerate() {
        if remainder == 0 {
            break;
        }
        if weight.map_or(true, |w| w > 0) {
            shares[i].1 += 1;
            remainder -= 1;
        }
    }

    Some(
        shares
            .into_iter()
            .map(|(consumer, share)| (consumer, Money::from_minor(share)))
            .collect(),
    )
}
