use crate::core::money::Money;
use crate::core::participant::ParticipantId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised when an outing fails domain validation.
///
/// These are user-input errors: the surrounding service surfaces them as
/// request rejections. They are detected before any balance is computed,
/// so aggregation is all-or-nothing.
#[derive(Debug, Error)]
pub enum InvalidOutingError {
    #[error("outing has no participants")]
    EmptyParticipants,
    #[error("item {index}: amount {amount} must be positive")]
    NonPositiveAmount { index: usize, amount: Money },
    #[error("item {index}: unknown participant '{id}'")]
    UnknownParticipant { index: usize, id: ParticipantId },
    #[error("item {index}: consumer list is empty")]
    NoConsumers { index: usize },
    #[error("item {index}: duplicate consumer '{id}'")]
    DuplicateConsumer { index: usize, id: ParticipantId },
    #[error("item {index}: {expected} consumers but {actual} weights")]
    WeightCountMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("item {index}: weight {weight} is negative")]
    NegativeWeight { index: usize, weight: Decimal },
    #[error("item {index}: weights sum to zero")]
    ZeroWeightSum { index: usize },
    #[error("item {index}: weights span too many orders of magnitude to split exactly")]
    UnrepresentableWeights { index: usize },
}

/// Scale a slice of decimal weights to exact integers by a common power
/// of ten, preserving their ratios. Returns the scaled weights and
/// their sum, or `None` when the mix of magnitudes does not fit in
/// 128-bit integers (e.g. a huge integer weight next to a weight with
/// dozens of fractional digits).
pub(crate) fn scaled_weights(weights: &[Decimal]) -> Option<(Vec<i128>, i128)> {
    let scale = weights
        .iter()
        .map(|w| w.normalize().scale())
        .max()
        .unwrap_or(0);

    let mut scaled = Vec::with_capacity(weights.len());
    let mut sum: i128 = 0;
    for weight in weights {
        let normalized = weight.normalize();
        let shift = 10i128.checked_pow(scale - normalized.scale())?;
        let value = normalized.mantissa().checked_mul(shift)?;
        sum = sum.checked_add(value)?;
        scaled.push(value);
    }
    Some((scaled, sum))
}

/// One line of shared spending: a single payer, one or more consumers.
///
/// Immutable once created. Consumers may carry optional weights —
/// non-negative relative shares, one per consumer. Without weights the
/// amount splits equally. A zero-weight consumer receives no share.
///
/// Construction does not validate; domain validation happens when the
/// containing [`Outing`] is aggregated, so that a malformed item is
/// reported with its position in the outing.
///
/// # Examples
///
/// ```
/// use split_engine::core::expense::ExpenseItem;
/// use split_engine::core::money::Money;
/// use split_engine::core::participant::ParticipantId;
///
/// let item = ExpenseItem::new(
///     ParticipantId::new("alice"),
///     Money::from_major(300),
///     vec![
///         ParticipantId::new("alice"),
///         ParticipantId::new("bob"),
///         ParticipantId::new("carol"),
///     ],
/// );
/// assert_eq!(item.amount(), Money::from_major(300));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseItem {
    /// Unique identifier for this item.
    #[serde(default = "Uuid::new_v4")]
    id: Uuid,
    /// Optional human-readable label ("pizza", "taxi").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    /// The full amount paid. Must be positive.
    amount: Money,
    /// The participant who paid.
    payer: ParticipantId,
    /// The participants who consumed. Non-empty, no duplicates.
    consumers: Vec<ParticipantId>,
    /// Optional relative shares, one per consumer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    weights: Option<Vec<Decimal>>,
}

impl ExpenseItem {
    /// Create a new equally-split expense item.
    pub fn new(payer: ParticipantId, amount: Money, consumers: Vec<ParticipantId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: None,
            amount,
            payer,
            consumers,
            weights: None,
        }
    }

    /// Create an item with a specific ID (useful for testing / determinism).
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Set a human-readable label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set per-consumer relative shares.
    pub fn with_weights(mut self, weights: Vec<Decimal>) -> Self {
        self.weights = Some(weights);
        self
    }

    // --- Accessors ---

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn payer(&self) -> &ParticipantId {
        &self.payer
    }

    pub fn consumers(&self) -> &[ParticipantId] {
        &self.consumers
    }

    pub fn weights(&self) -> Option<&[Decimal]> {
        self.weights.as_deref()
    }
}

/// An ordered sequence of expense items plus the full participant set.
///
/// Built per settlement request from already-deserialized input and
/// immutable once constructed; it has no existence beyond one
/// computation. Shape-validity (fields present, correct types) is the
/// caller's concern; domain invariants are re-checked by
/// [`validate`](Outing::validate).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outing {
    /// Everyone on the outing, including pure payers and pure consumers.
    participants: BTreeSet<ParticipantId>,
    /// The expense items, in entry order.
    items: Vec<ExpenseItem>,
    /// When this outing was recorded.
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
}

impl Outing {
    /// Create an outing over the given participant set.
    pub fn new(participants: impl IntoIterator<Item = ParticipantId>) -> Self {
        Self {
            participants: participants.into_iter().collect(),
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Add an expense item.
    pub fn add(&mut self, item: ExpenseItem) {
        self.items.push(item);
    }

    pub fn participants(&self) -> &BTreeSet<ParticipantId> {
        &self.participants
    }

    pub fn items(&self) -> &[ExpenseItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Total gross value of all items.
    pub fn gross_total(&self) -> Money {
        self.items.iter().map(|i| i.amount()).sum()
    }

    /// Check every domain invariant: non-empty participant set, known
    /// payer and consumers, positive amounts, non-empty duplicate-free
    /// consumer lists, well-formed weights.
    pub fn validate(&self) -> Result<(), InvalidOutingError> {
        if self.participants.is_empty() {
            return Err(InvalidOutingError::EmptyParticipants);
        }

        for (index, item) in self.items.iter().enumerate() {
            if !item.amount().is_positive() {
                return Err(InvalidOutingError::NonPositiveAmount {
                    index,
                    amount: item.amount(),
                });
            }
            if !self.participants.contains(item.payer()) {
                return Err(InvalidOutingError::UnknownParticipant {
                    index,
                    id: item.payer().clone(),
                });
            }
            if item.consumers().is_empty() {
                return Err(InvalidOutingError::NoConsumers { index });
            }

            let mut seen = HashSet::new();
            for consumer in item.consumers() {
                if !self.participants.contains(consumer) {
                    return Err(InvalidOutingError::UnknownParticipant {
                        index,
                        id: consumer.clone(),
                    });
                }
                if !seen.insert(consumer) {
                    return Err(InvalidOutingError::DuplicateConsumer {
                        index,
                        id: consumer.clone(),
                    });
                }
            }

            if let Some(weights) = item.weights() {
                if weights.len() != item.consumers().len() {
                    return Err(InvalidOutingError::WeightCountMismatch {
                        index,
                        expected: item.consumers().len(),
                        actual: weights.len(),
                    });
                }
                for weight in weights {
                    if weight.is_sign_negative() && !weight.is_zero() {
                        return Err(InvalidOutingError::NegativeWeight {
                            index,
                            weight: *weight,
                        });
                    }
                }
                if weights.iter().sum::<Decimal>().is_zero() {
                    return Err(InvalidOutingError::ZeroWeightSum { index });
                }
                // Allocation multiplies the item amount by each scaled
                // weight; both the scaling and those products must fit.
                let total = item.amount().minor_units() as i128;
                let representable = scaled_weights(weights).map_or(false, |(scaled, _)| {
                    scaled.iter().all(|w| total.checked_mul(*w).is_some())
                });
                if !representable {
                    return Err(InvalidOutingError::UnrepresentableWeights { index });
                }
            }
        }

        Ok(())
    }
}

impl FromIterator<ExpenseItem> for Outing {
    /// Build an outing whose participant set is exactly the union of
    /// payers and consumers across the items.
    fn from_iter<T: IntoIterator<Item = ExpenseItem>>(iter: T) -> Self {
        let items: Vec<ExpenseItem> = iter.into_iter().collect();
        let participants: BTreeSet<ParticipantId> = items
            .iter()
            .flat_map(|i| {
                std::iter::once(i.payer().clone()).chain(i.consumers().iter().cloned())
            })
            .collect();
        Self {
            participants,
            items,
            created_at: Utc::now(),
        }
    }
}
