//! Random outing generation.
//!
//! Produces randomized outings to exercise aggregation and settlement
//! under load (benchmarks, the CLI `generate` command, randomized tests).

use crate::core::expense::{ExpenseItem, Outing};
use crate::core::money::Money;
use crate::core::participant::ParticipantId;
use rand::Rng;
use rust_decimal::Decimal;

/// Configuration for generating a random outing.
#[derive(Debug, Clone)]
pub struct OutingConfig {
    /// Number of participants.
    pub participant_count: usize,
    /// Number of expense items.
    pub item_count: usize,
    /// Minimum item amount in minor units.
    pub min_amount: i64,
    /// Maximum item amount in minor units.
    pub max_amount: i64,
    /// Probability that an item carries random weights.
    pub weighted_ratio: f64,
}

impl Default for OutingConfig {
    fn default() -> Self {
        Self {
            participant_count: 10,
            item_count: 30,
            min_amount: 100,
            max_amount: 50_000,
            weighted_ratio: 0.2,
        }
    }
}

/// Generate a random valid outing for testing.
pub fn generate_random_outing(config: &OutingConfig) -> Outing {
    let mut rng = rand::thread_rng();

    let participants: Vec<ParticipantId> = (0..config.participant_count.max(1))
        .map(|i| ParticipantId::new(format!("guest-{:03}", i)))
        .collect();

    let mut outing = Outing::new(participants.clone());

    for _ in 0..config.item_count {
        let payer = participants[rng.gen_range(0..participants.len())].clone();

        let consumer_count = rng.gen_range(1..=participants.len());
        let mut pool = participants.clone();
        let mut consumers = Vec::with_capacity(consumer_count);
        for _ in 0..consumer_count {
            consumers.push(pool.swap_remove(rng.gen_range(0..pool.len())));
        }

        let amount = Money::from_minor(rng.gen_range(config.min_amount..=config.max_amount));
        let mut item = ExpenseItem::new(payer, amount, consumers.clone());

        if rng.gen_bool(config.weighted_ratio) {
            let weights: Vec<Decimal> = (0..consumers.len())
                .map(|_| Decimal::from(rng.gen_range(1u32..10)))
                .collect();
            item = item.with_weights(weights);
        }

        outing.add(item);
    }

    outing
}
