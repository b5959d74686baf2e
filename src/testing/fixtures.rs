//! Shared test fixtures: a canonical [`NegotiationConfig`] used across
//! unit tests so examples stay consistent without every test hand-rolling
//! its own numbers.

use crate::types::{NegotiationConfig, PriceParameter, Priority, TermsParameter};
use std::collections::HashMap;

/// A representative config: price-weighted 0.6/terms 0.4, Net30/60/90
/// terms ladder, accept/escalate/walkaway at 0.70/0.50/0.30.
pub fn base_config() -> NegotiationConfig {
    let mut utility_map = HashMap::new();
    utility_map.insert("Net30".to_string(), 0.2);
    utility_map.insert("Net60".to_string(), 0.6);
    utility_map.insert("Net90".to_string(), 1.0);

    NegotiationConfig {
        total_price: PriceParameter {
            weight: 0.6,
            anchor: 850.0,
            target: 1000.0,
            max_acceptable: 1250.0,
            concession_step: 66.0,
        },
        payment_terms: TermsParameter {
            weight: 0.4,
            options: vec!["Net30".into(), "Net60".into(), "Net90".into()],
            utility_map,
        },
        delivery: None,
        accept_threshold: 0.70,
        escalate_threshold: 0.50,
        walkaway_threshold: 0.30,
        max_rounds: 6,
        priority: Priority::Medium,
        dynamic_rounds: None,
        adaptive_features: None,
    }
}
