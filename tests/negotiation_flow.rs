//! End-to-end exercise of the pipeline against the in-memory `Store`:
//! an opening offer, a counter, and acceptance.

use accordo_negotiator::capabilities::Store as _;
use accordo_negotiator::pipeline::{NegotiationPipeline, PipelineOutcome};
use accordo_negotiator::testing::fixtures::base_config;
use accordo_negotiator::testing::mocks::{InMemoryStore, MockLLMClient, NullNotifier, NullReporter};
use accordo_negotiator::types::{Deal, DealMode, DealStatus};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

#[tokio::test]
async fn full_negotiation_settles_within_round_budget() {
    let store = Arc::new(InMemoryStore::new());
    let pipeline = NegotiationPipeline::new(
        Arc::clone(&store),
        Arc::new(MockLLMClient::scripted("We can work with that, here's our counter.")),
        Arc::new(NullNotifier),
        Arc::new(NullReporter),
    );

    let deal = Deal::new(
        "Integration test deal",
        DealMode::Conversation,
        base_config(),
        Uuid::new_v4(),
        Uuid::new_v4(),
        Uuid::new_v4(),
        Utc::now(),
    );
    store.update_deal(&deal).await.unwrap();

    let opening = pipeline
        .receive_vendor_message(deal.id, "Our price is $1150 at Net30.".to_string(), Utc::now())
        .await
        .unwrap();
    assert!(matches!(opening, PipelineOutcome::Decided(_)));

    let mut final_deal = store.get_deal(deal.id).await.unwrap();
    let mut round = 0;
    while final_deal.status == DealStatus::Negotiating && round < 10 {
        round += 1;
        let vendor_price = 1150.0 - (round as f64 * 60.0);
        let message = format!("We can come down to ${vendor_price:.0} at Net60.");
        pipeline
            .receive_vendor_message(deal.id, message, Utc::now())
            .await
            .unwrap();
        final_deal = store.get_deal(deal.id).await.unwrap();
    }

    assert_ne!(final_deal.status, DealStatus::Negotiating, "deal never concluded");
}

#[tokio::test]
async fn rejects_messages_once_deal_has_concluded() {
    let store = Arc::new(InMemoryStore::new());
    let pipeline = NegotiationPipeline::new(
        Arc::clone(&store),
        Arc::new(MockLLMClient::scripted("counter")),
        Arc::new(NullNotifier),
        Arc::new(NullReporter),
    );

    let mut deal = Deal::new(
        "Closed deal",
        DealMode::Conversation,
        base_config(),
        Uuid::new_v4(),
        Uuid::new_v4(),
        Uuid::new_v4(),
        Utc::now(),
    );
    deal.transition_to(DealStatus::Accepted, Utc::now()).unwrap();
    store.update_deal(&deal).await.unwrap();

    let result = pipeline
        .receive_vendor_message(deal.id, "$900, Net30".to_string(), Utc::now())
        .await;
    assert!(result.is_err());
}
