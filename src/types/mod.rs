//! Core domain types shared by every component.

pub mod config;
pub mod deal;
pub mod decision;
pub mod message;
pub mod meso;
pub mod offer;
pub mod requisition;
pub mod state;
pub mod vendor_profile;

pub use config::{
    AdaptiveFeatures, DeliveryParameter, DynamicRounds, NegotiationConfig, PriceParameter,
    Priority, TermsParameter,
};
pub use deal::{Deal, DealMode, DealStatus};
pub use decision::{
    Action, ActionKind, AdaptiveStrategyLabel, BehavioralExplain, Decision, MesoExplain,
    Sentiment, Thresholds, UtilityBreakdown,
};
pub use message::{Message, MessageRole};
pub use meso::{MesoGenerationType, MesoLabel, MesoOption, MesoRound};
pub use offer::{AccumulatedOffer, Offer, OfferField};
pub use requisition::{Requisition, RequisitionLineItem, VendorHistorySample, WizardInput};
pub use state::{MesoSelection, NegotiationState, ParameterHistory, ParameterKind, VendorEmphasis};
pub use vendor_profile::{BehaviorProfileTag, VendorProfile};
