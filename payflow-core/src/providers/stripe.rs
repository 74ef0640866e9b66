//! Stripe: broad developer-market coverage, strong Visa/Mastercard
//! preference, moderate fees.
//!
//! Grounded on `examples/original_source/providers/stripe_provider.py`.

use std::collections::HashMap;

use crate::models::{CardNetwork, Currency, ErrorKind, PaymentMethod, ProviderCapability, Region};
use crate::provider::SimulatedProvider;

pub fn new() -> SimulatedProvider {
    let capability = ProviderCapability {
        supported_networks: vec![
            CardNetwork::Visa,
            CardNetwork::Mastercard,
            CardNetwork::Amex,
            CardNetwork::Discover,
            CardNetwork::Jcb,
        ],
        supported_methods: vec![
            PaymentMethod::Card,
            PaymentMethod::DigitalWallet,
            PaymentMethod::BankTransfer,
        ],
        supported_currencies: vec![
            Currency::Usd,
            Currency::Eur,
            Currency::Gbp,
            Currency::Sgd,
            Currency::Myr,
        ],
        supported_regions: vec![
            Region::NorthAmerica,
            Region::Europe,
            Region::AsiaPacific,
            Region::SoutheastAsia,
        ],
        min_amount: 0.50,
        max_amount: 999_999.99,
        processing_fee_percent: 2.9,
    };

    let network_preferences = HashMap::from([
        (CardNetwork::Visa, 1.0),
        (CardNetwork::Mastercard, 0.98),
        (CardNetwork::Amex, 0.85),
        (CardNetwork::Discover, 0.95),
        (CardNetwork::Jcb, 0.80),
        (CardNetwork::Diners, 0.70),
        (CardNetwork::Unionpay, 0.60),
    ]);

    let specific_errors = vec![
        ErrorKind::CardDeclined,
        ErrorKind::InsufficientFunds,
        ErrorKind::Timeout,
        ErrorKind::InvalidCardNumber,
        ErrorKind::ExpiredCard,
        ErrorKind::InvalidCvv,
        ErrorKind::FraudDetected,
    ];

    SimulatedProvider::new(
        "stripe",
        capability,
        network_preferences,
        0.5,
        specific_errors,
        0.85,
        200.0,
    )
}
