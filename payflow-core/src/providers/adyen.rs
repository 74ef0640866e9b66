//! Adyen: strongest global network and currency coverage of the four,
//! leans on international acceptance rather than low fees.
//!
//! Grounded on `examples/original_source/providers/adyen_provider.py`.

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
            CardNetwork::Diners,
            CardNetwork::Unionpay,
        ],
        supported_methods: vec![
            PaymentMethod::Card,
            PaymentMethod::DigitalWallet,
            PaymentMethod::BankTransfer,
            PaymentMethod::BuyNowPayLater,
        ],
        supported_currencies: vec![
            Currency::Usd,
            Currency::Eur,
            Currency::Gbp,
            Currency::Sgd,
            Currency::Myr,
            Currency::Thb,
            Currency::Idr,
            Currency::Vnd,
            Currency::Php,
        ],
        supported_regions: vec![
            Region::NorthAmerica,
            Region::Europe,
            Region::AsiaPacific,
            Region::SoutheastAsia,
            Region::LatinAmerica,
            Region::MiddleEast,
        ],
        min_amount: 0.01,
        max_amount: 1_000_000.00,
        processing_fee_percent: 2.5,
    };

    let network_preferences = HashMap::from([
        (CardNetwork::Visa, 1.0),
        (CardNetwork::Mastercard, 1.0),
        (CardNetwork::Amex, 0.95),
        (CardNetwork::Discover, 0.90),
        (CardNetwork::Jcb, 0.95),
        (CardNetwork::Diners, 0.85),
        (CardNetwork::Unionpay, 0.90),
    ]);

    let specific_errors = vec![
        ErrorKind::AuthenticationFailed,
        ErrorKind::BlockedCard,
        ErrorKind::Timeout,
        ErrorKind::NetworkUnavailable,
        ErrorKind::IssuerUnavailable,
        ErrorKind::CurrencyNotSupported,
    ];

    SimulatedProvider::new(
        "adyen",
        capability,
        network_preferences,
        0.7,
        specific_errors,
        0.90,
        150.0,
    )
}
