//! PayPal: wallet-first provider, highest processing fee of the four,
//! narrower currency/amount band (max $60,000).
//!
//! Grounded on `examples/original_source/providers/paypal_provider.py`.

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
        ],
        supported_methods: vec![
            PaymentMethod::DigitalWallet,
            PaymentMethod::Card,
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
        ],
        supported_regions: vec![
            Region::NorthAmerica,
            Region::Europe,
            Region::AsiaPacific,
            Region::SoutheastAsia,
            Region::LatinAmerica,
        ],
        min_amount: 1.00,
        max_amount: 60_000.00,
        processing_fee_percent: 3.49,
    };

    let network_preferences = HashMap::from([
        (CardNetwork::Visa, 0.95),
        (CardNetwork::Mastercard, 0.95),
        (CardNetwork::Amex, 0.90),
        (CardNetwork::Discover, 0.85),
        (CardNetwork::Jcb, 0.70),
        (CardNetwork::Diners, 0.60),
        (CardNetwork::Unionpay, 0.50),
    ]);

    let specific_errors = vec![
        ErrorKind::AccountRestricted,
        ErrorKind::CurrencyNotSupported,
        ErrorKind::Timeout,
        ErrorKind::WalletInsufficientBalance,
        ErrorKind::WalletSuspended,
        ErrorKind::FraudDetected,
    ];

    SimulatedProvider::new(
        "paypal",
        capability,
        network_preferences,
        0.4,
        specific_errors,
        0.80,
        300.0,
    )
}
