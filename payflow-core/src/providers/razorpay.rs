//! Razorpay: Southeast Asia-focused provider, lowest fee of the four,
//! strongest UnionPay/JCB preference reflecting its regional footprint.
//!
//! Grounded on `examples/original_source/providers/razorpay_provider.py`.

use std::collections::HashMap;

use crate::models::{CardNetwork, Currency, ErrorKind, PaymentMethod, ProviderCapability, Region};
use crate::provider::SimulatedProvider;

pub fn new() -> SimulatedProvider {
    let capability = ProviderCapability {
        supported_networks: vec![
            CardNetwork::Visa,
            CardNetwork::Mastercard,
            CardNetwork::Amex,
            CardNetwork::Jcb,
            CardNetwork::Unionpay,
        ],
        supported_methods: vec![
            PaymentMethod::Card,
            PaymentMethod::DigitalWallet,
            PaymentMethod::BankTransfer,
            PaymentMethod::BuyNowPayLater,
        ],
        supported_currencies: vec![
            Currency::Sgd,
            Currency::Myr,
            Currency::Thb,
            Currency::Idr,
            Currency::Vnd,
            Currency::Php,
            Currency::Usd,
            Currency::Eur,
        ],
        supported_regions: vec![
            Region::SoutheastAsia,
            Region::AsiaPacific,
            Region::NorthAmerica,
            Region::Europe,
        ],
        min_amount: 0.10,
        max_amount: 500_000.00,
        processing_fee_percent: 2.0,
    };

    let network_preferences = HashMap::from([
        (CardNetwork::Visa, 0.98),
        (CardNetwork::Mastercard, 0.96),
        (CardNetwork::Unionpay, 0.92),
        (CardNetwork::Jcb, 0.90),
        (CardNetwork::Amex, 0.75),
        (CardNetwork::Discover, 0.70),
        (CardNetwork::Diners, 0.65),
    ]);

    let specific_errors = vec![
        ErrorKind::RegionBlocked,
        ErrorKind::ComplianceViolation,
        ErrorKind::Timeout,
        ErrorKind::CurrencyNotSupported,
        ErrorKind::BankTransferLimitExceeded,
        ErrorKind::NetworkTimeout,
    ];

    SimulatedProvider::new(
        "razorpay",
        capability,
        network_preferences,
        0.5,
        specific_errors,
        0.88,
        180.0,
    )
}
