//! Users and roles

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Participant role in the supply chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Farmer,
    Distributor,
    Transporter,
    Shopkeeper,
    Consumer,
}

impl Role {
    /// All registrable roles
    pub const ALL: [Role; 5] = [
        Role::Farmer,
        Role::Distributor,
        Role::Transporter,
        Role::Shopkeeper,
        Role::Consumer,
    ];

    /// Canonical wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Farmer => "FARMER",
            Role::Distributor => "DISTRIBUTOR",
            Role::Transporter => "TRANSPORTER",
            Role::Shopkeeper => "SHOPKEEPER",
            Role::Consumer => "CONSUMER",
        }
    }

    /// Parse a role name, case-insensitive
    pub fn parse(s: &str) -> Option<Role> {
        match s.to_uppercase().as_str() {
            "FARMER" => Some(Role::Farmer),
            "DISTRIBUTOR" => Some(Role::Distributor),
            "TRANSPORTER" => Some(Role::Transporter),
            "SHOPKEEPER" => Some(Role::Shopkeeper),
            "CONSUMER" => Some(Role::Consumer),
            _ => None,
        }
    }

    /// Wallet balance granted at registration. Buying roles start with
    /// demo funds; everyone else starts at zero.
    pub fn starting_wallet_balance(&self) -> Decimal {
        match self {
            Role::Distributor => Decimal::from(50_000),
            Role::Shopkeeper => Decimal::from(20_000),
            _ => Decimal::ZERO,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered participant. The wallet balance is mutated only inside
/// commerce transactions, always together with a `WalletEntry` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: Uuid,
    pub username: String,
    /// Argon2 hash, never serialized out
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub wallet_balance: Decimal,
    pub created_at: DateTime<Utc>,
}
