//! Demo user seeding
//!
//! One account per role, all with the password `password123`. Existing
//! usernames are skipped so the seeder is safe to re-run.

use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use argon2::Argon2;

use agrichain_core::types::Role;
use agrichain_store::{ChainStore, NewUser, StoreError};

const DEMO_PASSWORD: &str = "password123";

const DEMO_USERS: &[(&str, Role)] = &[
    ("farmer_joe", Role::Farmer),
    ("distributor_dave", Role::Distributor),
    ("transporter_tom", Role::Transporter),
    ("shop_sarah", Role::Shopkeeper),
    ("consumer_carl", Role::Consumer),
];

fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| format!("failed to hash password: {e}"))
}

/// Seed the demo accounts, skipping any that already exist.
pub async fn seed_demo_users(
    store: &dyn ChainStore,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let password_hash = hash_password(DEMO_PASSWORD)?;
    for (username, role) in DEMO_USERS {
        match store
            .create_user(NewUser {
                username: username.to_string(),
                password_hash: password_hash.clone(),
                role: *role,
            })
            .await
        {
            Ok(user) => {
                tracing::info!(
                    username = %user.username,
                    role = %user.role,
                    wallet = %user.wallet_balance,
                    "seeded user"
                );
            }
            Err(StoreError::Domain(agrichain_core::CoreError::Conflict(_))) => {
                tracing::info!(username, "user already exists, skipping");
            }
            Err(err) => return Err(err.into()),
        }
    }
    tracing::info!("seeding complete, all demo users share the password '{DEMO_PASSWORD}'");
    Ok(())
}
