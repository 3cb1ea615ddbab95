// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Loan-Desk headless client
//!
//! Signs in and follows the caller's loan requests live, logging every
//! change until interrupted.

use loan_desk::{
    config::Config,
    db::FirestoreStore,
    flows::{ListSpec, ListState, LiveList, RefreshPolicy, SessionFlow},
    models::LoanSummary,
    services::{AuthService, FirebaseAuth},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(project = %config.project_id, "Starting Loan-Desk client");

    let store = FirestoreStore::new(&config.project_id).await?;
    let auth: Arc<dyn AuthService> = Arc::new(FirebaseAuth::new(&config));

    let mut session = SessionFlow::new(auth.clone());
    if session
        .sign_in(&config.email, &config.password)
        .await
        .is_none()
    {
        let reason = session
            .message()
            .unwrap_or("LOAN_DESK_EMAIL and LOAN_DESK_PASSWORD must be set");
        anyhow::bail!("Sign-in failed: {}", reason);
    }

    let spec = ListSpec::loans(&config.collections);
    let mut loans = LiveList::open(&store, auth.as_ref(), &spec, RefreshPolicy::default()).await;
    log_state(&loans.state());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, shutting down");
                break;
            }
            state = loans.changed() => match state {
                Some(state) => log_state(&state),
                None => {
                    tracing::info!("Loan list closed");
                    break;
                }
            }
        }
    }

    loans.close().await;
    auth.sign_out();
    Ok(())
}

fn log_state(state: &ListState) {
    match state {
        ListState::Loading => tracing::info!("Loading loans"),
        ListState::Empty => tracing::info!("No loan requests"),
        ListState::Populated(records) => {
            for loan in records.iter().map(LoanSummary::from_record) {
                tracing::info!(
                    id = %loan.id,
                    equipment = %loan.equipment_name,
                    return_date = %loan.return_date,
                    status = %loan.status,
                    "Loan request"
                );
            }
        }
        ListState::Error(message) => tracing::error!(%message, "Loan list failed"),
    }
}

/// Initialize structured JSON logging.
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("loan_desk=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .try_init()?;
    Ok(())
}
