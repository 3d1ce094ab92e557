//! Subledger demo binary.
//!
//! Wires the handlers against the in-memory adapters and walks one
//! subscription through its lifecycle: first payment, failed renewal,
//! dunning, grace-expiry cancellation, then a reconciliation pass.

use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use subledger::adapters::memory::{
    FixedProviderTotals, InMemoryDedupStore, InMemoryEntitlementRepository, InMemoryLedgerStore,
    InMemorySubscriptionRepository, RecordingDunningNotifier, StaticFeatureCatalog,
};
use subledger::application::{
    DunningSweepHandler, IngestEventCommand, IngestEventHandler, ProjectEntitlementsHandler,
    ReconciliationHandler,
};
use subledger::config::AppConfig;
use subledger::domain::foundation::{Money, Provider, Timestamp, UserId};
use subledger::domain::subscription::{EventKind, NormalizedEvent};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "subledger=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    config.validate()?;
    tracing::info!(
        cycle_days = config.billing.cycle_days,
        grace_days = config.billing.grace_days,
        "configuration loaded"
    );

    let subscriptions = Arc::new(InMemorySubscriptionRepository::new());
    let entitlements = Arc::new(InMemoryEntitlementRepository::new());
    let ledger = Arc::new(InMemoryLedgerStore::new());
    let dedup = Arc::new(InMemoryDedupStore::new());
    let notifier = Arc::new(RecordingDunningNotifier::new());
    let totals = Arc::new(FixedProviderTotals::new());

    let projector = Arc::new(ProjectEntitlementsHandler::new(
        subscriptions.clone(),
        entitlements.clone(),
        Arc::new(StaticFeatureCatalog::new()),
    ));
    let ingest = IngestEventHandler::new(
        dedup.clone(),
        subscriptions.clone(),
        ledger.clone(),
        projector.clone(),
        config.billing.policy(),
    );
    let dunning = DunningSweepHandler::new(
        subscriptions.clone(),
        ledger.clone(),
        notifier,
        projector,
        config.dunning.clone(),
        config.billing.policy(),
    );
    let reconciliation = ReconciliationHandler::new(
        ledger.clone(),
        totals.clone(),
        config.reconciliation.clone(),
    );

    let start = Timestamp::now();
    let user = UserId::new("demo-user")?;

    // First payment materializes and activates the subscription
    let outcome = ingest
        .handle(IngestEventCommand {
            event: event(EventKind::PaymentSucceeded, "evt_1", &user, Some(1999)),
            now: start,
        })
        .await?;
    tracing::info!(?outcome, "payment ingested");

    // The same delivery again is a no-op
    let outcome = ingest
        .handle(IngestEventCommand {
            event: event(EventKind::PaymentSucceeded, "evt_1", &user, Some(1999)),
            now: start,
        })
        .await?;
    tracing::info!(?outcome, "duplicate delivery");

    // A month later the renewal fails and the grace clock starts
    let failed_at = start.add_days(30);
    let outcome = ingest
        .handle(IngestEventCommand {
            event: event(EventKind::RenewalFailed, "evt_2", &user, None),
            now: failed_at,
        })
        .await?;
    tracing::info!(?outcome, "renewal failure ingested");

    // Daily dunning sweeps across the grace window
    for day in 0..=config.billing.grace_days {
        let summary = dunning.run(failed_at.add_days(day)).await?;
        tracing::info!(day, ?summary, "dunning sweep");
    }

    // Reconcile the day of the payment against what the provider reports
    totals.set(Provider::Stripe, Money::from_cents(1999));
    let report = reconciliation.run(start.add_hours(1)).await?;
    tracing::info!(alerts = report.has_alerts(), "reconciliation report");

    for entry in ledger.entries() {
        tracing::info!(
            entry_type = %entry.entry_type,
            reference = %entry.reference_id,
            amount = %entry.amount,
            "ledger entry"
        );
    }

    Ok(())
}

fn event(kind: EventKind, event_id: &str, user: &UserId, cents: Option<i64>) -> NormalizedEvent {
    NormalizedEvent {
        provider: Provider::Stripe,
        external_event_id: event_id.to_string(),
        kind,
        subscription_ref: "sub_demo".to_string(),
        user_id: Some(user.clone()),
        plan_id: Some("plan_premium".to_string()),
        amount: cents.map(Money::from_cents),
        currency: Some("usd".to_string()),
        payload: serde_json::json!({}),
    }
}
