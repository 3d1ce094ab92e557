//! ReconciliationHandler - audits the ledger against provider-reported
//! totals.

use std::sync::Arc;

use serde_json::json;

use crate::config::ReconciliationConfig;
use crate::domain::foundation::{DomainError, Money, Provider, Timestamp};
use crate::domain::ledger::{LedgerEntry, LedgerEntryType, TimeRange};
use crate::ports::{LedgerStore, ProviderTotals};

/// Audit result for one provider.
#[derive(Debug, Clone)]
pub struct ReconciliationRow {
    pub provider: Provider,
    /// Net of internal payment and refund facts in the window.
    pub ledger_total: Money,
    /// What the provider says it settled in the window.
    pub external_total: Money,
    /// `ledger_total - external_total`.
    pub delta: Money,
    /// True if `|delta|` exceeded the tolerance and an alert was appended.
    pub alerted: bool,
}

/// One reconciliation run across all providers.
#[derive(Debug, Clone)]
pub struct ReconciliationReport {
    pub window: TimeRange,
    pub rows: Vec<ReconciliationRow>,
}

impl ReconciliationReport {
    pub fn has_alerts(&self) -> bool {
        self.rows.iter().any(|r| r.alerted)
    }
}

/// Handler for the reconciliation audit, typically run daily.
///
/// Non-destructive: a discrepancy never corrects or removes prior ledger
/// entries. The alert is itself a new appended entry, so the audit trail
/// records that the mismatch was observed.
pub struct ReconciliationHandler {
    ledger: Arc<dyn LedgerStore>,
    totals: Arc<dyn ProviderTotals>,
    config: ReconciliationConfig,
}

impl ReconciliationHandler {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        totals: Arc<dyn ProviderTotals>,
        config: ReconciliationConfig,
    ) -> Self {
        Self {
            ledger,
            totals,
            config,
        }
    }

    /// Audits the configured window ending at `now`, one row per
    /// provider. A failure for one provider is logged and skipped so the
    /// others are still audited.
    pub async fn run(&self, now: Timestamp) -> Result<ReconciliationReport, DomainError> {
        let window = TimeRange::days_ending_at(now, self.config.window_days);
        let mut rows = Vec::with_capacity(Provider::ALL.len());

        for provider in Provider::ALL {
            match self.audit_provider(provider, &window, now).await {
                Ok(row) => rows.push(row),
                Err(e) => {
                    tracing::warn!(
                        provider = provider.as_str(),
                        error = %e,
                        "provider audit failed, continuing"
                    );
                }
            }
        }

        let report = ReconciliationReport { window, rows };
        tracing::info!(
            providers = report.rows.len(),
            alerts = report.rows.iter().filter(|r| r.alerted).count(),
            "reconciliation complete"
        );
        Ok(report)
    }

    async fn audit_provider(
        &self,
        provider: Provider,
        window: &TimeRange,
        now: Timestamp,
    ) -> Result<ReconciliationRow, DomainError> {
        let payments = self
            .ledger
            .sum(provider, &[LedgerEntryType::PaymentSucceeded], window)
            .await?;
        let refunds = self
            .ledger
            .sum(provider, &[LedgerEntryType::RefundSucceeded], window)
            .await?;
        let ledger_total = payments - refunds;

        let external_total = self.totals.provider_total(provider, window).await?;
        let delta = ledger_total - external_total;

        let alerted = delta.abs().cents() > self.config.tolerance_cents;
        if alerted {
            self.append_alert(provider, ledger_total, external_total, delta, now)
                .await?;
            tracing::warn!(
                provider = provider.as_str(),
                ledger_total = %ledger_total,
                external_total = %external_total,
                delta = %delta,
                "reconciliation discrepancy"
            );
        }

        Ok(ReconciliationRow {
            provider,
            ledger_total,
            external_total,
            delta,
            alerted,
        })
    }

    async fn append_alert(
        &self,
        provider: Provider,
        ledger_total: Money,
        external_total: Money,
        delta: Money,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        let entry = LedgerEntry::new(
            now,
            LedgerEntryType::PaymentFailed,
            format!("reconciliation:{}", provider.as_str()),
            provider,
            delta,
            "usd",
            None,
            json!({
                "reconciliation": true,
                "ledger_total": ledger_total.cents(),
                "external_total": external_total.cents(),
                "delta": delta.cents(),
            }),
        );
        self.ledger.append(entry).await
    }
}
