//! # Prometheus Metrics
//!
//! Withdrawal counters for a vault. There is no HTTP endpoint; callers
//! render the text exposition with [`VaultMetrics::encode`] and ship it
//! wherever they like.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] with
//! the `warden` namespace so they do not collide with the default registry.

use std::time::Duration;

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use warden_contracts::vault::{VaultError, WithdrawalReceipt};

/// Metric handles for one vault.
#[derive(Clone)]
pub struct VaultMetrics {
    registry: Registry,
    /// Withdrawals that moved funds.
    pub withdrawals_total: IntCounter,
    /// Rejected withdrawals, labelled by reason.
    pub withdrawals_rejected_total: IntCounterVec,
    /// Photons released across all successful withdrawals.
    pub withdrawn_photons_total: IntCounter,
    /// Vault balance after the last observed withdrawal.
    pub vault_balance_photons: IntGauge,
    /// Time spent in `withdraw`, success or failure.
    pub withdraw_latency_seconds: Histogram,
}

impl VaultMetrics {
    /// Creates and registers all metrics.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("warden".into()), None)
            .expect("failed to create prometheus registry");

        let withdrawals_total =
            IntCounter::new("withdrawals_total", "Total number of executed withdrawals")
                .expect("metric creation");
        registry
            .register(Box::new(withdrawals_total.clone()))
            .expect("metric registration");

        let withdrawals_rejected_total = IntCounterVec::new(
            Opts::new(
                "withdrawals_rejected_total",
                "Total number of rejected withdrawals by reason",
            ),
            &["reason"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(withdrawals_rejected_total.clone()))
            .expect("metric registration");

        let withdrawn_photons_total = IntCounter::new(
            "withdrawn_photons_total",
            "Total photons released by executed withdrawals",
        )
        .expect("metric creation");
        registry
            .register(Box::new(withdrawn_photons_total.clone()))
            .expect("metric registration");

        let vault_balance_photons =
            IntGauge::new("vault_balance_photons", "Current custodied balance in photons")
                .expect("metric creation");
        registry
            .register(Box::new(vault_balance_photons.clone()))
            .expect("metric registration");

        let withdraw_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "withdraw_latency_seconds",
                "Time spent processing a withdrawal request in seconds",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(withdraw_latency_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            withdrawals_total,
            withdrawals_rejected_total,
            withdrawn_photons_total,
            vault_balance_photons,
            withdraw_latency_seconds,
        }
    }

    /// Record the outcome of one `withdraw` call.
    pub fn observe(
        &self,
        outcome: &Result<WithdrawalReceipt, VaultError>,
        elapsed: Duration,
        balance: u64,
    ) {
        self.withdraw_latency_seconds
            .observe(elapsed.as_secs_f64());
        match outcome {
            Ok(receipt) => {
                self.withdrawals_total.inc();
                self.withdrawn_photons_total.inc_by(receipt.amount);
            }
            Err(e) => {
                self.withdrawals_rejected_total
                    .with_label_values(&[e.reason()])
                    .inc();
            }
        }
        self.vault_balance_photons
            .set(i64::try_from(balance).unwrap_or(i64::MAX));
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus output is valid utf-8"))
    }
}

impl Default for VaultMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_are_labelled() {
        let metrics = VaultMetrics::new();
        metrics.observe(
            &Err(VaultError::InvalidSignature),
            Duration::from_micros(50),
            100,
        );
        metrics.observe(
            &Err(VaultError::InsufficientBalance {
                available: 100,
                requested: 200,
            }),
            Duration::from_micros(50),
            100,
        );

        assert_eq!(metrics.withdrawals_total.get(), 0);
        assert_eq!(
            metrics
                .withdrawals_rejected_total
                .with_label_values(&["invalid_signature"])
                .get(),
            1
        );
        assert_eq!(metrics.vault_balance_photons.get(), 100);

        let text = metrics.encode().unwrap();
        assert!(text.contains("warden_withdrawals_rejected_total"));
        assert!(text.contains("reason=\"insufficient_balance\""));
        assert!(text.contains("warden_withdraw_latency_seconds"));
    }
}
