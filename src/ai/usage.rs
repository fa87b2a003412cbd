//! Usage and Cost Tracking
//!
//! Per-execution (batch) or per-session (chat) counters for external calls,
//! with an approximate cost estimate and two voluntary gates:
//! `check_limits` (token budget) and `check_rate_limit` (requests per hour).
//!
//! Cost figures are estimates derived from fixed list prices in
//! [`crate::constants::pricing`]; they are not billing-accurate.
//!
//! ## Usage
//!
//! ```ignore
//! let mut tracker = UsageTracker::new(config.usage_limits());
//! if tracker.check_limits() {
//!     tracker.track_embedding(text.len(), true);
//! }
//! let summary = tracker.finalize();
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};

use crate::config::UsageLimits;
use crate::constants::{pricing, usage as usage_constants};

// =============================================================================
// Metrics
// =============================================================================

/// Raw counters owned by one tracker
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UsageMetrics {
    pub total_tokens_processed: u64,
    pub total_embeddings_generated: u64,
    pub total_api_calls: u64,
    pub failed_requests: u64,
    pub total_queries: u64,
    pub total_llm_requests: u64,
    pub llm_input_tokens: u64,
    pub llm_output_tokens: u64,
}

impl UsageMetrics {
    /// Estimated cost in USD, rounded to 6 decimals
    pub fn estimated_cost_usd(&self) -> f64 {
        let embedding = self.total_tokens_processed as f64 / 1_000.0
            * pricing::EMBEDDING_USD_PER_1K_TOKENS;
        let llm = llm_cost_usd(self.llm_input_tokens, self.llm_output_tokens);
        round_to(embedding + llm, 6)
    }
}

/// Estimated cost of one LLM exchange in USD
pub fn llm_cost_usd(input_tokens: u64, output_tokens: u64) -> f64 {
    input_tokens as f64 / 1_000_000.0 * pricing::LLM_INPUT_USD_PER_1M_TOKENS
        + output_tokens as f64 / 1_000_000.0 * pricing::LLM_OUTPUT_USD_PER_1M_TOKENS
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Summary statistics for one execution or session
#[derive(Debug, Clone, Serialize)]
pub struct UsageSummary {
    pub elapsed_seconds: f64,
    pub metrics: UsageMetrics,
    pub estimated_cost_usd: f64,
    pub token_budget: u64,
    pub requests_last_hour: usize,
    pub max_requests_per_hour: Option<u32>,
}

impl UsageSummary {
    /// Share of the token budget consumed (0.0 - 1.0+)
    pub fn token_utilization(&self) -> f64 {
        if self.token_budget == 0 {
            0.0
        } else {
            self.metrics.total_tokens_processed as f64 / self.token_budget as f64
        }
    }

    /// Format summary for display
    pub fn display(&self) -> String {
        let mut out = format!(
            "Duration: {:.1}s\n\
             Queries: {}\n\
             Embeddings: {} ({} failed)\n\
             LLM Calls: {}\n\
             Tokens: {}/{} ({:.1}%)\n\
             Est. Cost: ${:.4}",
            self.elapsed_seconds,
            self.metrics.total_queries,
            self.metrics.total_embeddings_generated,
            self.metrics.failed_requests,
            self.metrics.total_llm_requests,
            self.metrics.total_tokens_processed,
            self.token_budget,
            self.token_utilization() * 100.0,
            self.estimated_cost_usd,
        );
        if let Some(limit) = self.max_requests_per_hour {
            out.push_str(&format!(
                "\nRate Limit: {}/{} requests/hour",
                self.requests_last_hour, limit
            ));
        }
        out
    }
}

// =============================================================================
// Tracker
// =============================================================================

/// Usage tracker for one execution (batch) or one session (chat)
#[derive(Debug)]
pub struct UsageTracker {
    limits: UsageLimits,
    start_time: Instant,
    metrics: UsageMetrics,
    /// Timestamps of tracked queries, newest last
    request_times: Vec<DateTime<Utc>>,
}

impl UsageTracker {
    pub fn new(limits: UsageLimits) -> Self {
        Self {
            limits,
            start_time: Instant::now(),
            metrics: UsageMetrics::default(),
            request_times: Vec::new(),
        }
    }

    pub fn limits(&self) -> &UsageLimits {
        &self.limits
    }

    pub fn metrics(&self) -> &UsageMetrics {
        &self.metrics
    }

    /// Start a fresh window: counters, timestamps and the clock
    pub fn reset(&mut self) {
        self.start_time = Instant::now();
        self.metrics = UsageMetrics::default();
        self.request_times.clear();
    }

    /// Record one embedding request of `text_length` characters
    pub fn track_embedding(&mut self, text_length: usize, success: bool) {
        if !self.limits.tracking_enabled {
            return;
        }

        self.metrics.total_tokens_processed += text_length as u64;
        self.metrics.total_api_calls += 1;

        if success {
            self.metrics.total_embeddings_generated += 1;
        } else {
            self.metrics.failed_requests += 1;
        }
    }

    /// Record one LLM exchange
    pub fn track_llm(&mut self, input_tokens: u64, output_tokens: u64) {
        if !self.limits.tracking_enabled {
            return;
        }

        self.metrics.total_llm_requests += 1;
        self.metrics.llm_input_tokens += input_tokens;
        self.metrics.llm_output_tokens += output_tokens;

        info!(
            input_tokens,
            output_tokens,
            estimated_cost = round_to(llm_cost_usd(input_tokens, output_tokens), 6),
            "LLM request tracked"
        );
    }

    /// Record one user query in the rate window
    pub fn track_query(&mut self, query_length: usize) {
        self.track_query_at(query_length, Utc::now());
    }

    pub fn track_query_at(&mut self, query_length: usize, now: DateTime<Utc>) {
        if !self.limits.tracking_enabled {
            return;
        }

        self.metrics.total_queries += 1;
        self.request_times.push(now);
        self.prune(now);

        info!(
            query_length,
            total_queries = self.metrics.total_queries,
            "Query tracked"
        );
    }

    /// Token budget gate. Once exceeded, stays false until `reset()`.
    pub fn check_limits(&self) -> bool {
        if !self.limits.tracking_enabled {
            return true;
        }

        if self.metrics.total_tokens_processed > self.limits.token_budget {
            warn!(
                tokens_processed = self.metrics.total_tokens_processed,
                limit = self.limits.token_budget,
                "Token limit exceeded"
            );
            return false;
        }
        true
    }

    /// Per-hour request gate over a sliding window
    pub fn check_rate_limit(&mut self) -> bool {
        self.check_rate_limit_at(Utc::now())
    }

    pub fn check_rate_limit_at(&mut self, now: DateTime<Utc>) -> bool {
        if !self.limits.tracking_enabled {
            return true;
        }
        let Some(limit) = self.limits.max_requests_per_hour else {
            return true;
        };

        self.prune(now);
        let recent = self.requests_in_window(now);

        if recent >= limit as usize {
            warn!(
                requests_last_hour = recent,
                limit, "Hourly rate limit exceeded"
            );
            return false;
        }
        true
    }

    /// Number of tracked queries within the trailing hour
    pub fn requests_in_window(&self, now: DateTime<Utc>) -> usize {
        let window = Duration::seconds(usage_constants::RATE_WINDOW_SECS);
        self.request_times
            .iter()
            .filter(|&&t| t <= now && now - t < window)
            .count()
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let retention = Duration::seconds(usage_constants::RATE_RETENTION_SECS);
        self.request_times.retain(|&t| now - t <= retention);
    }

    /// Current metrics snapshot
    pub fn snapshot(&self) -> UsageSummary {
        self.snapshot_at(Utc::now())
    }

    pub fn snapshot_at(&self, now: DateTime<Utc>) -> UsageSummary {
        UsageSummary {
            elapsed_seconds: round_to(self.start_time.elapsed().as_secs_f64(), 3),
            metrics: self.metrics.clone(),
            estimated_cost_usd: self.metrics.estimated_cost_usd(),
            token_budget: self.limits.token_budget,
            requests_last_hour: self.requests_in_window(now),
            max_requests_per_hour: self.limits.max_requests_per_hour,
        }
    }

    /// Emit the final summary log line and return the summary.
    ///
    /// Nothing is logged when tracking is disabled.
    pub fn finalize(&self) -> UsageSummary {
        let summary = self.snapshot();

        if self.limits.tracking_enabled {
            let m = &summary.metrics;
            info!(
                execution_time_seconds = summary.elapsed_seconds,
                total_tokens_processed = m.total_tokens_processed,
                total_embeddings_generated = m.total_embeddings_generated,
                total_api_calls = m.total_api_calls,
                failed_requests = m.failed_requests,
                total_llm_requests = m.total_llm_requests,
                estimated_cost_usd = summary.estimated_cost_usd,
                "Usage summary"
            );
        }

        summary
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn limits(budget: u64, per_hour: Option<u32>) -> UsageLimits {
        UsageLimits {
            tracking_enabled: true,
            token_budget: budget,
            max_requests_per_hour: per_hour,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_track_embedding_counts() {
        let mut tracker = UsageTracker::new(limits(1_000, None));
        tracker.track_embedding(100, true);
        tracker.track_embedding(50, false);

        let m = tracker.metrics();
        assert_eq!(m.total_tokens_processed, 150);
        assert_eq!(m.total_api_calls, 2);
        assert_eq!(m.total_embeddings_generated, 1);
        assert_eq!(m.failed_requests, 1);
    }

    #[test]
    fn test_tracking_disabled_is_noop() {
        let mut tracker = UsageTracker::new(UsageLimits {
            tracking_enabled: false,
            token_budget: 1,
            max_requests_per_hour: Some(1),
        });
        tracker.track_embedding(10_000, true);
        tracker.track_query_at(10, t0());
        tracker.track_query_at(10, t0());

        assert_eq!(tracker.metrics(), &UsageMetrics::default());
        assert!(tracker.check_limits());
        assert!(tracker.check_rate_limit_at(t0()));
    }

    #[test]
    fn test_token_budget_stays_exceeded_until_reset() {
        let mut tracker = UsageTracker::new(limits(100, None));
        tracker.track_embedding(100, true);
        assert!(tracker.check_limits(), "equal to budget is still allowed");

        tracker.track_embedding(1, true);
        assert!(!tracker.check_limits());
        assert!(!tracker.check_limits());

        tracker.reset();
        assert!(tracker.check_limits());
    }

    #[test]
    fn test_rate_limit_window_rolls_forward() {
        let mut tracker = UsageTracker::new(limits(1_000_000, Some(3)));
        let start = t0();

        for i in 0..3 {
            assert!(tracker.check_rate_limit_at(start));
            tracker.track_query_at(10, start + Duration::minutes(i));
        }
        assert!(!tracker.check_rate_limit_at(start + Duration::minutes(5)));

        // Oldest request falls out after a full hour
        assert!(tracker.check_rate_limit_at(start + Duration::minutes(60)));
        assert_eq!(
            tracker.requests_in_window(start + Duration::minutes(62)),
            0
        );
    }

    #[test]
    fn test_rate_limit_prunes_after_a_day() {
        let mut tracker = UsageTracker::new(limits(1_000_000, Some(100)));
        tracker.track_query_at(5, t0());
        tracker.track_query_at(5, t0() + Duration::hours(25));

        assert_eq!(tracker.request_times.len(), 1);
    }

    #[test]
    fn test_batch_variant_has_no_rate_limit() {
        let mut tracker = UsageTracker::new(limits(1_000, None));
        for _ in 0..500 {
            tracker.track_query_at(1, t0());
        }
        assert!(tracker.check_rate_limit_at(t0()));
    }

    #[test]
    fn test_cost_estimate() {
        let mut tracker = UsageTracker::new(limits(10_000_000, None));
        tracker.track_embedding(10_000, true);
        // 10k tokens * $0.0001/1k
        assert!((tracker.metrics().estimated_cost_usd() - 0.001).abs() < 1e-9);

        tracker.track_llm(1_000_000, 100_000);
        // + $3 input + $1.5 output
        assert!((tracker.metrics().estimated_cost_usd() - 4.501).abs() < 1e-9);
        assert_eq!(tracker.metrics().total_llm_requests, 1);
    }

    #[test]
    fn test_finalize_summary() {
        let mut tracker = UsageTracker::new(limits(1_000, Some(10)));
        tracker.track_embedding(250, true);
        tracker.track_query_at(12, Utc::now());

        let summary = tracker.finalize();
        assert_eq!(summary.metrics.total_tokens_processed, 250);
        assert!((summary.token_utilization() - 0.25).abs() < 1e-9);
        assert!(summary.elapsed_seconds >= 0.0);

        let display = summary.display();
        assert!(display.contains("250/1000"));
        assert!(display.contains("1/10 requests/hour"));
        assert!(display.contains("$"));
    }
}
