//! Bulk dispatch sequencer
//!
//! Drives template rendering and dispatch per recipient in strict
//! sequential order with an induced inter-message delay, emitting progress
//! before each attempt and aggregating per-recipient outcomes into a run
//! summary. The only suspension points are the network call and the delay
//! timer, and they strictly alternate: no two sends are ever in flight at
//! once. This is a deliberate policy to respect the remote API's rate
//! limits and keep ordering and progress reporting deterministic.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::gateway::{DispatchOutcome, MessageGateway};
use crate::rows::RecipientRow;
use crate::template::Template;

/// Progress of a dispatch run
///
/// Emitted to the observer immediately before each send attempt, so an
/// observation means "attempt `current` of `total` is in flight", not
/// "`current` attempts completed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// 1-based index of the attempt currently in flight
    pub current: usize,
    /// Number of valid rows in this run
    pub total: usize,
}

/// Aggregate result of a dispatch run
///
/// Every valid row yields exactly one outcome, so
/// `success_count + failed_numbers.len()` equals the number of rows
/// attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Recipients the remote API accepted
    pub success_count: usize,
    /// Recipient numbers whose dispatch failed, in attempt order
    pub failed_numbers: Vec<String>,
}

impl RunSummary {
    /// Number of rows that received a dispatch attempt
    pub fn total(&self) -> usize {
        self.success_count + self.failed_numbers.len()
    }

    /// Whether no attempt failed (vacuously true for an empty run;
    /// callers distinguish that case via `total() == 0`)
    pub fn all_succeeded(&self) -> bool {
        self.failed_numbers.is_empty()
    }
}

/// Cooperative cancellation flag for a dispatch run
///
/// Checked before each send and before each delay suspension. Cancelling
/// finalizes the summary with the outcomes recorded so far; it never
/// discards them.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Sequences one paced dispatch per valid recipient row
pub struct BulkSender {
    gateway: Arc<dyn MessageGateway>,
    delay: Duration,
    cancel: Option<CancelFlag>,
}

impl BulkSender {
    /// Create a sender with the given gateway and inter-message delay
    ///
    /// The delay is used as given; callers are expected to have applied
    /// their clamping policy already.
    pub fn new(gateway: Arc<dyn MessageGateway>, delay: Duration) -> Self {
        Self {
            gateway,
            delay,
            cancel: None,
        }
    }

    /// Attach a cancellation flag checked at each suspension point
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }

    /// Dispatch one message per valid row, in row order
    ///
    /// Rows without a non-empty trimmed `number` are excluded up front and
    /// never dispatched or counted. The observer is invoked synchronously
    /// with `{i+1, total}` before row `i` is attempted; each outcome is
    /// awaited before the next row starts; the delay runs between
    /// consecutive rows only, never after the last. A single recipient's
    /// failure never aborts the run.
    pub async fn run<F>(&self, rows: &[RecipientRow], template: &Template, mut observe: F) -> RunSummary
    where
        F: FnMut(Progress),
    {
        let valid: Vec<&RecipientRow> = rows.iter().filter(|r| r.is_valid()).collect();
        let total = valid.len();
        info!(total, skipped = rows.len() - total, "run: starting dispatch");

        let mut summary = RunSummary::default();

        for (i, row) in valid.iter().enumerate() {
            if self.is_cancelled() {
                warn!(attempted = summary.total(), total, "run: cancelled before send");
                break;
            }

            // Rows were filtered on exactly this condition
            let Some(number) = row.number() else { continue };

            observe(Progress { current: i + 1, total });

            let body = template.render(row);
            match self.gateway.send(number, &body).await {
                DispatchOutcome::Success => {
                    debug!(number, "run: dispatch succeeded");
                    summary.success_count += 1;
                }
                DispatchOutcome::Failure { reason } => {
                    warn!(number, %reason, "run: dispatch failed");
                    summary.failed_numbers.push(number.to_string());
                }
            }

            if i + 1 < total {
                if self.is_cancelled() {
                    warn!(attempted = summary.total(), total, "run: cancelled before delay");
                    break;
                }
                tokio::time::sleep(self.delay).await;
            }
        }

        info!(
            success = summary.success_count,
            failed = summary.failed_numbers.len(),
            "run: dispatch finished"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::MockGateway;
    use std::cell::RefCell;

    fn row(fields: &[(&str, &str)]) -> RecipientRow {
        RecipientRow::from_fields(fields.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    fn sample_rows() -> Vec<RecipientRow> {
        vec![
            row(&[("number", "111"), ("name", "Ann")]),
            row(&[("number", ""), ("name", "Bob")]),
            row(&[("number", "222"), ("name", "Cid")]),
        ]
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_rows_are_skipped_entirely() {
        let gateway = Arc::new(MockGateway::always_ok());
        let sender = BulkSender::new(gateway.clone(), Duration::from_secs(2));
        let template = Template::new("Hi {name}");

        let summary = sender.run(&sample_rows(), &template, |_| {}).await;

        assert_eq!(summary.success_count, 2);
        assert!(summary.failed_numbers.is_empty());
        // Bob never reached the gateway
        assert_eq!(
            gateway.calls(),
            vec![
                ("111".to_string(), "Hi Ann".to_string()),
                ("222".to_string(), "Hi Cid".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_sequence_has_no_gaps_or_repeats() {
        let gateway = Arc::new(MockGateway::always_ok());
        let sender = BulkSender::new(gateway, Duration::from_secs(1));
        let template = Template::new("hello");

        let observed = RefCell::new(Vec::new());
        sender
            .run(&sample_rows(), &template, |p| observed.borrow_mut().push(p))
            .await;

        assert_eq!(
            observed.into_inner(),
            vec![
                Progress { current: 1, total: 2 },
                Progress { current: 2, total: 2 },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_recorded_and_run_continues() {
        let gateway = Arc::new(MockGateway::new(vec![
            DispatchOutcome::Success,
            DispatchOutcome::failure("timeout"),
            DispatchOutcome::Success,
        ]));
        let rows = vec![
            row(&[("number", "111")]),
            row(&[("number", "222")]),
            row(&[("number", "333")]),
        ];
        let sender = BulkSender::new(gateway.clone(), Duration::from_secs(1));

        let summary = sender.run(&rows, &Template::new("x"), |_| {}).await;

        assert_eq!(summary.success_count, 2);
        assert_eq!(summary.failed_numbers, vec!["222"]);
        assert_eq!(summary.total(), 3);
        // All three were still attempted
        assert_eq!(gateway.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_runs_between_rows_but_not_after_last() {
        let gateway = Arc::new(MockGateway::always_ok());
        let rows = vec![
            row(&[("number", "111")]),
            row(&[("number", "222")]),
            row(&[("number", "333")]),
        ];
        let sender = BulkSender::new(gateway, Duration::from_secs(2));

        let start = tokio::time::Instant::now();
        sender.run(&rows, &Template::new("x"), |_| {}).await;

        // Two suspensions of 2s (1→2, 2→3), none after row 3
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_row_incurs_no_delay() {
        let gateway = Arc::new(MockGateway::always_ok());
        let rows = vec![row(&[("number", "111")])];
        let sender = BulkSender::new(gateway, Duration::from_secs(30));

        let start = tokio::time::Instant::now();
        let summary = sender.run(&rows, &Template::new("x"), |_| {}).await;

        assert_eq!(summary.success_count, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_filtered_sequence_returns_immediately() {
        let gateway = Arc::new(MockGateway::always_ok());
        let rows = vec![row(&[("name", "Bob")]), row(&[("number", "  ")])];
        let sender = BulkSender::new(gateway.clone(), Duration::from_secs(2));

        let observed = RefCell::new(Vec::new());
        let start = tokio::time::Instant::now();
        let summary = sender
            .run(&rows, &Template::new("x"), |p| observed.borrow_mut().push(p))
            .await;

        assert_eq!(summary, RunSummary::default());
        assert_eq!(summary.total(), 0);
        assert_eq!(gateway.call_count(), 0);
        assert!(observed.into_inner().is_empty());
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_rendered_body_is_still_sent() {
        let gateway = Arc::new(MockGateway::always_ok());
        let rows = vec![row(&[("number", "111")])];
        let sender = BulkSender::new(gateway.clone(), Duration::from_secs(1));

        // `{name}` is absent, so the body renders empty
        sender.run(&rows, &Template::new("{name}"), |_| {}).await;

        assert_eq!(gateway.calls(), vec![("111".to_string(), String::new())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_number_is_trimmed_before_dispatch() {
        let gateway = Arc::new(MockGateway::new(vec![DispatchOutcome::failure("nope")]));
        let rows = vec![row(&[("number", " 111 ")])];
        let sender = BulkSender::new(gateway.clone(), Duration::from_secs(1));

        let summary = sender.run(&rows, &Template::new("x"), |_| {}).await;

        assert_eq!(gateway.calls()[0].0, "111");
        assert_eq!(summary.failed_numbers, vec!["111"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_finalizes_partial_summary() {
        let gateway = Arc::new(MockGateway::always_ok());
        let rows = vec![
            row(&[("number", "111")]),
            row(&[("number", "222")]),
            row(&[("number", "333")]),
        ];
        let cancel = CancelFlag::new();
        let sender = BulkSender::new(gateway.clone(), Duration::from_secs(2)).with_cancel_flag(cancel.clone());

        // Cancel while the second attempt is being announced: that send
        // still completes, then the run stops before the next delay.
        let summary = sender
            .run(&rows, &Template::new("x"), |p| {
                if p.current == 2 {
                    cancel.cancel();
                }
            })
            .await;

        assert_eq!(gateway.call_count(), 2);
        assert_eq!(summary.total(), 2);
        assert_eq!(summary.success_count, 2);
    }

    #[test]
    fn test_summary_accessors() {
        let summary = RunSummary {
            success_count: 2,
            failed_numbers: vec!["222".to_string()],
        };

        assert_eq!(summary.total(), 3);
        assert!(!summary.all_succeeded());
        assert!(RunSummary::default().all_succeeded());
    }
}
