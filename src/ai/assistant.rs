use async_trait::async_trait;
use rand::Rng;
use std::ops::RangeInclusive;
use std::time::Duration;

/// Learning-path suggestions returned by [`CareerAdvisor`].
pub const CANNED_RESPONSES: &[&str] = &[
    "Start with \"Compliance & Taxation Management (CTM)\" to build a solid base in cross-border tax, then move on to \"Corporate Finance\" for valuation and capital budgeting.",
    "For a move into advisory work, pair \"Accounting\" with \"Auditing\": Dutch GAAP and VAT first, then internal controls and audit reporting.",
    "If you want to lead client growth, take \"Business Development\" followed by \"Marketing\". Focus on pipeline management and digital marketing fundamentals.",
    "Aiming for a people-focused role? \"Human Resources (HR)\" covers talent acquisition through strategic HR planning. Add \"What Valuecent does\" to understand our service lines.",
    "To work with data and tooling, begin with \"Information Technology (IT)\" and the \"AI course\". Cloud computing and AI in professional work are the chapters to prioritise.",
    "Planning an international assignment? \"Worldwide presence of Valuecent\" gives the regional picture; follow it with the transfer pricing chapters of CTM.",
    "For a finance leadership track, complete \"Corporate Finance\" end to end, then study mergers and acquisitions in the CTM course.",
    "New to the firm? Watch \"What Valuecent does\" first, then pick one specialist course and finish it before starting another.",
];

/// Turns a free-text career goal into a learning suggestion.
#[async_trait]
pub trait SuggestionService: Send + Sync {
    async fn suggest(&self, goal: &str) -> String;
}

/// Offline advisor: waits a short, random time and returns one of
/// [`CANNED_RESPONSES`]. The goal text is not interpreted.
pub struct CareerAdvisor {
    delay_ms: RangeInclusive<u64>,
}

impl CareerAdvisor {
    pub fn new() -> Self {
        Self::with_delay(500, 1000)
    }

    /// Advisor whose simulated latency lies in `min_ms..=max_ms` (bounds may be given in any order).
    pub fn with_delay(min_ms: u64, max_ms: u64) -> Self {
        let (lo, hi) = if min_ms <= max_ms {
            (min_ms, max_ms)
        } else {
            (max_ms, min_ms)
        };
        Self { delay_ms: lo..=hi }
    }
}

impl Default for CareerAdvisor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SuggestionService for CareerAdvisor {
    async fn suggest(&self, goal: &str) -> String {
        let (delay, index) = {
            let mut rng = rand::rng();
            (
                rng.random_range(self.delay_ms.clone()),
                rng.random_range(0..CANNED_RESPONSES.len()),
            )
        };
        log::debug!("suggesting for goal of {} chars after {}ms", goal.len(), delay);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        CANNED_RESPONSES[index].to_string()
    }
}
