use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// 呼叫端給的時間預算：截止時間加上可由外部觸發的取消。
///
/// 截止時間會原封不動傳給 fetch collaborator，不會在下游重新推算。
#[derive(Debug, Clone)]
pub struct Deadline {
    at: Instant,
    token: CancellationToken,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self::at(Instant::now() + budget)
    }

    pub fn at(at: Instant) -> Self {
        Self {
            at,
            token: CancellationToken::new(),
        }
    }

    pub fn with_token(at: Instant, token: CancellationToken) -> Self {
        Self { at, token }
    }

    pub fn instant(&self) -> Instant {
        self.at
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        self.token.is_cancelled() || Instant::now() >= self.at
    }

    /// 取較早的截止時間；取消會從父 deadline 傳遞下來
    pub fn narrowed(&self, budget: Duration) -> Self {
        let candidate = Instant::now() + budget;
        Self {
            at: self.at.min(candidate),
            token: self.token.child_token(),
        }
    }

    /// 截止或取消時完成
    pub async fn expired(&self) {
        tokio::select! {
            _ = tokio::time::sleep_until(self.at) => {}
            _ = self.token.cancelled() => {}
        }
    }

    /// 在 deadline 內執行 future，逾時或取消回傳 None
    pub async fn run<F: std::future::Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            result = tokio::time::timeout_at(self.at, fut) => result.ok(),
        }
    }
}
