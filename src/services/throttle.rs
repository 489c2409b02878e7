//! 数据源调用节流与重试
//!
//! 连续调用数据源之间插入间隔，降低被限流或封禁的概率。
//! 支持固定间隔、随机间隔和令牌桶三种策略。

use std::future::Future;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::Rng;

use crate::config::{SourceConfig, ThrottleConfig, ThrottleStrategy};
use crate::error::Result;

/// 令牌桶状态
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// 调用间隔控制器
pub struct Throttle {
    strategy: ThrottleStrategy,
    min: Duration,
    max: Duration,
    rate_per_sec: f64,
    burst: f64,
    bucket: Mutex<Bucket>,
}

impl Throttle {
    pub fn new(config: &ThrottleConfig) -> Self {
        let burst = config.burst.max(1) as f64;
        Self {
            strategy: config.strategy,
            min: Duration::from_millis(config.min_ms),
            max: Duration::from_millis(config.max_ms.max(config.min_ms)),
            rate_per_sec: config.rate_per_sec,
            burst,
            bucket: Mutex::new(Bucket {
                tokens: burst,
                last_refill: Instant::now(),
            }),
        }
    }

    /// 不等待的节流器
    pub fn disabled() -> Self {
        Self::new(&ThrottleConfig {
            strategy: ThrottleStrategy::None,
            ..ThrottleConfig::default()
        })
    }

    /// 下一次调用前应等待的时长
    pub fn next_delay(&self) -> Duration {
        match self.strategy {
            ThrottleStrategy::None => Duration::ZERO,
            ThrottleStrategy::Fixed => self.min,
            ThrottleStrategy::Jitter => {
                if self.max <= self.min {
                    return self.min;
                }
                let ms = rand::thread_rng()
                    .gen_range(self.min.as_millis() as u64..=self.max.as_millis() as u64);
                Duration::from_millis(ms)
            }
            ThrottleStrategy::TokenBucket => self.take_token(),
        }
    }

    fn take_token(&self) -> Duration {
        if self.rate_per_sec <= 0.0 {
            return Duration::ZERO;
        }
        let mut bucket = self.bucket.lock();
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.rate_per_sec).min(self.burst);
        bucket.last_refill = now;

        // 令牌可以透支，等待时长由欠下的令牌数决定
        bucket.tokens -= 1.0;
        if bucket.tokens >= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(-bucket.tokens / self.rate_per_sec)
        }
    }

    /// 在两次数据源调用之间等待
    pub async fn pause(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            log::debug!("[防封禁] 休眠 {:.2} 秒", delay.as_secs_f64());
            tokio::time::sleep(delay).await;
        }
    }
}

/// 重试策略
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// 首次失败后的最大重试次数
    pub max_retries: u32,
    /// 基础间隔，第 n 次重试等待 n * backoff
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &SourceConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    /// 执行 `op`，可重试的错误按策略重试
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let wait = self.backoff * attempt;
                    log::warn!(
                        "{} 失败（第 {} 次重试，{} ms 后）: {}",
                        label,
                        attempt,
                        wait.as_millis(),
                        e
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
