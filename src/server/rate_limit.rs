use chrono::Utc;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Fixed one-minute window per client IP.
#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<Mutex<HashMap<IpAddr, Window>>>,
    max_per_minute: u32,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    minute: i64,
    count: u32,
}

impl RateLimiter {
    /// `None` when limiting is disabled.
    pub fn new(max_per_minute: u32) -> Option<Self> {
        if max_per_minute == 0 {
            return None;
        }
        Some(Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            max_per_minute,
        })
    }

    pub async fn acquire(&self, ip: IpAddr) -> bool {
        self.acquire_at(ip, Utc::now().timestamp().div_euclid(60)).await
    }

    async fn acquire_at(&self, ip: IpAddr, minute: i64) -> bool {
        let mut windows = self.windows.lock().await;
        windows.retain(|_, window| window.minute == minute);

        let window = windows.entry(ip).or_insert(Window { minute, count: 0 });
        if window.count >= self.max_per_minute {
            return false;
        }
        window.count += 1;
        true
    }

    #[cfg(test)]
    async fn tracked_clients(&self) -> usize {
        self.windows.lock().await.len()
    }
}
