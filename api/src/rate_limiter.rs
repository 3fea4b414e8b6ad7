use std::{
    collections::HashMap,
    net::IpAddr,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::Mutex;

#[derive(Clone)]
enum AuthLimiterBackend {
    Memory {
        inner: Arc<Mutex<HashMap<IpAddr, Instant>>>,
        window: Duration,
    },
    Redis {
        client: redis::Client,
        window: Duration,
        key_prefix: String,
    },
}

/// One register/login attempt per source IP per window. Memory backend for a
/// single instance, Redis when the API runs replicated.
#[derive(Clone)]
pub struct AuthLimiter {
    backend: AuthLimiterBackend,
}

impl AuthLimiter {
    pub async fn new(window: Duration, redis_url: Option<String>) -> anyhow::Result<Self> {
        if let Some(url) = redis_url {
            let client = redis::Client::open(url)?;
            Ok(Self {
                backend: AuthLimiterBackend::Redis {
                    client,
                    window,
                    key_prefix: "auth:ip:".to_string(),
                },
            })
        } else {
            Ok(Self {
                backend: AuthLimiterBackend::Memory {
                    inner: Arc::new(Mutex::new(HashMap::new())),
                    window,
                },
            })
        }
    }

    pub async fn check(&self, ip: IpAddr) -> Result<(), AuthLimiterError> {
        match &self.backend {
            AuthLimiterBackend::Memory { inner, window } => {
                let mut guard = inner.lock().await;
                let now = Instant::now();
                if let Some(last) = guard.get(&ip) {
                    if now.duration_since(*last) < *window {
                        return Err(AuthLimiterError::RateLimited);
                    }
                }
                guard.insert(ip, now);
                Ok(())
            }
            AuthLimiterBackend::Redis {
                client,
                window,
                key_prefix,
            } => {
                let mut conn = client
                    .get_multiplexed_async_connection()
                    .await
                    .map_err(|err| AuthLimiterError::Backend {
                        _message: format!("redis conn: {err}"),
                    })?;
                let key = format!("{key_prefix}{ip}");
                let set_result: Option<String> = redis::cmd("SET")
                    .arg(&key)
                    .arg("1")
                    .arg("NX")
                    .arg("EX")
                    .arg(window.as_secs() as usize)
                    .query_async(&mut conn)
                    .await
                    .map_err(|err| AuthLimiterError::Backend {
                        _message: format!("redis set: {err}"),
                    })?;
                if set_result.is_some() {
                    Ok(())
                } else {
                    Err(AuthLimiterError::RateLimited)
                }
            }
        }
    }
}

#[derive(Debug)]
pub enum AuthLimiterError {
    RateLimited,
    Backend { _message: String },
}
