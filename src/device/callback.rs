// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

use crate::observability::messages::device::UpdateReceived;
use crate::observability::messages::StructuredLog;
use crate::record::Value;
use crate::traits::{SchedulerKind, UpdateHandler};

/// Validator consulted before an output record accepts a processed write.
/// Receives the record name and the coerced value; `false` rejects the write.
pub type Validator = Arc<dyn Fn(&str, &Value) -> bool + Send + Sync>;

/// An update handler together with the scheduler it runs on.
#[derive(Clone)]
pub struct BoundCallback {
    pub handler: Arc<dyn UpdateHandler>,
    pub scheduler: SchedulerKind,
}

struct AsyncFn<F>(F);

#[async_trait]
impl<F, Fut> UpdateHandler for AsyncFn<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn on_update(&self, _record: &str, value: Value) -> anyhow::Result<()> {
        (self.0)(value).await
    }
}

struct AsyncNamedFn<F>(F);

#[async_trait]
impl<F, Fut> UpdateHandler for AsyncNamedFn<F>
where
    F: Fn(Value, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn on_update(&self, record: &str, value: Value) -> anyhow::Result<()> {
        (self.0)(value, record.to_string()).await
    }
}

struct SyncFn<F>(F);

#[async_trait]
impl<F> UpdateHandler for SyncFn<F>
where
    F: Fn(&str, Value) -> anyhow::Result<()> + Send + Sync + 'static,
{
    async fn on_update(&self, record: &str, value: Value) -> anyhow::Result<()> {
        (self.0)(record, value)
    }
}

/// Logs every update at info level.
pub struct LogUpdates;

#[async_trait]
impl UpdateHandler for LogUpdates {
    async fn on_update(&self, record: &str, value: Value) -> anyhow::Result<()> {
        UpdateReceived {
            record,
            value: &value,
        }
        .log();
        Ok(())
    }
}

/// Wraps an async closure taking the new value.
pub fn on_update<F, Fut>(f: F) -> Arc<dyn UpdateHandler>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(AsyncFn(f))
}

/// Wraps an async closure taking the new value and the record name.
pub fn on_update_name<F, Fut>(f: F) -> Arc<dyn UpdateHandler>
where
    F: Fn(Value, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(AsyncNamedFn(f))
}

/// Wraps a plain closure; it runs to completion on the target scheduler.
pub fn on_update_sync<F>(f: F) -> Arc<dyn UpdateHandler>
where
    F: Fn(&str, Value) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(SyncFn(f))
}
