//! Thread-pool dispatch of bound calls.
//!
//! # Design
//! `AsyncClient::call` submits the whole synchronous pipeline to a rayon
//! pool and returns a `CallHandle` at once. Every failure, template errors
//! included, is delivered through the handle. Calls are independent: no
//! ordering between them and no cancellation once submitted.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, error};

use crate::args::Args;
use crate::client::{Client, ClientBuilder};
use crate::config::ClientConfig;
use crate::endpoint::EndpointSet;
use crate::error::{Error, Result};
use crate::types::Response;

/// Workers in a pool created by `AsyncClient::new`.
pub const DEFAULT_WORKERS: usize = 2;

type CallResult = Result<Option<Response>>;

#[derive(Debug, Clone)]
pub struct AsyncClient {
    client: Arc<Client>,
    pool: Arc<ThreadPool>,
}

impl AsyncClient {
    pub fn new(client: Client) -> Result<Self> {
        Self::with_workers(client, DEFAULT_WORKERS)
    }

    pub fn with_workers(client: Client, workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(Error::Config("worker pool needs at least one thread".to_string()));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("devourer-worker-{index}"))
            .build()?;
        Ok(Self::with_pool(client, Arc::new(pool)))
    }

    /// Run calls on an existing pool, which may be shared with other clients.
    ///
    /// Panics inside a call are caught before they reach the pool, so the
    /// pool needs no panic handler of its own.
    pub fn with_pool(client: Client, pool: Arc<ThreadPool>) -> Self {
        Self {
            client: Arc::new(client),
            pool,
        }
    }

    /// Build the client and its pool from configuration.
    pub fn from_config(config: &ClientConfig, endpoints: Arc<EndpointSet>) -> Result<Self> {
        let client = ClientBuilder::from_config(config).endpoints(endpoints).build()?;
        Self::with_workers(client, config.workers)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Submit a call to the endpoint declared as `name`.
    pub fn call(&self, name: &str, args: Args) -> CallHandle {
        let (sender, receiver) = mpsc::sync_channel(1);
        let client = Arc::clone(&self.client);
        let endpoint = name.to_string();

        debug!(endpoint = name, "submitting call");
        let task_endpoint = endpoint.clone();
        self.pool.spawn(move || {
            let call = AssertUnwindSafe(|| client.call(&task_endpoint, args));
            let outcome = panic::catch_unwind(call).unwrap_or_else(|_| {
                error!(endpoint = %task_endpoint, "bound call panicked on a worker thread");
                Err(Error::WorkerLost)
            });
            // The handle may already be gone; the result is then discarded.
            let _ = sender.send(outcome);
        });

        CallHandle {
            endpoint,
            receiver,
            ready: None,
        }
    }
}

/// Pending result of a submitted call.
#[derive(Debug)]
pub struct CallHandle {
    endpoint: String,
    receiver: Receiver<CallResult>,
    ready: Option<CallResult>,
}

impl CallHandle {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether the call has completed, without blocking.
    pub fn is_finished(&mut self) -> bool {
        if self.ready.is_none() {
            match self.receiver.try_recv() {
                Ok(result) => self.ready = Some(result),
                Err(TryRecvError::Disconnected) => self.ready = Some(Err(Error::WorkerLost)),
                Err(TryRecvError::Empty) => {}
            }
        }
        self.ready.is_some()
    }

    /// Block until the call completes and return what the synchronous call
    /// would have returned.
    pub fn result(self) -> Result<Option<Response>> {
        match self.ready {
            Some(result) => result,
            None => self.receiver.recv().unwrap_or(Err(Error::WorkerLost)),
        }
    }

    /// Like `result`, but give up after `timeout`. The call itself keeps
    /// running; its result is discarded.
    pub fn result_timeout(self, timeout: Duration) -> Result<Option<Response>> {
        if let Some(result) = self.ready {
            return result;
        }
        match self.receiver.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(Error::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(Error::WorkerLost),
        }
    }
}
