//! A small connection pool over [`tokio_rusqlite::Connection`].
//!
//! Each `tokio_rusqlite` connection owns a worker thread, so the pool bounds
//! how many of those exist and how many statements run at once. Checkout is
//! gated by a semaphore with `max_connections` permits; idle connections are
//! reused most-recent-first, grown `increment` at a time, and pruned back
//! toward `min_connections` once they sit unused past `idle_timeout`.

use std::{
  collections::VecDeque,
  ops::Deref,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
  time::{Duration, Instant},
};

use rusqlite::{OpenFlags, types::Value};
use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore};
use tokio_rusqlite::Connection;

use crate::{
  Error, Result,
  config::{PoolOptions, Target},
  schema::SCHEMA,
};

/// How long a statement waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Pool ────────────────────────────────────────────────────────────────────

/// Cloning is cheap; all clones share the same connections.
#[derive(Clone)]
pub struct Pool {
  inner: Arc<Inner>,
}

struct Inner {
  target:  Target,
  options: PoolOptions,
  permits: Arc<Semaphore>,
  state:   Mutex<State>,
  /// Signalled whenever a connection is parked or a reservation is released.
  parked:  Notify,
}

#[derive(Default)]
struct State {
  /// Most recently returned at the back.
  idle:   VecDeque<Idle>,
  /// Idle plus checked out plus being opened.
  open:   usize,
  closed: bool,
}

struct Idle {
  conn:  Connection,
  since: Instant,
}

/// Connection counts at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
  pub open: usize,
  pub idle: usize,
}

impl Inner {
  fn lock(&self) -> MutexGuard<'_, State> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl Pool {
  /// Open `min_connections` connections (at least one) and apply the schema.
  pub async fn open(target: Target, options: PoolOptions) -> Result<Self> {
    options.check(&target)?;

    let pool = Self {
      inner: Arc::new(Inner {
        permits: Arc::new(Semaphore::new(options.max_connections)),
        state: Mutex::new(State::default()),
        parked: Notify::new(),
        target,
        options,
      }),
    };

    let first = pool.connect().await?;
    first
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;

    let mut conns = vec![first];
    while conns.len() < pool.inner.options.min_connections {
      conns.push(pool.connect().await?);
    }

    let opened = conns.len();
    {
      let now = Instant::now();
      let mut state = pool.inner.lock();
      state.open = opened;
      state.idle = conns.into_iter().map(|conn| Idle { conn, since: now }).collect();
    }

    tracing::info!(
      database = %pool.inner.target,
      connections = opened,
      max = pool.inner.options.max_connections,
      "database pool ready"
    );
    Ok(pool)
  }

  pub fn status(&self) -> PoolStatus {
    let state = self.inner.lock();
    PoolStatus { open: state.open, idle: state.idle.len() }
  }

  /// Check out a connection, waiting up to `acquire_timeout` for one to
  /// become free. The connection goes back to the pool when the guard drops.
  pub async fn get_connection(&self) -> Result<PooledConnection> {
    let wait = self.inner.options.acquire_timeout;
    let permit =
      match tokio::time::timeout(wait, self.inner.permits.clone().acquire_owned())
        .await
      {
        Ok(Ok(permit)) => permit,
        Ok(Err(_)) => return Err(Error::PoolClosed),
        Err(_) => {
          tracing::warn!(timeout = ?wait, "no database connection became free");
          return Err(Error::AcquireTimeout(wait));
        }
      };

    loop {
      let parked = self.inner.parked.notified();
      tokio::pin!(parked);
      parked.as_mut().enable();

      if let Some(conn) = self.take_idle()? {
        return Ok(PooledConnection::new(conn, self.inner.clone(), permit));
      }
      if let Some(conn) = self.grow().await? {
        return Ok(PooledConnection::new(conn, self.inner.clone(), permit));
      }
      // Every slot is reserved by another caller's growth; one of its
      // surplus connections will be parked for us.
      parked.await;
    }
  }

  /// Run a query and map every row. `params` bind to `?1`, `?2`, ... in order.
  pub async fn query<T, F>(
    &self,
    sql: impl Into<String>,
    params: Vec<Value>,
    map: F,
  ) -> Result<Vec<T>>
  where
    T: Send + 'static,
    F: FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T> + Send + 'static,
  {
    let sql = sql.into();
    let conn = self.get_connection().await?;
    conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), map)?
          .collect::<rusqlite::Result<Vec<T>>>()?;
        Ok(rows)
      })
      .await
      .map_err(|e| logged(Error::from(e)))
  }

  /// Run a statement and return the number of rows it changed.
  pub async fn execute(
    &self,
    sql: impl Into<String>,
    params: Vec<Value>,
  ) -> Result<usize> {
    let sql = sql.into();
    let conn = self.get_connection().await?;
    conn
      .call(move |conn| {
        let changed = conn
          .prepare_cached(&sql)?
          .execute(rusqlite::params_from_iter(params.iter()))?;
        Ok(changed)
      })
      .await
      .map_err(|e| logged(Error::from(e)))
  }

  /// Refuse new checkouts and close every idle connection. Connections still
  /// checked out are closed as they come back.
  pub async fn close(&self) {
    let idle = {
      let mut state = self.inner.lock();
      if state.closed {
        return;
      }
      state.closed = true;
      state.open -= state.idle.len();
      std::mem::take(&mut state.idle)
    };
    self.inner.permits.close();
    self.inner.parked.notify_waiters();

    for Idle { conn, .. } in idle {
      if let Err(e) = conn.close().await {
        tracing::warn!(error = %e, "failed to close database connection");
      }
    }
    tracing::info!(database = %self.inner.target, "database pool closed");
  }

  // ─── Internals ─────────────────────────────────────────────────────────────

  async fn connect(&self) -> Result<Connection> {
    let flags = OpenFlags::default() | OpenFlags::SQLITE_OPEN_URI;
    let conn =
      Connection::open_with_flags(self.inner.target.location(), flags).await?;
    conn
      .call(|conn| {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(())
      })
      .await?;
    Ok(conn)
  }

  /// Prune stale idle connections, then hand out the freshest remaining one.
  fn take_idle(&self) -> Result<Option<Connection>> {
    let mut state = self.inner.lock();
    if state.closed {
      return Err(Error::PoolClosed);
    }

    let min = self.inner.options.min_connections;
    let ttl = self.inner.options.idle_timeout;
    let mut pruned = 0;
    while state.open > min
      && state.idle.front().is_some_and(|idle| idle.since.elapsed() > ttl)
    {
      state.idle.pop_front();
      state.open -= 1;
      pruned += 1;
    }
    if pruned > 0 {
      tracing::debug!(pruned, open = state.open, "dropped idle connections");
    }

    Ok(state.idle.pop_back().map(|idle| idle.conn))
  }

  /// Open up to `increment` new connections, keep one and park the rest.
  /// `None` when the pool is already at `max_connections`.
  async fn grow(&self) -> Result<Option<Connection>> {
    let reserved = {
      let mut state = self.inner.lock();
      let room = self.inner.options.max_connections.saturating_sub(state.open);
      let n = self.inner.options.increment.min(room);
      if n == 0 {
        return Ok(None);
      }
      state.open += n;
      n
    };

    let mut fresh = Vec::with_capacity(reserved);
    let mut failure = None;
    for _ in 0..reserved {
      match self.connect().await {
        Ok(conn) => fresh.push(conn),
        Err(e) => {
          failure = Some(e);
          break;
        }
      }
    }

    let now = Instant::now();
    let grown = {
      let mut state = self.inner.lock();
      state.open -= reserved - fresh.len();
      let conn = fresh.pop();
      state.idle.extend(fresh.into_iter().map(|conn| Idle { conn, since: now }));
      tracing::debug!(open = state.open, "database pool grew");
      conn
    };
    self.inner.parked.notify_waiters();

    match grown {
      Some(conn) => Ok(Some(conn)),
      None => Err(logged(failure.unwrap_or(Error::PoolClosed))),
    }
  }
}

/// Constraint violations are expected rejections; everything else is a fault.
fn logged(e: Error) -> Error {
  if e.violation().is_some() {
    tracing::debug!(error = %e, "statement rejected by a constraint");
  } else {
    tracing::warn!(error = %e, "database operation failed");
  }
  e
}

// ─── Checked-out connection ──────────────────────────────────────────────────

/// A connection on loan from a [`Pool`].
pub struct PooledConnection {
  conn:    Option<Connection>,
  inner:   Arc<Inner>,
  _permit: OwnedSemaphorePermit,
}

impl PooledConnection {
  fn new(conn: Connection, inner: Arc<Inner>, permit: OwnedSemaphorePermit) -> Self {
    Self { conn: Some(conn), inner, _permit: permit }
  }
}

impl Deref for PooledConnection {
  type Target = Connection;

  fn deref(&self) -> &Connection {
    // Only `Drop` takes the connection out.
    self.conn.as_ref().unwrap_or_else(|| unreachable!())
  }
}

impl Drop for PooledConnection {
  fn drop(&mut self) {
    let Some(conn) = self.conn.take() else { return };
    {
      let mut state = self.inner.lock();
      if state.closed {
        state.open -= 1;
        drop(conn);
      } else {
        state.idle.push_back(Idle { conn, since: Instant::now() });
      }
    }
    self.inner.parked.notify_waiters();
  }
}
