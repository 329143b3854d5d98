//! [`SqliteStore`]: the SQLite implementation of [`Directory`].

use roster_core::{
  Error as CoreError,
  entity::{Changes as _, Draft as _, Entity, KeyPattern, UniqueField},
  person::{Affiliation, Member, PERSON_KEY, Person},
  store::{Backend, Directory, Repository},
};
use rusqlite::types::Value;
use uuid::Uuid;

use crate::{
  DatabaseConfig, Error, Result,
  config::{PoolOptions, Target},
  encode::{MEMBER_SELECT, RawMember, Record, encode_value},
  error::Violation,
  pool::Pool,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// The personnel directory backed by a pool of SQLite connections.
///
/// Cloning is cheap; clones share the pool.
#[derive(Clone)]
pub struct SqliteStore {
  pool: Pool,
}

impl SqliteStore {
  /// Open the database named by `config` and apply the schema.
  pub async fn open(config: &DatabaseConfig) -> Result<Self> {
    let pool = Pool::open(config.target()?, config.pool_options()).await?;
    Ok(Self { pool })
  }

  /// Open a private in-memory store; useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let target = Target::Memory(format!("roster-{}", Uuid::new_v4()));
    let pool = Pool::open(target, PoolOptions::default()).await?;
    Ok(Self { pool })
  }

  pub fn pool(&self) -> &Pool { &self.pool }

  /// Close every pooled connection. Further calls fail with
  /// [`Error::PoolClosed`].
  pub async fn close(&self) { self.pool.close().await }

  async fn select<E: Record>(&self, sql: String, params: Vec<Value>) -> Result<Vec<E>> {
    let raw = self.pool.query(sql, params, E::read).await?;
    raw.into_iter().map(E::decode).collect()
  }

  async fn count(&self, sql: String, params: Vec<Value>) -> Result<i64> {
    let counts = self.pool.query(sql, params, |row| row.get::<_, i64>(0)).await?;
    Ok(counts.into_iter().next().unwrap_or(0))
  }

  async fn exists<E: Entity>(&self, id: &str) -> Result<bool> {
    let schema = E::SCHEMA;
    let sql = format!("SELECT COUNT(*) FROM {} WHERE {} = ?1", schema.table, schema.key);
    Ok(self.count(sql, vec![Value::Text(id.to_owned())]).await? > 0)
  }

  /// Fail with a duplicate-field conflict if another row already holds one
  /// of `fields`. `except` excludes the row being updated.
  async fn check_unique<E: Entity>(
    &self,
    fields: &[UniqueField],
    except: Option<&str>,
  ) -> Result<()> {
    let schema = E::SCHEMA;
    for field in fields {
      let mut sql = format!(
        "SELECT COUNT(*) FROM {} WHERE {} = ?1",
        schema.table, field.column
      );
      let mut params = vec![Value::Text(field.value.clone())];
      if let Some(id) = except {
        sql.push_str(&format!(" AND {} <> ?2", schema.key));
        params.push(Value::Text(id.to_owned()));
      }
      if self.count(sql, params).await? > 0 {
        return Err(CoreError::DuplicateField(field.label).into());
      }
    }
    Ok(())
  }

  /// One past the largest key matching `pattern`; keys of any other shape
  /// are ignored.
  async fn next_key<E: Entity>(&self, pattern: KeyPattern) -> Result<String> {
    let schema = E::SCHEMA;
    let glob = format!("{}{}", pattern.prefix, "[0-9]".repeat(pattern.digits as usize));
    let sql = format!(
      "SELECT MAX(CAST(SUBSTR({key}, {start}) AS INTEGER)) FROM {table} \
       WHERE {key} GLOB ?1",
      key = schema.key,
      table = schema.table,
      start = pattern.prefix.len() + 1,
    );
    let max = self
      .pool
      .query(sql, vec![Value::Text(glob)], |row| row.get::<_, Option<i64>>(0))
      .await?
      .into_iter()
      .flatten()
      .next();
    let max = max.map(|m| u64::try_from(m).unwrap_or(0));
    Ok(pattern.next_after(E::KIND, max)?)
  }
}

/// Translate a constraint violation raised by a write into the domain error
/// the pre-checks would have produced.
pub(crate) fn rejected<E: Entity>(
  err: Error,
  key: &str,
  unique: &[UniqueField],
) -> Error {
  let table = E::SCHEMA.table;
  match err.violation() {
    Some(Violation::PrimaryKey) => {
      CoreError::DuplicateKey(E::KIND, key.to_owned()).into()
    }
    Some(Violation::Unique(message)) => unique
      .iter()
      .find(|f| message.ends_with(&format!("{table}.{}", f.column)))
      .map_or(err, |f| CoreError::DuplicateField(f.label).into()),
    Some(Violation::ForeignKey) => CoreError::UnknownReference.into(),
    _ => err,
  }
}

// ─── Backend ─────────────────────────────────────────────────────────────────

impl Backend for SqliteStore {
  type Error = Error;

  async fn ping(&self) -> Result<String> {
    let now = self
      .pool
      .query(
        "SELECT strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
        Vec::new(),
        |row| row.get::<_, String>(0),
      )
      .await?;
    Ok(now.into_iter().next().unwrap_or_default())
  }
}

// ─── Repository ──────────────────────────────────────────────────────────────

impl<E: Record> Repository<E> for SqliteStore {
  async fn list(&self) -> Result<Vec<E>> {
    let sql = format!("{} ORDER BY t.{}", E::SELECT, E::SCHEMA.key);
    self.select(sql, Vec::new()).await
  }

  async fn list_active(&self) -> Result<Vec<E>> {
    let schema = E::SCHEMA;
    let sql = format!(
      "{} WHERE t.{} = 1 ORDER BY t.{}, t.{}",
      E::SELECT,
      schema.active,
      schema.name,
      schema.key
    );
    self.select(sql, Vec::new()).await
  }

  async fn get(&self, id: &str) -> Result<Option<E>> {
    let sql = format!("{} WHERE t.{} = ?1", E::SELECT, E::SCHEMA.key);
    let found = self.select(sql, vec![Value::Text(id.to_owned())]).await?;
    Ok(found.into_iter().next())
  }

  async fn create(&self, draft: E::Draft) -> Result<String> {
    draft.validate()?;

    let supplied = draft.key().map(str::to_owned);
    let key = match (supplied, E::SCHEMA.generated_key) {
      (Some(key), _) => key,
      (None, Some(pattern)) => self.next_key::<E>(pattern).await?,
      (None, None) => {
        return Err(
          CoreError::Validation(format!("{} is required", E::KIND.id_field()))
            .into(),
        );
      }
    };

    if self.exists::<E>(&key).await? {
      return Err(CoreError::DuplicateKey(E::KIND, key).into());
    }
    let unique = draft.unique_fields();
    self.check_unique::<E>(&unique, None).await?;

    let set = draft.into_assignments(key.clone())?;
    let columns = set.iter().map(|a| a.column).collect::<Vec<_>>().join(", ");
    let slots = (1..=set.len())
      .map(|i| format!("?{i}"))
      .collect::<Vec<_>>()
      .join(", ");
    let sql = format!(
      "INSERT INTO {} ({columns}) VALUES ({slots})",
      E::SCHEMA.table
    );
    let params = set.into_iter().map(|a| encode_value(a.value)).collect();

    self
      .pool
      .execute(sql, params)
      .await
      .map_err(|e| rejected::<E>(e, &key, &unique))?;

    tracing::info!(kind = E::KIND.singular(), key = %key, "created");
    Ok(key)
  }

  async fn update(&self, id: &str, changes: E::Changes) -> Result<()> {
    if !self.exists::<E>(id).await? {
      return Err(CoreError::NotFound(E::KIND, id.to_owned()).into());
    }
    changes.validate()?;
    let unique = changes.unique_fields();
    self.check_unique::<E>(&unique, Some(id)).await?;

    let set = changes.into_assignments()?;
    if set.is_empty() {
      return Err(CoreError::NothingToUpdate.into());
    }
    let assignments = set
      .iter()
      .enumerate()
      .map(|(i, a)| format!("{} = ?{}", a.column, i + 1))
      .collect::<Vec<_>>()
      .join(", ");
    let sql = format!(
      "UPDATE {} SET {assignments} WHERE {} = ?{}",
      E::SCHEMA.table,
      E::SCHEMA.key,
      set.len() + 1
    );
    let mut params: Vec<Value> =
      set.into_iter().map(|a| encode_value(a.value)).collect();
    params.push(Value::Text(id.to_owned()));

    self
      .pool
      .execute(sql, params)
      .await
      .map_err(|e| rejected::<E>(e, id, &unique))?;

    tracing::info!(kind = E::KIND.singular(), key = %id, "updated");
    Ok(())
  }

  async fn delete(&self, id: &str) -> Result<()> {
    if !self.exists::<E>(id).await? {
      return Err(CoreError::NotFound(E::KIND, id.to_owned()).into());
    }

    let references = E::SCHEMA.referenced_by;
    for reference in references {
      let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE {} = ?1",
        reference.table, reference.column
      );
      if self.count(sql, vec![Value::Text(id.to_owned())]).await? > 0 {
        return Err(CoreError::InUse(E::KIND, id.to_owned()).into());
      }
    }

    let sql = format!(
      "DELETE FROM {} WHERE {} = ?1",
      E::SCHEMA.table,
      E::SCHEMA.key
    );
    self
      .pool
      .execute(sql, vec![Value::Text(id.to_owned())])
      .await
      .map_err(|e| match e.violation() {
        Some(Violation::ForeignKey) => {
          CoreError::InUse(E::KIND, id.to_owned()).into()
        }
        _ => e,
      })?;

    tracing::info!(kind = E::KIND.singular(), key = %id, "deleted");
    Ok(())
  }
}

// ─── Directory ───────────────────────────────────────────────────────────────

impl Directory for SqliteStore {
  async fn next_person_id(&self) -> Result<String> {
    self.next_key::<Person>(PERSON_KEY).await
  }

  async fn members(&self, of: &Affiliation) -> Result<Vec<Member>> {
    let (column, id) = match of {
      Affiliation::Department(id) => ("department_id", id.clone()),
      Affiliation::Rank(id) => ("rank_id", id.clone()),
    };
    let sql = format!("{MEMBER_SELECT} WHERE t.{column} = ?1 ORDER BY t.name, t.person_id");
    let raw = self.pool.query(sql, vec![Value::Text(id)], RawMember::read).await?;
    raw.into_iter().map(RawMember::into_member).collect()
  }
}
