use crate::persistence::document;
use fxvault_domain::errors::StoreError;
use fxvault_domain::repositories::series_store::{ChunkQuery, SeriesStore};
use fxvault_domain::value_objects::chunk::{ChunkKey, SeriesChunk};
use fxvault_domain::value_objects::frequency::Frequency;
use postgres::types::ToSql;
use postgres::NoTls;
use r2d2::{Pool, PooledConnection};
use r2d2_postgres::PostgresConnectionManager;
use std::time::Instant;

const SCHEMA_SQL: &str = include_str!("../../migrations/0001_create_forex.sql");

type PgPool = Pool<PostgresConnectionManager<NoTls>>;
type PgConnection = PooledConnection<PostgresConnectionManager<NoTls>>;

/// Chunk documents in a Postgres table, one row per chunk identity.
///
/// The pool is owned by this handle; every operation checks out its own
/// connection and returns it when done.
#[derive(Debug, Clone)]
pub struct PostgresSeriesStore {
    pool: PgPool,
    pub table: String,
}

impl PostgresSeriesStore {
    pub fn new(db_url: String, table: String, pool_max_size: u32) -> Result<Self, String> {
        if let Err(err) = validate_table_name(&table) {
            return Err(format!("invalid table '{}': {}", table, err));
        }

        let config = db_url
            .parse::<postgres::Config>()
            .map_err(|err| format!("invalid postgres db url: {err}"))?;
        let manager = PostgresConnectionManager::new(config, NoTls);
        let pool = Pool::builder()
            .max_size(pool_max_size.max(1))
            .build(manager)
            .map_err(|err| format!("failed to build postgres pool: {err}"))?;

        Ok(Self { pool, table })
    }

    /// Wraps an existing pool without connecting.
    pub fn with_pool(pool: PgPool, table: String) -> Result<Self, String> {
        validate_table_name(&table)?;
        Ok(Self { pool, table })
    }

    /// Creates the table and its indexes if missing.
    pub fn migrate(&self) -> Result<(), StoreError> {
        let span = tracing::info_span!("infra.postgres.migrate", table = %self.table);
        let _enter = span.enter();

        let sql = schema_sql(&self.table);
        let mut client = self.checkout("migrate")?;
        client.batch_execute(&sql).map_err(|err| {
            record_error("migrate", "execute");
            tracing::error!(error = %err, "failed to apply schema");
            StoreError::unavailable(format!("failed to apply schema: {err}"))
        })?;
        tracing::info!("schema ready");
        Ok(())
    }

    fn checkout(&self, op: &'static str) -> Result<PgConnection, StoreError> {
        let get_start = Instant::now();
        match self.pool.get() {
            Ok(client) => {
                metrics::histogram!("fxvault.infra.postgres.pool.get_ms")
                    .record(get_start.elapsed().as_secs_f64() * 1000.0);
                Ok(client)
            }
            Err(err) => {
                record_error(op, "pool_get");
                tracing::error!(error = %err, "failed to checkout postgres connection");
                Err(StoreError::unavailable(format!(
                    "failed to checkout postgres connection: {err}"
                )))
            }
        }
    }
}

impl SeriesStore for PostgresSeriesStore {
    fn upsert_chunks(&self, chunks: &[SeriesChunk]) -> Result<usize, StoreError> {
        let overall_start = Instant::now();
        let span = tracing::info_span!(
            "infra.postgres.upsert_chunks",
            table = %self.table,
            chunks = chunks.len()
        );
        let _enter = span.enter();

        if chunks.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "INSERT INTO {} \
             (currency, type, pricetype, freq, year, month, start_utc, end_utc, document) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (currency, type, pricetype, freq, year, month) \
             DO UPDATE SET \
                start_utc = EXCLUDED.start_utc, \
                end_utc = EXCLUDED.end_utc, \
                document = EXCLUDED.document, \
                updated_at = NOW()",
            self.table
        );

        let mut client = self.checkout("upsert")?;
        let mut transaction = client.transaction().map_err(|err| {
            record_error("upsert", "begin");
            StoreError::unavailable(format!("failed to start transaction: {err}"))
        })?;
        let statement = transaction.prepare(&sql).map_err(|err| {
            record_error("upsert", "prepare");
            StoreError::unavailable(format!("failed to prepare upsert: {err}"))
        })?;

        for chunk in chunks {
            let key = &chunk.key;
            let doc = document::encode(chunk);
            let kind = key.kind.as_str();
            let field = key.field.as_str();
            let freq = key.frequency.label();
            let month = key.month.map(|m| m as i16);
            let params: [&(dyn ToSql + Sync); 9] = [
                &key.instrument,
                &kind,
                &field,
                &freq,
                &key.year,
                &month,
                &chunk.range_start,
                &chunk.range_end,
                &doc,
            ];
            if let Err(err) = transaction.execute(&statement, &params) {
                record_error("upsert", "execute");
                tracing::error!(
                    chunk = %key,
                    error = %err,
                    "chunk upsert failed; batch rolled back"
                );
                return Err(StoreError::unavailable(format!(
                    "upsert of {key} failed: {err}"
                )));
            }
        }

        transaction.commit().map_err(|err| {
            record_error("upsert", "commit");
            StoreError::unavailable(format!("failed to commit: {err}"))
        })?;

        metrics::counter!("fxvault.infra.postgres.calls_total", "op" => "upsert", "result" => "ok")
            .increment(1);
        metrics::counter!("fxvault.infra.postgres.chunks_written_total")
            .increment(chunks.len() as u64);
        metrics::histogram!("fxvault.infra.postgres.upsert_ms")
            .record(overall_start.elapsed().as_secs_f64() * 1000.0);
        tracing::debug!(chunks = chunks.len(), "upserted chunks");
        Ok(chunks.len())
    }

    fn find_one(&self, key: &ChunkKey) -> Result<Option<SeriesChunk>, StoreError> {
        let span = tracing::debug_span!("infra.postgres.find_one", table = %self.table, key = %key);
        let _enter = span.enter();

        let sql = format!(
            "SELECT document FROM {} \
             WHERE currency=$1 AND type=$2 AND pricetype=$3 AND freq = ANY($4) AND year=$5 \
             AND month IS NOT DISTINCT FROM $6 \
             ORDER BY (freq = ($4::TEXT[])[1]) DESC LIMIT 1",
            self.table
        );
        let freq = freq_tags(key.frequency);
        let month = key.month.map(|m| m as i16);

        let mut client = self.checkout("find_one")?;
        let row = client
            .query_opt(
                &sql,
                &[
                    &key.instrument,
                    &key.kind.as_str(),
                    &key.field.as_str(),
                    &freq,
                    &key.year,
                    &month,
                ],
            )
            .map_err(|err| {
                record_error("find_one", "query");
                tracing::error!(error = %err, "failed to query chunk");
                StoreError::unavailable(format!("failed to query chunk {key}: {err}"))
            })?;

        let chunk = match row {
            Some(row) => Some(decode_row(&row)?),
            None => None,
        };
        metrics::counter!("fxvault.infra.postgres.calls_total", "op" => "find_one", "result" => "ok")
            .increment(1);
        Ok(chunk)
    }

    fn find_chunks(&self, query: &ChunkQuery) -> Result<Vec<SeriesChunk>, StoreError> {
        let overall_start = Instant::now();
        let span = tracing::info_span!(
            "infra.postgres.find_chunks",
            table = %self.table,
            instrument = %query.instrument,
            kind = %query.kind,
            field = %query.field,
            freq = %query.frequency
        );
        let _enter = span.enter();

        let freq = freq_tags(query.frequency);
        let kind = query.kind.as_str();
        let field = query.field.as_str();
        let mut sql = format!(
            "SELECT document FROM {} \
             WHERE currency=$1 AND type=$2 AND pricetype=$3 AND freq = ANY($4)",
            self.table
        );
        let mut params: Vec<&(dyn ToSql + Sync)> = vec![&query.instrument, &kind, &field, &freq];

        let bounds = query.months.map(|range| {
            (
                range.begin.year,
                range.end.year,
                range.begin.ordinal(),
                range.end.ordinal(),
            )
        });
        if let Some((begin_year, end_year, begin_ordinal, end_ordinal)) = &bounds {
            sql.push_str(
                " AND ((month IS NULL AND year BETWEEN $5 AND $6) \
                 OR (month IS NOT NULL AND (year::BIGINT * 12 + month - 1) BETWEEN $7 AND $8))",
            );
            params.push(begin_year);
            params.push(end_year);
            params.push(begin_ordinal);
            params.push(end_ordinal);
        }
        // A canonical row sorts after its legacy twin so the merge keeps it.
        sql.push_str(
            " ORDER BY year ASC, month ASC NULLS FIRST, (freq = ($4::TEXT[])[1]) ASC",
        );

        let mut client = self.checkout("find_chunks")?;
        let rows = client.query(&sql, &params).map_err(|err| {
            record_error("find_chunks", "query");
            tracing::error!(error = %err, "failed to query chunks");
            StoreError::unavailable(format!("failed to query chunks: {err}"))
        })?;

        let chunks = rows
            .iter()
            .map(decode_row)
            .collect::<Result<Vec<_>, _>>()?;

        metrics::counter!("fxvault.infra.postgres.calls_total", "op" => "find_chunks", "result" => "ok")
            .increment(1);
        metrics::histogram!("fxvault.infra.postgres.find_chunks_ms")
            .record(overall_start.elapsed().as_secs_f64() * 1000.0);
        tracing::debug!(chunks = chunks.len(), "loaded chunks");
        Ok(chunks)
    }
}

fn decode_row(row: &postgres::Row) -> Result<SeriesChunk, StoreError> {
    let doc: serde_json::Value = row
        .try_get(0)
        .map_err(|err| StoreError::malformed(format!("unreadable document column: {err}")))?;
    document::decode(&doc)
}

/// Stored `freq` tags matching a frequency, canonical label first. Minute
/// chunks written by older loaders carry `minute`.
fn freq_tags(frequency: Frequency) -> Vec<String> {
    let mut tags = vec![frequency.label()];
    if frequency == Frequency::MINUTE {
        tags.push("minute".to_string());
    }
    tags
}

fn record_error(op: &'static str, stage: &'static str) {
    metrics::counter!("fxvault.infra.postgres.calls_total", "op" => op, "result" => "err")
        .increment(1);
    metrics::counter!("fxvault.infra.postgres.errors_total", "op" => op, "stage" => stage)
        .increment(1);
}

fn schema_sql(table: &str) -> String {
    SCHEMA_SQL
        .replace("{table}", table)
        .replace("{index}", &table.replace('.', "_"))
}

fn validate_table_name(table: &str) -> Result<(), String> {
    if table.is_empty() {
        return Err("table name is empty".to_string());
    }
    let parts: Vec<&str> = table.split('.').collect();
    if parts.len() > 2 {
        return Err(format!("invalid table name: {table}"));
    }
    for part in parts {
        let mut chars = part.chars();
        let first = match chars.next() {
            Some(ch) => ch,
            None => return Err(format!("invalid table name: {table}")),
        };
        if !(first.is_ascii_alphabetic() || first == '_') {
            return Err(format!("invalid table name: {table}"));
        }
        if !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
            return Err(format!("invalid table name: {table}"));
        }
    }
    Ok(())
}
