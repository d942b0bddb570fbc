//! Row sampling: filter first, then probabilistic per-row selection.
//!
//! The sampler performs the single I/O-bound step of a scan. It reads the
//! source table through the caller's DataFusion session, applies the
//! document's `rowFilter` as a WHERE clause, draws a Bernoulli sample (each
//! surviving row kept independently with probability `samplingPercent/100`),
//! and materializes the result into an in-memory table registered, under
//! the original table name, on a fresh session. Rule SQL written against
//! the source table therefore evaluates against the sample, and everything
//! after sampling is CPU-bound.

use arrow::array::BooleanArray;
use arrow::compute::filter_record_batch;
use arrow::datatypes::{Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use datafusion::datasource::MemTable;
use datafusion::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::error::{DqError, Result};
use crate::security::SqlSafety;

/// The materialized row sample a scan evaluates against.
#[derive(Clone)]
pub struct RowSample {
    /// Session holding only the sample, registered under the source name
    ctx: SessionContext,
    /// The table name rule SQL should reference
    table_name: String,
    /// Rows in the sample
    row_count: u64,
    /// Rows in the filtered source the sample was drawn from
    source_row_count: u64,
}

// SessionContext has no Debug impl, so the context field is elided
impl std::fmt::Debug for RowSample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowSample")
            .field("table_name", &self.table_name)
            .field("row_count", &self.row_count)
            .field("source_row_count", &self.source_row_count)
            .finish_non_exhaustive()
    }
}

impl RowSample {
    /// The session context containing the sample table.
    pub fn ctx(&self) -> &SessionContext {
        &self.ctx
    }

    /// The registered name of the sample table.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Number of rows in the sample.
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Number of filtered source rows the sample was drawn from.
    pub fn source_row_count(&self) -> u64 {
        self.source_row_count
    }
}

/// Draws filtered, probabilistic row samples from a registered table.
#[derive(Debug, Clone)]
pub struct Sampler {
    row_filter: Option<String>,
    sampling_percent: f64,
    seed: Option<u64>,
}

impl Sampler {
    /// Creates a sampler with the given filter and sampling percentage.
    ///
    /// # Panics
    ///
    /// Panics if `sampling_percent` is outside 0-100; the loader guarantees
    /// the bound for document-sourced values.
    pub fn new(row_filter: Option<String>, sampling_percent: f64) -> Self {
        assert!(
            (0.0..=100.0).contains(&sampling_percent),
            "sampling percent must be between 0 and 100"
        );
        Self {
            row_filter,
            sampling_percent,
            seed: None,
        }
    }

    /// Seeds the sampler for reproducible sampling.
    ///
    /// Without a seed, sample size varies run to run.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Reads the source table, applies the filter, draws the sample, and
    /// registers it on a fresh session under the source table name.
    ///
    /// Fails with [`DqError::SourceUnavailable`] if the table cannot be read
    /// or the row filter does not plan against it.
    #[instrument(skip(self, ctx), fields(
        sample.table = %table,
        sample.percent = self.sampling_percent,
        sample.filter = self.row_filter.is_some()
    ))]
    pub async fn sample(&self, ctx: &SessionContext, table: &str) -> Result<RowSample> {
        let table_ident = SqlSafety::escape_identifier(table)
            .map_err(|e| DqError::source_unavailable(table, e.to_string()))?;

        let sql = match &self.row_filter {
            Some(filter) => format!("SELECT * FROM {table_ident} WHERE ({filter})"),
            None => format!("SELECT * FROM {table_ident}"),
        };

        let df = ctx
            .sql(&sql)
            .await
            .map_err(|e| DqError::source_unavailable(table, e.to_string()))?;
        let schema: SchemaRef = Arc::new(Schema::from(df.schema()));
        let batches = df
            .collect()
            .await
            .map_err(|e| DqError::source_unavailable(table, e.to_string()))?;

        let source_rows: u64 = batches.iter().map(|b| b.num_rows() as u64).sum();

        let sampled = if self.sampling_percent >= 100.0 {
            batches
        } else {
            self.bernoulli_sample(&batches)?
        };
        let sample_rows: u64 = sampled.iter().map(|b| b.num_rows() as u64).sum();

        let eval_ctx = SessionContext::new();
        let provider = MemTable::try_new(schema, vec![sampled])
            .map_err(|e| DqError::source_unavailable(table, e.to_string()))?;
        eval_ctx
            .register_table(table, Arc::new(provider))
            .map_err(|e| DqError::source_unavailable(table, e.to_string()))?;

        info!(
            sample.table = %table,
            sample.source_rows = source_rows,
            sample.rows = sample_rows,
            sample.percent = self.sampling_percent,
            "Sample materialized"
        );

        Ok(RowSample {
            ctx: eval_ctx,
            table_name: table.to_string(),
            row_count: sample_rows,
            source_row_count: source_rows,
        })
    }

    /// Keeps each row independently with probability `samplingPercent/100`.
    fn bernoulli_sample(&self, batches: &[RecordBatch]) -> Result<Vec<RecordBatch>> {
        let probability = self.sampling_percent / 100.0;
        let mut rng: StdRng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut sampled = Vec::with_capacity(batches.len());
        for batch in batches {
            let mask: BooleanArray = (0..batch.num_rows())
                .map(|_| Some(rng.random::<f64>() < probability))
                .collect();
            let filtered = filter_record_batch(batch, &mask)?;
            debug!(
                sample.batch_rows = batch.num_rows(),
                sample.kept_rows = filtered.num_rows(),
                "Sampled batch"
            );
            sampled.push(filtered);
        }
        Ok(sampled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int64Array;
    use arrow::datatypes::{DataType, Field};

    fn ride_batch(values: Vec<Option<i64>>) -> (SchemaRef, RecordBatch) {
        let schema = Arc::new(Schema::new(vec![Field::new(
            "duration",
            DataType::Int64,
            true,
        )]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(Int64Array::from(values)) as _],
        )
        .unwrap();
        (schema, batch)
    }

    async fn register_rides(values: Vec<Option<i64>>) -> SessionContext {
        let ctx = SessionContext::new();
        let (schema, batch) = ride_batch(values);
        let provider = MemTable::try_new(schema, vec![vec![batch]]).unwrap();
        ctx.register_table("rides", Arc::new(provider)).unwrap();
        ctx
    }

    #[tokio::test]
    async fn test_full_sample_keeps_all_rows() {
        let ctx = register_rides((0..50).map(Some).collect()).await;
        let sampler = Sampler::new(None, 100.0);

        let sample = sampler.sample(&ctx, "rides").await.unwrap();
        assert_eq!(sample.row_count(), 50);
        assert_eq!(sample.source_row_count(), 50);
        assert_eq!(sample.table_name(), "rides");
    }

    #[tokio::test]
    async fn test_sample_debug_elides_the_context() {
        let ctx = register_rides((0..5).map(Some).collect()).await;
        let sample = Sampler::new(None, 100.0).sample(&ctx, "rides").await.unwrap();

        let rendered = format!("{sample:?}");
        assert!(rendered.contains("RowSample"));
        assert!(rendered.contains("\"rides\""));
        assert!(rendered.contains("row_count: 5"));
    }

    #[tokio::test]
    async fn test_filter_applies_before_sampling() {
        let ctx = register_rides((0..100).map(Some).collect()).await;
        let sampler = Sampler::new(Some("duration >= 90".to_string()), 100.0);

        let sample = sampler.sample(&ctx, "rides").await.unwrap();
        assert_eq!(sample.source_row_count(), 10);
        assert_eq!(sample.row_count(), 10);
    }

    #[tokio::test]
    async fn test_seeded_sampling_is_reproducible() {
        let ctx = register_rides((0..1000).map(Some).collect()).await;
        let sampler = Sampler::new(None, 20.0).with_seed(42);

        let first = sampler.sample(&ctx, "rides").await.unwrap();
        let second = sampler.sample(&ctx, "rides").await.unwrap();
        assert_eq!(first.row_count(), second.row_count());
        // roughly 20 percent of 1000, with wide tolerance
        assert!(first.row_count() > 100 && first.row_count() < 350);
    }

    #[tokio::test]
    async fn test_sampled_table_is_queryable() {
        let ctx = register_rides((0..10).map(Some).collect()).await;
        let sampler = Sampler::new(None, 100.0);
        let sample = sampler.sample(&ctx, "rides").await.unwrap();

        let df = sample.ctx().sql("SELECT COUNT(*) FROM rides").await.unwrap();
        let batches = df.collect().await.unwrap();
        let count = batches[0]
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap()
            .value(0);
        assert_eq!(count, 10);
    }

    #[tokio::test]
    async fn test_unknown_table_is_source_unavailable() {
        let ctx = SessionContext::new();
        let sampler = Sampler::new(None, 100.0);

        let err = sampler.sample(&ctx, "missing").await.unwrap_err();
        assert!(matches!(err, DqError::SourceUnavailable { .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_bad_filter_is_source_unavailable() {
        let ctx = register_rides(vec![Some(1)]).await;
        let sampler = Sampler::new(Some("no_such_column = 1".to_string()), 100.0);

        let err = sampler.sample(&ctx, "rides").await.unwrap_err();
        assert!(matches!(err, DqError::SourceUnavailable { .. }));
    }
}
