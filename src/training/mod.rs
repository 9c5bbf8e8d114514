//! Training pipeline: metrics aggregation, checkpointing, reporting and the
//! episode loop driver.

mod checkpoint;
mod driver;
mod metrics;
mod reporter;

pub use checkpoint::{timestamp_run_name, Checkpoint, CheckpointStore};
pub use driver::{TrainingLoop, TrainingSummary, REWARD_CLIP};
pub use metrics::{EpisodeRecord, MetricsAggregator, Smoother, StatsSnapshot};
pub use reporter::Reporter;
