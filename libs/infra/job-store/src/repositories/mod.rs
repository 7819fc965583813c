// [libs/infra/job-store/src/repositories/mod.rs]
pub mod job;
pub mod ledger;
pub mod progress;
pub mod segment;

pub use job::JobRepository;
pub use ledger::SqlQuotaLedger;
pub use progress::ProgressRingRepository;
pub use segment::SegmentRepository;
