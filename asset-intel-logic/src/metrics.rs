use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, register_int_gauge, IntCounterVec, IntGauge};

lazy_static! {
    pub static ref RUNS_ENQUEUED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "asset_intel_runs_enqueued",
        "total number of intelligence runs enqueued per processor",
        &["processor_name"]
    )
    .unwrap();
    pub static ref RUNS_COMPLETED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "asset_intel_runs_completed",
        "total number of intelligence runs completed per processor and status",
        &["processor_name", "status"]
    )
    .unwrap();
    pub static ref RUNS_RETRIED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "asset_intel_runs_retried",
        "total number of intelligence run retries per processor",
        &["processor_name"]
    )
    .unwrap();
    pub static ref RUNS_DEADLETTERED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "asset_intel_runs_deadlettered",
        "total number of intelligence runs moved to the dead-letter queue",
        &["processor_name"]
    )
    .unwrap();
    pub static ref RUNS_CANCELED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "asset_intel_runs_canceled",
        "total number of intelligence runs canceled per processor",
        &["processor_name"]
    )
    .unwrap();
    pub static ref QUEUE_DEPTH: IntGauge = register_int_gauge!(
        "asset_intel_queue_depth",
        "approximate number of pending entries in the run queue stream"
    )
    .unwrap();
}
