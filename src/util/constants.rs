/// Iterations of the timed phase for every operation.
pub const BENCH_COUNT: u64 = 10_000_000;

/// Discarded iterations run before the timed phase. Always `BENCH_COUNT / 1000`.
pub const WARMUP_COUNT: u64 = BENCH_COUNT / 1000;

pub const NS_PER_SEC: i64 = 1_000_000_000;
