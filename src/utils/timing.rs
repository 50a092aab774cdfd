use crate::error::Result;
use std::future::Future;
use std::time::Instant;
use tracing::debug;

// Measure execution time of a pipeline stage
pub async fn measure_time<F, T>(operation_name: &str, f: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let start = Instant::now();
    let result = f.await;
    let elapsed = start.elapsed();

    debug!("{} completed in {:.2?}", operation_name, elapsed);

    result
}
