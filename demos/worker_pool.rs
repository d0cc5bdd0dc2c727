//! # Example: worker_pool
//!
//! A fixed pool of workers fed from a producer task, with a consumer reading results
//! as they arrive. Ctrl-C cancels the run; whatever finished is still reported.
//!
//! Shows how to:
//! - Start a pool with [`Executor::pool`] and feed it through a [`Submitter`].
//! - Close the input exactly once, after the last submission.
//! - Use the `Drop` overflow policy so workers never stall on a slow consumer.
//! - Hook OS termination signals into a [`Cancellation`].
//!
//! ## Flow
//! ```text
//! producer ──submit──► [queue: 4] ──► worker 0..3 ──► ResultSink (Drop, cap 2)
//!     └── close()                                         │
//!                                   consumer: stream.next() ◄┘   (slow)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example worker_pool
//! cargo run --example worker_pool --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use taskgate::{Config, Executor, OverflowPolicy, Submitter, TaskError, TaskFn, TaskRef};
use tokio_util::sync::CancellationToken;

fn checksum(id: u64) -> TaskRef<u64> {
    TaskFn::arc(id, move |ctx: CancellationToken| async move {
        let mut acc = id;
        for round in 0..5u64 {
            if ctx.is_cancelled() {
                return Err(TaskError::Canceled);
            }
            acc = acc.wrapping_mul(31).wrapping_add(round);
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        Ok(acc)
    })
}

async fn produce(submitter: Submitter<u64>, count: u64) -> anyhow::Result<()> {
    for id in 0..count {
        submitter.submit(checksum(id)).await?;
    }
    submitter.close();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config {
        workers: 4,
        queue_capacity: 4,
        result_capacity: 2,
        overflow: OverflowPolicy::Drop,
        deadline: Duration::from_secs(10),
        ..Config::default()
    };

    #[cfg(feature = "logging")]
    let subs: Vec<Arc<dyn taskgate::Subscribe>> = vec![Arc::new(taskgate::LogWriter::new())];
    #[cfg(not(feature = "logging"))]
    let subs: Vec<Arc<dyn taskgate::Subscribe>> = Vec::new();

    let exec = Executor::builder(cfg).with_subscribers(subs).build();
    let cancel = exec.cancellation();
    let _signals = cancel.cancel_on_shutdown_signal();

    let (submitter, mut stream) = exec.pool::<u64>(&cancel);
    let producer = tokio::spawn(produce(submitter, 40));

    while let Some(result) = stream.next().await {
        match result.outcome {
            Ok(sum) => println!("task {:>2} checksum {sum:#018x}", result.id.0),
            Err(e) => println!("task {:>2} failed: {e}", result.id.0),
        }
        // A deliberately slow consumer; with `Drop` the workers keep going regardless.
        tokio::time::sleep(Duration::from_millis(25)).await;
    }

    if let Err(e) = producer.await? {
        println!("producer stopped early: {e}");
    }

    println!(
        "received={} dropped={} status={:?}",
        stream.received(),
        stream.dropped(),
        stream.status()
    );
    exec.shutdown().await;
    Ok(())
}
