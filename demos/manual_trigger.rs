//! # Demo: manual_trigger
//!
//! Simulates a numeric-code form: an "OCR" recognizer reads noisy text, keeps
//! four digits and writes them into a shared input field; the success check
//! accepts the field once it holds a complete code. The first reads are too
//! noisy, so the controller retries until one lands.
//!
//! ## Flow
//! ```text
//! run()
//!   ├─► attempt 1: "7 ?" → no code  → observe 500ms → field empty → retry
//!   ├─► attempt 2: "4a1" → no code  → observe 500ms → field empty → retry
//!   └─► attempt 3: "4 1-9 2" → 4192 → observe 500ms → field "4192" → Succeeded
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example manual_trigger
//! ```

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use retryvisor::{
    AttemptError, CheckFn, CodeFormat, Config, LogWriter, ObservationPolicy, PreflightError,
    PreflightFn, PresentFn, Progress, RecognizeFn, RetryController, RunSpec, Subscribe,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const READS: [&str; 3] = ["7 ?", "4a1", "4 1-9 2"];

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Config {
        max_attempts: 5,
        observation: ObservationPolicy::fixed(Duration::from_millis(500)),
        attempt_timeout: Duration::from_secs(3),
        ..Config::default()
    };

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let controller = RetryController::builder(cfg.clone())
        .with_subscribers(subs)
        .with_presenter(Arc::new(PresentFn(|p: &Progress| println!("[indicator] {p}"))))
        .build()?;
    let _signals = controller.cancel_on_shutdown_signal();

    let field = Arc::new(Mutex::new(String::new()));
    let format = CodeFormat::digits(4);

    let reads = Arc::new(AtomicUsize::new(0));
    let input = field.clone();
    let ocr = RecognizeFn::arc("fake-ocr", move |_ctx: CancellationToken| {
        let reads = reads.clone();
        let input = input.clone();
        async move {
            let raw = READS[reads.fetch_add(1, Ordering::SeqCst) % READS.len()];
            tokio::time::sleep(Duration::from_millis(200)).await;
            let code = format
                .extract(raw)
                .ok_or_else(|| AttemptError::fail(format!("no code in {raw:?}")))?;
            *input.lock().map_err(|_| AttemptError::fail("input poisoned"))? = code;
            Ok::<_, AttemptError>(true)
        }
    });

    let input = field.clone();
    let accepted = CheckFn::arc(move || {
        let input = input.clone();
        async move {
            let value = input.lock().map_err(|_| AttemptError::fail("input poisoned"))?;
            Ok::<_, AttemptError>(format.accepts(&value))
        }
    });

    let page_ready = PreflightFn::arc(|| async { Ok::<_, PreflightError>(()) });

    let spec = RunSpec::with_defaults(ocr, accepted, &cfg)?.with_preflight(page_ready);
    let status = controller.run(&spec).await;

    println!("[main] finished: {status} ({})", controller.progress());
    controller.shutdown().await;
    Ok(())
}
