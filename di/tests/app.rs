use fibre_di::{async_trait, App, BoxError, Container, Context, Error, Lifecycle, Phase};
use pretty_assertions::assert_eq;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

// --- Test Fixtures ---

/// Records lifecycle calls across every probe of one test.
#[derive(Clone, Default)]
struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
  fn record(&self, entry: String) {
    self.0.lock().unwrap().push(entry);
  }

  fn entries(&self) -> Vec<String> {
    self.0.lock().unwrap().clone()
  }
}

#[derive(Clone, Copy, Default)]
struct Behavior {
  start_delay: Option<Duration>,
  fail_start: bool,
  panic_on_start: bool,
  stop_delay: Option<Duration>,
  fail_stop: bool,
}

/// A managed service; the const parameter gives each probe its own type.
struct Probe<const ID: usize> {
  journal: Journal,
  behavior: Behavior,
}

impl<const ID: usize> Probe<ID> {
  fn new(journal: &Journal, behavior: Behavior) -> Self {
    Self {
      journal: journal.clone(),
      behavior,
    }
  }
}

#[async_trait]
impl<const ID: usize> Lifecycle for Probe<ID> {
  async fn start(&self, _ctx: Context) -> Result<(), BoxError> {
    if let Some(delay) = self.behavior.start_delay {
      tokio::time::sleep(delay).await;
    }
    if self.behavior.panic_on_start {
      panic!("probe {} exploded", ID);
    }
    if self.behavior.fail_start {
      return Err(format!("probe {} refused to start", ID).into());
    }
    self.journal.record(format!("start {}", ID));
    Ok(())
  }

  async fn stop(&self, _ctx: Context) -> Result<(), BoxError> {
    if let Some(delay) = self.behavior.stop_delay {
      tokio::time::sleep(delay).await;
    }
    self.journal.record(format!("stop {}", ID));
    if self.behavior.fail_stop {
      return Err(format!("probe {} refused to stop", ID).into());
    }
    Ok(())
  }
}

const SLOW: Duration = Duration::from_millis(500);
const TIMEOUT: Duration = Duration::from_millis(50);

/// Registers probes 1, 2 and 3 (3 depends on 1 and 2) and resolves probe 3,
/// which constructs them in the order 1, 2, 3.
fn wire(journal: &Journal, behaviors: [Behavior; 3]) -> Container {
  let container = Container::new();
  let (j, [b1, b2, b3]) = (journal.clone(), behaviors);
  container
    .provide({
      let j = j.clone();
      move || Probe::<1>::new(&j, b1)
    })
    .managed();
  container
    .provide({
      let j = j.clone();
      move || Probe::<2>::new(&j, b2)
    })
    .managed();
  container
    .provide(move |_: Arc<Probe<1>>, _: Arc<Probe<2>>| Probe::<3>::new(&j, b3))
    .managed();
  container.resolve::<Probe<3>>().unwrap();
  container
}

fn ok() -> Behavior {
  Behavior::default()
}

// --- Start ---

#[tokio::test]
async fn test_start_in_creation_order() {
  let journal = Journal::default();
  let container = wire(&journal, [ok(), ok(), ok()]);
  let app = App::new(&container);

  app.start(&Context::background()).await.unwrap();

  assert_eq!(journal.entries(), vec!["start 1", "start 2", "start 3"]);
}

#[tokio::test]
async fn test_start_follows_resolution_order_not_registration_order() {
  let journal = Journal::default();
  let container = Container::new();
  container
    .provide({
      let j = journal.clone();
      move || Probe::<1>::new(&j, ok())
    })
    .managed();
  container
    .provide({
      let j = journal.clone();
      move || Probe::<2>::new(&j, ok())
    })
    .managed();
  container.resolve::<Probe<2>>().unwrap();
  container.resolve::<Probe<1>>().unwrap();
  let app = App::new(&container);

  app.start(&Context::background()).await.unwrap();
  app.stop(&Context::background()).await.unwrap();

  // Stop reverses construction, not registration.
  assert_eq!(
    journal.entries(),
    vec!["start 2", "start 1", "stop 1", "stop 2"]
  );
}

#[tokio::test]
async fn test_start_stops_at_first_error() {
  let journal = Journal::default();
  let failing = Behavior {
    fail_start: true,
    ..ok()
  };
  let container = wire(&journal, [ok(), failing, ok()]);

  let err = App::new(&container)
    .start(&Context::background())
    .await
    .err()
    .unwrap();

  match err {
    Error::Lifecycle { phase, source, .. } => {
      assert_eq!(phase, Phase::Start);
      assert_eq!(source.to_string(), "probe 2 refused to start");
    }
    other => panic!("unexpected error: {other}"),
  }
  assert_eq!(journal.entries(), vec!["start 1"]);
}

#[tokio::test]
async fn test_start_timeout_reports_deadline() {
  let journal = Journal::default();
  let slow = Behavior {
    start_delay: Some(SLOW),
    ..ok()
  };
  let container = wire(&journal, [slow, ok(), ok()]);
  let app = App::new(&container).with_start_timeout(TIMEOUT);

  let began = Instant::now();
  let err = app.start(&Context::background()).await.err().unwrap();

  assert!(began.elapsed() < SLOW, "start waited for the slow service");
  match err {
    Error::DeadlineExceeded { phase, .. } => assert_eq!(phase, Phase::Start),
    other => panic!("unexpected error: {other}"),
  }
  assert!(journal.entries().is_empty());
}

#[tokio::test]
async fn test_zero_start_timeout_is_unbounded() {
  let journal = Journal::default();
  let slowish = Behavior {
    start_delay: Some(Duration::from_millis(100)),
    ..ok()
  };
  let container = wire(&journal, [slowish, ok(), ok()]);

  App::new(&container)
    .with_start_timeout(Duration::ZERO)
    .start(&Context::background())
    .await
    .unwrap();

  assert_eq!(journal.entries().len(), 3);
}

#[tokio::test]
async fn test_timeout_beyond_instant_range_is_unbounded() {
  let journal = Journal::default();
  let container = wire(&journal, [ok(), ok(), ok()]);
  let app = App::new(&container)
    .with_start_timeout(Duration::MAX)
    .with_stop_timeout(Duration::MAX);

  app.start(&Context::background()).await.unwrap();
  app.stop(&Context::background()).await.unwrap();

  assert_eq!(
    journal.entries(),
    vec!["start 1", "start 2", "start 3", "stop 3", "stop 2", "stop 1"]
  );
}

#[tokio::test]
async fn test_start_reports_external_cancellation() {
  let journal = Journal::default();
  let slow = Behavior {
    start_delay: Some(SLOW),
    ..ok()
  };
  let container = wire(&journal, [slow, ok(), ok()]);
  let ctx = Context::background();
  let canceller = ctx.clone();
  tokio::spawn(async move {
    tokio::time::sleep(TIMEOUT).await;
    canceller.cancel();
  });

  let err = App::new(&container).start(&ctx).await.err().unwrap();

  assert!(matches!(err, Error::Cancelled { phase: Phase::Start, .. }), "{err}");
}

#[tokio::test]
async fn test_start_panic_is_reported_as_lifecycle_error() {
  let journal = Journal::default();
  let exploding = Behavior {
    panic_on_start: true,
    ..ok()
  };
  let container = wire(&journal, [exploding, ok(), ok()]);

  let err = App::new(&container)
    .start(&Context::background())
    .await
    .err()
    .unwrap();

  assert!(matches!(err, Error::Lifecycle { phase: Phase::Start, .. }), "{err}");
  assert!(journal.entries().is_empty());
}

#[tokio::test]
async fn test_lifecycle_requires_managed_declaration() {
  struct Plain;

  let journal = Journal::default();
  let container = Container::new();
  container.provide(|| Plain);
  container.provide({
    let j = journal.clone();
    // Implements `Lifecycle`, but is not registered as managed.
    move || Probe::<7>::new(&j, ok())
  });
  container.resolve::<Plain>().unwrap();
  container.resolve::<Probe<7>>().unwrap();

  let app = App::new(&container);
  app.start(&Context::background()).await.unwrap();
  app.stop(&Context::background()).await.unwrap();

  assert!(journal.entries().is_empty());
}

// --- Stop ---

#[tokio::test]
async fn test_stop_in_reverse_creation_order() {
  let journal = Journal::default();
  let container = wire(&journal, [ok(), ok(), ok()]);

  App::new(&container)
    .stop(&Context::background())
    .await
    .unwrap();

  assert_eq!(journal.entries(), vec!["stop 3", "stop 2", "stop 1"]);
}

#[tokio::test]
async fn test_stop_attempts_every_service_and_returns_first_error() {
  let journal = Journal::default();
  let failing = Behavior {
    fail_stop: true,
    ..ok()
  };
  let container = wire(&journal, [failing, ok(), failing]);

  let err = App::new(&container)
    .stop(&Context::background())
    .await
    .err()
    .unwrap();

  // Probe 3 is stopped first, so its error is the one returned.
  match err {
    Error::Lifecycle { phase, source, .. } => {
      assert_eq!(phase, Phase::Stop);
      assert_eq!(source.to_string(), "probe 3 refused to stop");
    }
    other => panic!("unexpected error: {other}"),
  }
  assert_eq!(journal.entries(), vec!["stop 3", "stop 2", "stop 1"]);
}

#[tokio::test]
async fn test_stop_timeout_is_not_an_error() {
  let journal = Journal::default();
  let slow = Behavior {
    stop_delay: Some(SLOW),
    ..ok()
  };
  // Probe 1 is stopped last.
  let container = wire(&journal, [slow, ok(), ok()]);
  let app = App::new(&container).with_stop_timeout(TIMEOUT);

  let began = Instant::now();
  app.stop(&Context::background()).await.unwrap();

  assert!(began.elapsed() < SLOW, "stop waited for the slow service");
  assert_eq!(journal.entries(), vec!["stop 3", "stop 2"]);
}

// --- Run ---

#[tokio::test]
async fn test_run_starts_then_stops_after_cancellation() {
  let journal = Journal::default();
  let container = wire(&journal, [ok(), ok(), ok()]);
  let app = App::new(&container).with_stop_timeout(Duration::from_secs(1));
  let ctx = Context::background().with_timeout(Duration::from_millis(100));

  app.run(ctx).await.unwrap();

  assert_eq!(
    journal.entries(),
    vec!["start 1", "start 2", "start 3", "stop 3", "stop 2", "stop 1"]
  );
}

#[tokio::test]
async fn test_run_stops_after_start_error() {
  let journal = Journal::default();
  let failing = Behavior {
    fail_start: true,
    ..ok()
  };
  let container = wire(&journal, [failing, ok(), ok()]);
  let ctx = Context::background();

  let err = App::new(&container).run(ctx.clone()).await.err().unwrap();

  assert!(matches!(err, Error::Lifecycle { phase: Phase::Start, .. }), "{err}");
  assert_eq!(journal.entries(), vec!["stop 3", "stop 2", "stop 1"]);
  // The caller's context is left alone.
  assert_eq!(ctx.err(), None);
}

#[tokio::test]
async fn test_run_start_timeout_still_stops() {
  let journal = Journal::default();
  let slow = Behavior {
    start_delay: Some(SLOW),
    ..ok()
  };
  let container = wire(&journal, [slow, ok(), ok()]);
  let app = App::new(&container)
    .with_start_timeout(TIMEOUT)
    .with_stop_timeout(Duration::from_secs(1));

  let err = app.run(Context::background()).await.err().unwrap();

  assert!(err.is_deadline_exceeded());
  assert_eq!(journal.entries(), vec!["stop 3", "stop 2", "stop 1"]);
}

#[tokio::test]
async fn test_run_stop_survives_cancelled_external_context() {
  let journal = Journal::default();
  let slowish = Behavior {
    stop_delay: Some(Duration::from_millis(100)),
    ..ok()
  };
  let container = wire(&journal, [slowish, ok(), ok()]);

  // The expired context would end the slow stop immediately if it were reused.
  App::new(&container)
    .run(Context::background().with_timeout(Duration::from_millis(20)))
    .await
    .unwrap();

  assert_eq!(journal.entries().last().map(String::as_str), Some("stop 1"));
}

// --- Logging ---

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.0.lock().unwrap().extend_from_slice(buf);
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

#[tokio::test]
async fn test_logger_receives_progress_events() {
  let captured = Captured::default();
  let subscriber = tracing_subscriber::fmt()
    .with_ansi(false)
    .with_writer({
      let captured = captured.clone();
      move || captured.clone()
    })
    .finish();

  let journal = Journal::default();
  let container = wire(&journal, [ok(), ok(), ok()]);
  let app = App::new(&container).with_logger(subscriber);

  app.start(&Context::background()).await.unwrap();
  app.stop(&Context::background()).await.unwrap();

  let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
  for line in ["Starting...", "Started.", "Stopping...", "Stopped."] {
    assert!(output.contains(line), "missing {line:?} in {output}");
  }
}

#[tokio::test]
async fn test_logger_reports_stop_timeout_instead_of_stopped() {
  let captured = Captured::default();
  let subscriber = tracing_subscriber::fmt()
    .with_ansi(false)
    .with_writer({
      let captured = captured.clone();
      move || captured.clone()
    })
    .finish();

  let journal = Journal::default();
  let slow = Behavior {
    stop_delay: Some(SLOW),
    ..ok()
  };
  let container = wire(&journal, [slow, ok(), ok()]);
  let app = App::new(&container)
    .with_stop_timeout(TIMEOUT)
    .with_logger(subscriber);

  app.stop(&Context::background()).await.unwrap();

  let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
  assert!(output.contains("Stop timed out."), "{output}");
  assert!(!output.contains("Stopped."), "{output}");
}
