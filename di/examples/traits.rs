use fibre_di::{resolve, Container};
use std::sync::Arc;

// 1. Define the abstraction (the trait)
trait Logger: Send + Sync {
  fn log(&self, message: &str);
}

// 2. Define a concrete implementation, configured with a prefix
struct ConsoleLogger {
  prefix: String,
}

impl Logger for ConsoleLogger {
  fn log(&self, message: &str) {
    println!("[{}]: {}", self.prefix, message);
  }
}

// 3. Define a service that depends on the abstraction
struct ReportService {
  logger: Arc<dyn Logger>,
}

impl ReportService {
  fn generate_report(&self) {
    self.logger.log("Starting report generation.");
    // ... logic to generate report ...
    self.logger.log("Finished report generation.");
  }
}

fn main() {
  let container = Container::new();

  // --- Registration ---

  // The prefix is not part of the graph, so it is passed as an override.
  // `bind` declares that the logger satisfies `dyn Logger`.
  container
    .provide(|prefix: Arc<String>| ConsoleLogger {
      prefix: (*prefix).clone(),
    })
    .arg(String::from("CONSOLE LOG"))
    .bind(|it| it as Arc<dyn Logger>);

  // ReportService asks for the abstraction; it never names ConsoleLogger.
  container.provide(|logger: Arc<dyn Logger>| ReportService { logger });

  // --- Resolution and Usage ---
  println!("Resolving the high-level service...");
  let report_service = resolve!(in container, ReportService);

  println!("Using the service...");
  report_service.generate_report();
}
