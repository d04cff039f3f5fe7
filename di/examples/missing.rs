use fibre_di::{global, resolve};
use std::panic;
use std::sync::Arc;

struct UnregisteredService;

struct Mailer;

struct Signup {
  _mailer: Arc<Mailer>,
}

fn main() {
  // --- Using the panicking `resolve!` macro ---
  println!("Attempting to resolve a service that was never registered...");

  let result = panic::catch_unwind(|| {
    // This line will panic!
    let _service = resolve!(UnregisteredService);
  });

  assert!(result.is_err(), "resolve! should have panicked.");
  println!("Successfully caught the expected panic from resolve!.");

  // --- Using the fallible `resolve()` method ---
  println!("\nNow, resolving a service whose dependency is missing...");

  global()
    .provide(|mailer: Arc<Mailer>| Signup { _mailer: mailer })
    .named("new_signup");

  match global().resolve::<Signup>() {
    Ok(_) => panic!("Should not have built the service!"),
    Err(err) => {
      assert!(err.is_not_found());
      println!("Correctly received an error: {}", err);
    }
  }
}
