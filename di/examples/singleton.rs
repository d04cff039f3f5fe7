use fibre_di::Container;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

// A simple service that gets a unique ID upon creation.
struct RequestTracker {
  id: usize,
}

// A service built on top of the tracker.
struct Gateway {
  tracker: Arc<RequestTracker>,
}

// A global, thread-safe counter to generate unique IDs.
static ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn main() {
  let container = Container::new();

  // This constructor will only be called ONCE, however often the tracker is needed.
  container.provide(|| {
    println!("Creating RequestTracker...");
    RequestTracker {
      id: ID_COUNTER.fetch_add(1, Ordering::SeqCst),
    }
  });
  container.provide(|tracker: Arc<RequestTracker>| {
    println!("Creating Gateway...");
    Gateway { tracker }
  });

  println!("--- Resolving ---");
  let gateway = container.resolve::<Gateway>().unwrap();
  let tracker = container.resolve::<RequestTracker>().unwrap();

  println!("Gateway tracker ID: {}, resolved tracker ID: {}", gateway.tracker.id, tracker.id);
  assert_eq!(tracker.id, 0);
  assert!(
    Arc::ptr_eq(&gateway.tracker, &tracker),
    "Singleton instances should be identical"
  );
  println!("Instances are the same pointer, as expected.");
  println!("Creation order: {:?}", container.creation_order());
}
