use data_loader::RatingStore;
use std::path::Path;
use std::time::Instant;

fn main() {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let path = Path::new("data/ratings.txt");

    println!("Loading rating log...\n");

    let start = Instant::now();
    let (store, report) = RatingStore::load_from_file(path)
        .expect("Failed to load rating log");
    let elapsed = start.elapsed();

    let counts = store.counts();

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Users: {}", counts.users);
    println!("Movies: {}", counts.movies);
    println!("Training ratings: {}", counts.training_ratings);
    println!("Validation ratings: {}", counts.validation_ratings);
    println!("Skipped lines: {}", report.skipped);
    println!("\nPerformance: {:.0} ratings/second",
             report.parsed as f64 / elapsed.as_secs_f64());
}
