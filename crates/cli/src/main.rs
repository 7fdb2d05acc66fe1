use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use data_loader::{DataLoadError, MovieId, RatingStore, UserId};
use prediction::{round_rating, Evaluator, PredictionSource, Predictor, SweepConfig};
use similarity::{
    build_neighbor_index, NeighborIndex, NeighborStrategy, ScoreContext, SimilarityEngine,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// ReelKnn - user-based collaborative filtering
#[derive(Parser)]
#[command(name = "reel-knn")]
#[command(about = "Predict movie ratings from the ratings of similar users", long_about = None)]
struct Cli {
    /// Path to the `userId::movieId::rating::timestamp` rating log
    #[arg(short, long, default_value = "data/ratings.txt")]
    ratings: PathBuf,

    /// How neighbors are found
    #[arg(short, long, value_enum, default_value_t = StrategyArg::Exact)]
    strategy: StrategyArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// Every pairwise score (slow, exact)
    Exact,
    /// Walk a single popularity ranking (fast, approximate)
    RankWalk,
}

impl From<StrategyArg> for NeighborStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Exact => NeighborStrategy::Exact,
            StrategyArg::RankWalk => NeighborStrategy::RankWalk,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Report mean absolute error on the validation ratings for a range of k
    Evaluate {
        /// Smallest neighborhood size
        #[arg(long, default_value = "10")]
        k_start: usize,

        /// Largest neighborhood size (inclusive)
        #[arg(long, default_value = "200")]
        k_end: usize,

        /// Increment between neighborhood sizes
        #[arg(long, default_value = "10")]
        k_step: usize,

        /// Print the reports as JSON
        #[arg(long)]
        json: bool,

        /// Also print each user's mean absolute error
        #[arg(long)]
        per_user: bool,
    },

    /// Predict one user's rating of one movie
    Predict {
        #[arg(long)]
        user_id: UserId,

        #[arg(long)]
        movie_id: MovieId,

        /// Number of rating neighbors to average
        #[arg(long, default_value = "20")]
        k: usize,
    },

    /// Show the users most similar to a user
    Neighbors {
        #[arg(long)]
        user_id: UserId,

        /// Number of neighbors to show
        #[arg(long, default_value = "10")]
        k: usize,
    },

    /// Show the similarity score of two users
    Similarity {
        #[arg(long)]
        user_a: UserId,

        #[arg(long)]
        user_b: UserId,

        /// Score in the context of this movie (enables the movie-average fallback)
        #[arg(long)]
        movie_id: Option<MovieId>,
    },

    /// Show how the log was partitioned
    Stats,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let strategy = NeighborStrategy::from(cli.strategy);

    let store = Arc::new(load_store(&cli.ratings)?);

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Evaluate {
            k_start,
            k_end,
            k_step,
            json,
            per_user,
        } => {
            let config = SweepConfig::default()
                .with_range(k_start, k_end)
                .with_step(k_step);
            handle_evaluate(store, strategy, &config, json, per_user)?
        }
        Commands::Predict { user_id, movie_id, k } => {
            handle_predict(store, strategy, user_id, movie_id, k)
        }
        Commands::Neighbors { user_id, k } => handle_neighbors(&store, strategy, user_id, k),
        Commands::Similarity {
            user_a,
            user_b,
            movie_id,
        } => handle_similarity(&store, user_a, user_b, movie_id),
        Commands::Stats => handle_stats(&store),
    }

    Ok(())
}

/// Load the rating log.
///
/// A missing log is not fatal: the run goes on with an empty store and every
/// prediction falls through to the neutral rating.
fn load_store(path: &Path) -> Result<RatingStore> {
    let start = Instant::now();
    match RatingStore::load_from_file(path) {
        Ok((store, report)) => {
            println!(
                "{} Loaded {} ratings in {:?} ({} malformed lines skipped)",
                "✓".green(),
                report.parsed,
                start.elapsed(),
                report.skipped
            );
            Ok(store)
        }
        Err(err @ DataLoadError::FileNotFound { .. }) => {
            error!("{}; continuing with no ratings", err);
            Ok(RatingStore::new())
        }
        Err(err) => Err(err).context("Failed to load rating log"),
    }
}

fn build_predictor(store: Arc<RatingStore>, strategy: NeighborStrategy) -> Predictor {
    info!("Building {} neighbor index...", strategy);
    let start = Instant::now();
    let index: Arc<dyn NeighborIndex> = Arc::from(build_neighbor_index(&store, strategy));
    info!("{} ready in {:?}", index.name(), start.elapsed());
    Predictor::new(store, index)
}

/// Handle the 'evaluate' command
fn handle_evaluate(
    store: Arc<RatingStore>,
    strategy: NeighborStrategy,
    config: &SweepConfig,
    json: bool,
    per_user: bool,
) -> Result<()> {
    let evaluator = Evaluator::new(build_predictor(store, strategy));
    let reports = evaluator.sweep(config);

    if json {
        let rendered =
            serde_json::to_string_pretty(&reports).context("Failed to serialize reports")?;
        println!("{}", rendered);
        return Ok(());
    }

    println!("{}", "User Rating Prediction".bold().blue());
    for report in &reports {
        let mae = match report.mean_absolute_error {
            Some(mae) => format!("{:.2}", mae),
            None => "n/a".to_string(),
        };
        println!(
            "Global Prediction vs Actual | Average Difference: {} | K = {:>3} ({} predictions)",
            mae.green(),
            report.k,
            report.predictions
        );

        if per_user {
            for (user_id, user_mae) in &report.per_user {
                println!("  UserID: {:>4} | Average Difference: {:.2}", user_id, user_mae);
            }
        }
    }
    Ok(())
}

/// Handle the 'predict' command
fn handle_predict(
    store: Arc<RatingStore>,
    strategy: NeighborStrategy,
    user_id: UserId,
    movie_id: MovieId,
    k: usize,
) {
    let actual = store.validation_ratings_of(user_id).get(&movie_id).copied();
    let predictor = build_predictor(store, strategy);
    let prediction = predictor.predict_detailed(user_id, movie_id, k);

    let source = match prediction.source {
        PredictionSource::Neighbors { count } => format!("mean of {} neighbors", count),
        PredictionSource::GlobalAverage => "movie's global average".to_string(),
        PredictionSource::Neutral => "neutral default".to_string(),
    };

    println!(
        "{}",
        format!("User {} / Movie {} (k = {})", user_id, movie_id, k).bold().blue()
    );
    println!("{}Prediction: {:.3}", "• ".green(), prediction.value);
    println!("{}Rounded: {}", "• ".green(), round_rating(prediction.value));
    println!("{}Source: {}", "• ".cyan(), source);
    if let Some(rating) = actual {
        let diff = (i64::from(rating.value) - round_rating(prediction.value)).abs();
        println!(
            "{}Held-out rating: {} (difference {})",
            "• ".cyan(),
            rating.value,
            diff
        );
    }
}

/// Handle the 'neighbors' command
fn handle_neighbors(store: &RatingStore, strategy: NeighborStrategy, user_id: UserId, k: usize) {
    let index = build_neighbor_index(store, strategy);
    let neighbors = index.top_k(user_id, k);

    println!(
        "{}",
        format!("Top {} neighbors of user {} ({}):", k, user_id, strategy)
            .bold()
            .blue()
    );
    if neighbors.is_empty() {
        println!("  (none)");
    }
    for (rank, neighbor) in neighbors.iter().enumerate() {
        println!(
            "{}. user {:>5}  score {:.6}  ({} training ratings)",
            (rank + 1).to_string().green(),
            neighbor.user_id,
            neighbor.score,
            store.training_ratings_of(neighbor.user_id).len()
        );
    }
}

/// Handle the 'similarity' command
fn handle_similarity(
    store: &RatingStore,
    user_a: UserId,
    user_b: UserId,
    movie_id: Option<MovieId>,
) {
    let engine = SimilarityEngine::new(store);
    let terms = engine.terms(user_a, user_b);
    let context = movie_id.map_or(ScoreContext::Batch, ScoreContext::Movie);

    println!(
        "{}",
        format!("Similarity of users {} and {}", user_a, user_b).bold().blue()
    );
    println!("{}Numerator: {}", "• ".green(), terms.numerator);
    println!("{}Sums of squares: {} x {}", "• ".green(), terms.sum1, terms.sum2);
    match engine.score(user_a, user_b, context) {
        Some(score) if terms.is_degenerate() => {
            println!("{}Score: {:.6} (movie-average fallback)", "• ".cyan(), score)
        }
        Some(score) => println!("{}Score: {:.6}", "• ".cyan(), score),
        None => println!("{}Score: none (no usable overlap)", "• ".cyan()),
    }
}

/// Handle the 'stats' command
fn handle_stats(store: &RatingStore) {
    let counts = store.counts();
    println!("{}", "Rating store".bold().blue());
    println!("{}Users: {}", "• ".green(), counts.users);
    println!("{}Movies: {}", "• ".green(), counts.movies);
    println!("{}Training ratings: {}", "• ".cyan(), counts.training_ratings);
    println!("{}Validation ratings: {}", "• ".cyan(), counts.validation_ratings);
    println!(
        "{}Users with training ratings: {}",
        "• ".cyan(),
        store.training_users().count()
    );
    println!(
        "{}Users with validation ratings: {}",
        "• ".cyan(),
        store.validation_users().count()
    );
}
