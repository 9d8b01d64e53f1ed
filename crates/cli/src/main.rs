use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{DataIndex, MovieId, UserId};
use pipeline::{FixedAnchor, NeighborFinder, RecommenderConfig, SeededAnchor};
use predictor::{LatentFactorModel, RatingPredictor};
use rand::Rng;
use recommender::{RecommendationOrchestrator, RecommendationReport};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// ReelRecs - Movie Recommendation Engine
#[derive(Parser)]
#[command(name = "reel-recs")]
#[command(about = "Title-based movie recommendations using collaborative filtering", long_about = None)]
struct Cli {
    /// Path to MovieLens dataset directory (movies.csv, ratings.csv)
    #[arg(short, long, default_value = "data/ml-latest-small")]
    data_dir: PathBuf,

    /// Pretrained latent-factor model (JSON export)
    #[arg(short, long, default_value = "models/latent_factors.json")]
    model: PathBuf,

    /// Recommender configuration file (JSON); defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend movies for a list of favorite titles
    Recommend {
        /// Favorite movie title, exactly as in the dataset (repeatable)
        #[arg(long = "title", required = true)]
        titles: Vec<String>,

        /// Number of recommendations to return (default from config)
        #[arg(long)]
        top_n: Option<usize>,

        /// Use this title as the anchor instead of a random one
        #[arg(long, conflicts_with = "seed")]
        anchor: Option<String>,

        /// Seed the random anchor choice for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Leave the anchor title out of the results
        #[arg(long)]
        exclude_anchor: bool,

        /// Show neighborhood statistics for each recommendation
        #[arg(long)]
        explain: bool,
    },

    /// Search for movies by title
    Search {
        /// Movie title to search for (case-insensitive substring match)
        #[arg(long)]
        title: String,
    },

    /// Show the neighbor users found for a list of favorite titles
    Neighbors {
        /// Favorite movie title (repeatable)
        #[arg(long = "title", required = true)]
        titles: Vec<String>,
    },

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Favorite titles per request, drawn at random
        #[arg(long, default_value = "3")]
        favorites: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "4")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RecommenderConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => RecommenderConfig::default(),
    };

    // Load data index (this may take a moment)
    println!("Loading MovieLens dataset from {}...", cli.data_dir.display());
    let start = Instant::now();
    let data_index = Arc::new(
        DataIndex::load_from_files(&cli.data_dir).context("Failed to load MovieLens dataset")?,
    );
    println!("{} Loaded dataset in {:?}", "✓".green(), start.elapsed());

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Recommend {
            titles,
            top_n,
            anchor,
            seed,
            exclude_anchor,
            explain,
        } => {
            let predictor = load_model(&cli.model)?;
            let config = RecommenderConfig {
                exclude_anchor: exclude_anchor || config.exclude_anchor,
                ..config
            };
            let top_n = top_n.unwrap_or(config.default_top_n);
            let options = AnchorOptions { anchor, seed };
            handle_recommend(data_index, predictor, config, titles, top_n, options, explain)
                .await?
        }
        Commands::Search { title } => handle_search(&data_index, &title),
        Commands::Neighbors { titles } => {
            let predictor = load_model(&cli.model)?;
            handle_neighbors(data_index, predictor, &config, &titles)?
        }
        Commands::Benchmark {
            requests,
            favorites,
            concurrent,
        } => {
            let predictor = load_model(&cli.model)?;
            handle_benchmark(data_index, predictor, config, requests, favorites, concurrent)
                .await?
        }
    }

    Ok(())
}

/// Load the pretrained rating model
fn load_model(path: &Path) -> Result<Arc<dyn RatingPredictor>> {
    let start = Instant::now();
    let model = LatentFactorModel::load_from_file(path)
        .with_context(|| format!("Failed to load rating model from {}", path.display()))?;
    println!("{} Loaded rating model in {:?}", "✓".green(), start.elapsed());
    Ok(Arc::new(model))
}

/// Anchor flags of the 'recommend' command
struct AnchorOptions {
    anchor: Option<String>,
    seed: Option<u64>,
}

/// Handle the 'recommend' command
async fn handle_recommend(
    data_index: Arc<DataIndex>,
    predictor: Arc<dyn RatingPredictor>,
    config: RecommenderConfig,
    titles: Vec<String>,
    top_n: usize,
    options: AnchorOptions,
    explain: bool,
) -> Result<()> {
    let mut orchestrator = RecommendationOrchestrator::new(data_index, predictor, config)?;
    if let Some(anchor) = options.anchor {
        orchestrator = orchestrator.with_anchor_strategy(FixedAnchor::new(anchor));
    } else if let Some(seed) = options.seed {
        orchestrator = orchestrator.with_anchor_strategy(SeededAnchor::new(seed));
    }

    let report = orchestrator.explain(titles, top_n).await?;
    print_report(&report, explain);
    Ok(())
}

/// Handle the 'search' command
fn handle_search(data_index: &DataIndex, title: &str) {
    let query = title.to_lowercase();

    // (exact match?, movie id, title, genres, avg rating, rating count)
    let mut matches: Vec<(bool, MovieId, &str, String, f32, u32)> = data_index
        .get_all_movie_ids()
        .iter()
        .filter_map(|&movie_id| {
            let movie = data_index.get_movie(movie_id)?;
            let movie_title = movie.title.to_lowercase();
            if !movie_title.contains(&query) {
                return None;
            }
            let stats = data_index.get_movie_stats(movie_id);
            Some((
                movie_title == query,
                movie_id,
                movie.title.as_str(),
                movie.genres.join(", "),
                stats.map(|s| s.avg_rating).unwrap_or(0.0),
                stats.map(|s| s.rating_count).unwrap_or(0),
            ))
        })
        .collect();

    // Exact matches first, then the most rated
    matches.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.5.cmp(&a.5)));

    println!("{}", format!("Search results for '{}':", title).bold().blue());
    if matches.is_empty() {
        println!("  No movies found");
        return;
    }
    for (exact, movie_id, movie_title, genres, avg_rating, rating_count) in matches.iter().take(20) {
        let marker = if *exact { "=".green() } else { "•".cyan() };
        println!(
            "{} {}: {} [{}] avg {:.2} ({} ratings)",
            marker, movie_id, movie_title, genres, avg_rating, rating_count
        );
    }
    if matches.len() > 20 {
        println!("  ... and {} more", matches.len() - 20);
    }
}

/// Handle the 'neighbors' command
fn handle_neighbors(
    data_index: Arc<DataIndex>,
    predictor: Arc<dyn RatingPredictor>,
    config: &RecommenderConfig,
    titles: &[String],
) -> Result<()> {
    let finder = NeighborFinder::new(data_index.clone(), predictor)
        .with_neighbors_per_title(config.neighbors_per_title)
        .with_max_failure_ratio(config.max_failure_ratio);

    for title in titles {
        match finder.resolve_title(title) {
            Some(movie_id) => println!("{} {} -> movie {}", "•".green(), title, movie_id),
            None => println!("{} {} (not found, skipped)", "•".red(), title),
        }
    }

    let start = Instant::now();
    let neighbors = finder.find_neighbors(titles)?;

    // How often each user was picked, in user order
    let mut picks: BTreeMap<UserId, usize> = BTreeMap::new();
    for &user_id in &neighbors {
        *picks.entry(user_id).or_insert(0) += 1;
    }

    println!(
        "{}",
        format!(
            "{} neighbors ({} distinct) in {:.2?}:",
            neighbors.len(),
            picks.len(),
            start.elapsed()
        )
        .bold()
        .blue()
    );
    for (user_id, count) in &picks {
        println!(
            "  user {:>6}  picked {}x  {} ratings",
            user_id,
            count,
            data_index.get_user_ratings(*user_id).len()
        );
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    data_index: Arc<DataIndex>,
    predictor: Arc<dyn RatingPredictor>,
    config: RecommenderConfig,
    requests: usize,
    favorites: usize,
    concurrent: usize,
) -> Result<()> {
    if requests == 0 || favorites == 0 || concurrent == 0 {
        bail!("requests, favorites and concurrent must all be at least 1");
    }

    let movie_ids = data_index.get_all_movie_ids();
    if movie_ids.is_empty() {
        bail!("Dataset has no movies to draw favorites from");
    }

    let top_n = config.default_top_n;
    let orchestrator = RecommendationOrchestrator::new(data_index.clone(), predictor, config)?;

    // Random favorite lists drawn from the whole catalog
    let request_titles: Vec<Vec<String>> = {
        let mut rng = rand::rng();
        (0..requests)
            .map(|_| {
                (0..favorites)
                    .filter_map(|_| {
                        let movie_id = movie_ids[rng.random_range(0..movie_ids.len())];
                        data_index.get_movie(movie_id).map(|m| m.title.clone())
                    })
                    .collect()
            })
            .collect()
    };

    info!(
        "Running {} requests with {} favorites each, {} at a time",
        requests, favorites, concurrent
    );

    let wall_clock = Instant::now();
    let mut timings: Vec<Duration> = Vec::with_capacity(requests);
    for batch in request_titles.chunks(concurrent) {
        let mut handles = Vec::with_capacity(batch.len());
        for titles in batch {
            let orchestrator = orchestrator.clone();
            let titles = titles.clone();
            handles.push(tokio::spawn(async move {
                let start = Instant::now();
                orchestrator.recommend(titles, top_n).await?;
                Ok::<_, anyhow::Error>(start.elapsed())
            }));
        }
        for handle in handles {
            timings.push(handle.await??);
        }
    }
    let total_time = wall_clock.elapsed();

    timings.sort();
    let avg_latency = timings.iter().sum::<Duration>() / timings.len() as u32;
    let throughput = requests as f64 / total_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Total time: {:.2?}", total_time);
    println!("Average latency: {:.2?}", avg_latency);
    println!("P50 latency: {:.2?}", percentile(&timings, 0.50));
    println!("P95 latency: {:.2?}", percentile(&timings, 0.95));
    println!("P99 latency: {:.2?}", percentile(&timings, 0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Nearest-rank percentile of sorted timings
fn percentile(sorted: &[Duration], q: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let rank = (sorted.len() as f64 * q).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// Which stage left an empty report with nothing to show
fn empty_reason(report: &RecommendationReport) -> &'static str {
    if report.neighbor_count == 0 {
        "none of the favorite titles matched the dataset"
    } else if report.scored_titles == 0 {
        "the neighbors have not rated any titles"
    } else if report.anchor.is_none() {
        "the anchor title is not among the neighborhood's rated titles"
    } else {
        "the anchor was the only candidate and it is excluded"
    }
}

/// Helper function to format and print recommendations
fn print_report(report: &RecommendationReport, explain: bool) {
    println!("{}", "Movie Recommendations:".bold().blue());

    if report.recommendations.is_empty() {
        println!("  No recommendations ({})", empty_reason(report));
        return;
    }

    if explain {
        println!(
            "Neighborhood: {} users ({} picks), {} rated titles",
            report.distinct_neighbors, report.neighbor_count, report.scored_titles
        );
        if let Some(constants) = report.constants {
            println!(
                "Scoring: C = {:.3}, m = {:.1}",
                constants.global_mean, constants.min_votes
            );
        }
        if let Some(anchor) = &report.anchor {
            println!("Anchor: {}", anchor.yellow());
        }
    }

    for (i, rec) in report.recommendations.iter().enumerate() {
        println!(
            "{}. {} [{}]",
            (i + 1).to_string().green(),
            rec.title,
            rec.genres.join(", ")
        );
        if explain {
            println!(
                "   similarity {:.4}  weighted {:.3}  mean {:.2}  ({} neighbor ratings)",
                rec.similarity, rec.weighted_rating, rec.rating_mean, rec.rating_count
            );
        }
    }

    if explain {
        println!("Completed in {:.2?}", report.elapsed);
    }
}
