mod config;
mod items;
mod output;
mod prompt;
mod store;

use clap::Parser;
use std::io;
use std::path::PathBuf;
use tiersort_core::{
    leaderboard, next_rating_pair, start_merge_sort, start_tournament, status, submit,
    submit_rating, Catalog, Format, ItemId, MergeSortSession, Progress, RankingEntry,
    RankingSession, RatingSession, SessionStore, TournamentSession,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::{TiersortConfig, DEFAULT_SESSION_FILE};
use crate::items::ItemRecord;
use crate::prompt::Answer;
use crate::store::{FileStore, Slot, LOCAL_HOLDER};

pub fn bail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {msg}");
    std::process::exit(1);
}

#[derive(Parser)]
#[command(name = "tiersort", version, about = "Rank a list into S/A/B/C/D tiers by answering one pairwise question at a time")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Merge-sort the whole list (fewest questions for a strict order)
    Sort(SortArgs),
    /// Rank each category separately, then rank the best of each
    Tournament(TournamentArgs),
    /// Open-ended Elo rating: the winner defends against random challengers
    Rate(RateArgs),
    /// Show saved progress without asking anything
    Status(CommonArgs),
    /// Create a default config file at ~/.config/tiersort/config.toml
    Init {
        /// Where to write it (default: ~/.config/tiersort/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct CommonArgs {
    /// Session file holding items and progress (default: tiersort-session.json)
    #[arg(long)]
    session: Option<PathBuf>,

    /// Path to config file (default: ~/.config/tiersort/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output JSON instead of table
    #[arg(long)]
    json: bool,

    /// Log engine decisions to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(clap::Args)]
struct ItemArgs {
    /// File with one item per line (`name | category`) or a JSON array.
    /// Loading items replaces every session saved in the session file.
    #[arg(long)]
    items: Option<PathBuf>,

    /// Inline item, `name` or `name | category` (repeatable)
    #[arg(long = "item")]
    inline_items: Vec<String>,

    /// Discard saved progress for this mode and start over
    #[arg(long)]
    restart: bool,
}

#[derive(Parser)]
struct SortArgs {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    items: ItemArgs,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum FormatArg {
    MergeSort,
    RoundRobin,
}

impl From<FormatArg> for Format {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::MergeSort => Format::MergeSort,
            FormatArg::RoundRobin => Format::RoundRobin,
        }
    }
}

#[derive(Parser)]
struct TournamentArgs {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    items: ItemArgs,

    /// How each category group is ordered. Only read when a tournament starts.
    #[arg(long, value_enum)]
    group_format: Option<FormatArg>,

    /// How the finalists are ordered. Only read when a tournament starts.
    #[arg(long, value_enum)]
    final_format: Option<FormatArg>,

    /// Items promoted from each group before boundary ties
    #[arg(long)]
    finalists: Option<usize>,
}

#[derive(Parser)]
struct RateArgs {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    items: ItemArgs,

    /// Stop after this many verdicts (default: until you quit)
    #[arg(long)]
    rounds: Option<usize>,

    /// Maximum rating swing per verdict. Only read when ratings start.
    #[arg(long)]
    k_factor: Option<f64>,
}

/// Everything a subcommand needs once flags and config are merged.
struct Context {
    store: FileStore,
    config: TiersortConfig,
    json: bool,
}

impl Context {
    fn open(args: &CommonArgs) -> Context {
        init_tracing(args.verbose);

        // Load config file, merge with CLI args (CLI wins)
        let config_path = args.config.clone().unwrap_or_else(config::config_path);
        let config = config::load_config(&config_path);

        let session_path = args
            .session
            .clone()
            .or_else(|| config.session_file.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE));
        let store = FileStore::open(&session_path)
            .unwrap_or_else(|e| bail(format!("Failed to open session file {}: {e}", session_path.display())));
        debug!(path = %session_path.display(), "session file opened");

        Context {
            store,
            config,
            json: args.json,
        }
    }

    fn save(&self) {
        self.store
            .save()
            .unwrap_or_else(|e| bail(format!("Failed to save session to {}: {e}", self.store.path().display())));
    }

    /// Load `--items`/`--item` into the catalog if given. Returns whether a new
    /// catalog was loaded.
    fn take_items(&self, args: &ItemArgs) -> bool {
        let Some(records) = read_items(args) else {
            if self.store.item_ids().is_empty() {
                bail("No items yet. Use --items <file> or --item <name> to load some.");
            }
            return false;
        };
        if records.len() < 2 {
            bail(format!("Need at least 2 items to rank, got {}", records.len()));
        }
        let ids = self.store.load_items(records);
        debug!(items = ids.len(), "catalog replaced");
        true
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Items from `--items` and `--item`, or `None` if neither was given.
fn read_items(args: &ItemArgs) -> Option<Vec<ItemRecord>> {
    if args.items.is_none() && args.inline_items.is_empty() {
        return None;
    }

    let mut records = Vec::new();
    if let Some(ref path) = args.items {
        let content = std::fs::read_to_string(path)
            .unwrap_or_else(|e| bail(format!("Failed to read items file {}: {e}", path.display())));
        records = items::parse_items(&content).unwrap_or_else(|e| bail(e));
    }
    records.extend(
        args.inline_items
            .iter()
            .map(|raw| items::parse_line(raw))
            .filter(|record| !record.name.is_empty()),
    );
    Some(records)
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sort(args) => run_sort(args),
        Commands::Tournament(args) => run_tournament(args),
        Commands::Rate(args) => run_rate(args),
        Commands::Status(args) => run_status(args),
        Commands::Init { config } => {
            let path = config.unwrap_or_else(config::config_path);
            config::create_default_config(&path);
            println!("Created config at {}", path.display());
            println!("Edit it to set your default session file, tournament formats, etc.");
        }
    }
}

fn run_sort(args: SortArgs) {
    let ctx = Context::open(&args.common);
    let fresh = ctx.take_items(&args.items);

    let progress = match status::<MergeSortSession, _>(&ctx.store, LOCAL_HOLDER) {
        Ok(progress) if !fresh && !args.items.restart => {
            debug!(done = progress.done, total = progress.total, "resuming sort");
            progress
        }
        _ => start_merge_sort(&ctx.store, LOCAL_HOLDER, &ctx.store.item_ids()).unwrap_or_else(|e| bail(e)),
    };
    ctx.save();

    if let Some(done) = drive::<MergeSortSession>(&ctx, progress) {
        print_ranking(&ctx, &done);
    }
}

fn run_tournament(args: TournamentArgs) {
    let ctx = Context::open(&args.common);
    let fresh = ctx.take_items(&args.items);

    let progress = match status::<TournamentSession, _>(&ctx.store, LOCAL_HOLDER) {
        Ok(progress) if !fresh && !args.items.restart => {
            debug!(done = progress.done, total = progress.total, "resuming tournament");
            progress
        }
        _ => {
            let mut config = ctx.config.tournament();
            if let Some(format) = args.group_format {
                config.group_format = format.into();
            }
            if let Some(format) = args.final_format {
                config.final_format = format.into();
            }
            if let Some(finalists) = args.finalists {
                config.finalists_per_group = finalists;
            }
            start_tournament(&ctx.store, LOCAL_HOLDER, &ctx.store.categorised(), config)
                .unwrap_or_else(|e| bail(e))
        }
    };
    ctx.save();

    if let Some(done) = drive::<TournamentSession>(&ctx, progress) {
        print_ranking(&ctx, &done);
    }
}

/// Ask every pending pair until the session finishes or the user quits.
/// Saves after each verdict. Returns the final progress if finished.
fn drive<S>(ctx: &Context, mut progress: Progress) -> Option<Progress>
where
    S: RankingSession + Slot,
{
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut prompt_out = io::stderr();

    while let Some((a, b)) = progress.pending_pair {
        let header = output::progress_line(&progress);
        let answer = prompt::ask(&mut input, &mut prompt_out, &header, &ctx.store.name(a), &ctx.store.name(b))
            .unwrap_or_else(|e| bail(format!("Failed to read answer: {e}")));

        let (winner, loser) = match answer {
            Answer::First => (a, b),
            Answer::Second => (b, a),
            Answer::Quit => {
                eprintln!(
                    "Progress saved to {} ({}/{}). Run the same command again to resume.",
                    ctx.store.path().display(),
                    progress.done,
                    progress.total,
                );
                return None;
            }
        };

        progress = submit::<S, _>(&ctx.store, LOCAL_HOLDER, winner, loser).unwrap_or_else(|e| bail(e));
        ctx.save();
    }

    Some(progress)
}

fn print_ranking(ctx: &Context, progress: &Progress) {
    let ranking: &[RankingEntry] = progress.final_ranking.as_deref().unwrap_or_default();
    let ids: Vec<ItemId> = ranking.iter().map(|r| r.id).collect();
    let names = ctx.store.resolve(&ids);

    if ctx.json {
        let json = output::ranking_json(ranking, &names, progress.done)
            .unwrap_or_else(|e| bail(format!("Failed to encode ranking: {e}")));
        println!("{json}");
    } else {
        print!("{}", output::ranking_table(ranking, &names, progress.done));
    }
}

fn run_rate(args: RateArgs) {
    let ctx = Context::open(&args.common);
    let fresh = ctx.take_items(&args.items);

    let mut elo = ctx.config.elo();
    if let Some(k) = args.k_factor {
        elo.k_factor = k;
    }
    if args.items.restart && !fresh {
        SessionStore::<RatingSession>::replace(&ctx.store, LOCAL_HOLDER, RatingSession::new(elo));
    }

    let pool = ctx.store.item_ids();
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut prompt_out = io::stderr();
    let mut rng = rand::rng();

    let mut asked = 0;
    while args.rounds.map_or(true, |rounds| asked < rounds) {
        let (a, b) = next_rating_pair(&ctx.store, LOCAL_HOLDER, &pool, elo, &mut rng).unwrap_or_else(|e| bail(e));
        let header = format!("[verdict {}]", asked + 1);
        let answer = prompt::ask(&mut input, &mut prompt_out, &header, &ctx.store.name(a), &ctx.store.name(b))
            .unwrap_or_else(|e| bail(format!("Failed to read answer: {e}")));

        let (winner, loser) = match answer {
            Answer::First => (a, b),
            Answer::Second => (b, a),
            Answer::Quit => break,
        };
        let outcome = submit_rating(&ctx.store, LOCAL_HOLDER, winner, loser).unwrap_or_else(|e| bail(e));
        eprintln!(
            "  {} → {:.1}, {} → {:.1}",
            ctx.store.name(outcome.winner),
            outcome.winner_rating,
            ctx.store.name(outcome.loser),
            outcome.loser_rating,
        );
        ctx.save();
        asked += 1;
    }
    ctx.save();

    match leaderboard(&ctx.store, LOCAL_HOLDER) {
        Ok(board) => print_leaderboard(&ctx, &board),
        Err(_) => eprintln!("No verdicts recorded yet."),
    }
}

fn print_leaderboard(ctx: &Context, board: &[(ItemId, f64)]) {
    let ids: Vec<ItemId> = board.iter().map(|(id, _)| *id).collect();
    let names = ctx.store.resolve(&ids);
    if ctx.json {
        let json = output::leaderboard_json(board, &names)
            .unwrap_or_else(|e| bail(format!("Failed to encode leaderboard: {e}")));
        println!("{json}");
    } else {
        print!("{}", output::leaderboard_table(board, &names));
    }
}

fn run_status(args: CommonArgs) {
    let ctx = Context::open(&args);
    let sort = status::<MergeSortSession, _>(&ctx.store, LOCAL_HOLDER).ok();
    let tournament = status::<TournamentSession, _>(&ctx.store, LOCAL_HOLDER).ok();
    let ratings = leaderboard(&ctx.store, LOCAL_HOLDER).ok();

    if ctx.json {
        let json = serde_json::json!({
            "items": ctx.store.item_ids().len(),
            "sort": sort,
            "tournament": tournament,
            "rating": ratings.map(|board| board.len()),
        });
        println!("{json:#}");
        return;
    }

    println!("{} items in {}", ctx.store.item_ids().len(), ctx.store.path().display());
    let describe = |label: &str, progress: &Option<Progress>| match progress {
        Some(progress) => println!("{label}: {}", output::progress_line(progress)),
        None => println!("{label}: not started"),
    };
    describe("sort", &sort);
    describe("tournament", &tournament);
    match ratings {
        Some(board) => println!("rate: {} items rated", board.len()),
        None => println!("rate: not started"),
    }
}
