use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tracksim", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate one sequence from an explicit scene, object and polygon.
    Sequence(SequenceArgs),
    /// Generate many sequences from a dataset directory, in parallel.
    Batch(BatchArgs),
}

#[derive(Args, Debug)]
struct SimArgs {
    /// Simulator options JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Trajectory model JSON.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Override the number of frames per sequence.
    #[arg(long)]
    max_steps: Option<usize>,

    /// Seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,

    /// Return scene views instead of modeling a moving camera.
    #[arg(long, default_value_t = false)]
    no_camera: bool,

    /// Outline the ground-truth box on every frame.
    #[arg(long, default_value_t = false)]
    draw_box: bool,
}

#[derive(Parser, Debug)]
struct SequenceArgs {
    /// Scene image.
    #[arg(long)]
    scene: PathBuf,

    /// Image the object is segmented from.
    #[arg(long)]
    object: PathBuf,

    /// Segmentation polygon as comma-separated `x0,y0,x1,y1,...`.
    #[arg(long, required = true, value_delimiter = ',', allow_hyphen_values = true)]
    polygon: Vec<f64>,

    /// Output directory for frames and ground truth.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    sim: SimArgs,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Dataset root holding the scene and object image directories.
    #[arg(long)]
    data_dir: PathBuf,

    /// Dataset summary JSON.
    #[arg(long)]
    summary: PathBuf,

    /// Scene directory relative to the dataset root.
    #[arg(long, default_value = tracksim::DEFAULT_IMAGE_DIR)]
    scene_dir: PathBuf,

    /// Object directory relative to the dataset root.
    #[arg(long, default_value = tracksim::DEFAULT_IMAGE_DIR)]
    object_dir: PathBuf,

    /// Number of sequences.
    #[arg(long, default_value_t = 1)]
    count: usize,

    /// Override rayon worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Output root; each sequence goes to `seq_NNNN` below it.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    sim: SimArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Sequence(args) => cmd_sequence(args),
        Command::Batch(args) => cmd_batch(args),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn sim_opts(args: &SimArgs) -> anyhow::Result<tracksim::SimulatorOpts> {
    let mut opts = match &args.config {
        Some(path) => tracksim::SimulatorOpts::from_path(path)?,
        None => tracksim::SimulatorOpts::default(),
    };
    if let Some(n) = args.max_steps {
        opts.max_steps = n;
    }
    if args.seed.is_some() {
        opts.seed = args.seed;
    }
    if args.no_camera {
        opts.camera = false;
    }
    if args.draw_box {
        opts.draw_box = true;
    }
    opts.validate()?;
    Ok(opts)
}

fn load_model(path: Option<&Path>) -> anyhow::Result<Option<Arc<tracksim::TrajectoryModel>>> {
    path.map(|p| -> anyhow::Result<_> { Ok(Arc::new(tracksim::TrajectoryModel::from_path(p)?)) })
        .transpose()
}

fn create_out_dir(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("create output dir '{}'", dir.display()))
}

fn cmd_sequence(args: SequenceArgs) -> anyhow::Result<()> {
    let opts = sim_opts(&args.sim)?;
    let mut sim = tracksim::Simulator::open(&args.scene, &args.object, args.polygon, opts)?;
    if let Some(model) = load_model(args.sim.model.as_deref())? {
        sim = sim.with_trajectory_model(model)?;
    }

    create_out_dir(&args.out)?;
    sim.start()?;
    let frames = sim.run_to_end(&args.out)?;
    eprintln!("wrote {frames} frames to {}", args.out.display());
    Ok(())
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let opts = sim_opts(&args.sim)?;
    let summary = tracksim::DatasetSummary::from_path(&args.summary)?;
    let mut factory = tracksim::SimulatorFactory::with_dirs(
        &args.data_dir,
        &args.scene_dir,
        &args.object_dir,
        summary,
        opts.seed,
    )?;
    if let Some(model) = load_model(args.sim.model.as_deref())? {
        factory = factory.with_trajectory_model(model);
    }

    create_out_dir(&args.out)?;
    let reports =
        tracksim::generate_batch(&mut factory, &opts, &args.out, args.count, args.threads)?;
    let frames: usize = reports.iter().map(|r| r.frames).sum();
    eprintln!(
        "wrote {} sequences ({frames} frames) to {}",
        reports.len(),
        args.out.display()
    );
    Ok(())
}
