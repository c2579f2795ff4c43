use std::fs::{File, create_dir_all};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use merkle_tree::{Blake3, Digest, Hasher, MerkleProof, MerkleTree, Sha256, workload};
use rand::seq::SliceRandom;
use tracing::{Level, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod stat;

#[derive(Parser)]
#[command(name = "merkle-tree")]
#[command(author, version, about = "Build merkle roots and create or check membership proofs")]
struct Args {
  /// Digest function for leaves and branches
  #[arg(long, value_enum, default_value_t = HashKind::Sha256, global = true)]
  hasher: HashKind,

  /// Log level written to stderr
  #[arg(long, default_value = "warn", global = true)]
  log_level: Level,

  #[command(subcommand)]
  command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum HashKind {
  Sha256,
  Blake3,
}

#[derive(Subcommand)]
enum Command {
  /// Print the root digest of the leaves
  Root {
    #[arg(required = true)]
    leaves: Vec<String>,
  },

  /// Print the audit path of one leaf, optionally saving the encoded proof
  Proof {
    /// 0-based index of the leaf to prove
    #[arg(short, long)]
    index: usize,

    /// File to write the encoded proof to
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(required = true)]
    leaves: Vec<String>,
  },

  /// Check an encoded proof against a root digest
  Verify {
    /// Expected root digest in hex
    #[arg(short, long)]
    root: String,

    /// File holding the encoded proof
    #[arg(short, long)]
    proof: PathBuf,
  },

  /// Measure root construction and proof times relative to the number of leaves
  Bench {
    #[arg(default_value_t = 1024u64)]
    data_size: u64,

    /// Number of leaf counts sampled up to `data_size`
    #[arg(short, long, default_value_t = 16u64)]
    division: u64,

    /// Trials per leaf count
    #[arg(short, long, default_value_t = 10usize)]
    trials: usize,

    /// Output directory for the CSV reports
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    #[arg(short, long, default_value_t = Local::now().format("%Y%m%d%H%M%S").to_string())]
    session: String,
  },
}

fn main() -> Result<ExitCode> {
  let args = Args::parse();

  tracing_subscriber::registry()
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(true))
    .with(tracing_subscriber::filter::LevelFilter::from_level(args.log_level))
    .init();

  match args.hasher {
    HashKind::Sha256 => run::<Sha256>(args.command),
    HashKind::Blake3 => run::<Blake3>(args.command),
  }
}

fn run<H: Hasher>(command: Command) -> Result<ExitCode> {
  match command {
    Command::Root { leaves } => {
      let root = MerkleTree::<H>::root(&leaves)?;
      println!("{}", root.value());
    }
    Command::Proof { index, output, leaves } => {
      let proof = MerkleTree::<H>::proof(&leaves, index)?;
      for (side, value) in proof.audit_path() {
        println!("{} {value}", if side.is_left() { "L" } else { "R" });
      }
      if let Some(path) = output {
        let file = File::create(&path).with_context(|| format!("cannot create {}", path.display()))?;
        let mut w = BufWriter::new(file);
        let size = proof.write(&mut w)?;
        w.flush()?;
        info!(path = %path.display(), size, "proof written");
      }
    }
    Command::Verify { root, proof } => {
      let root = Digest::from_hex(&root)?;
      let file = File::open(&proof).with_context(|| format!("cannot open {}", proof.display()))?;
      let proof = MerkleProof::read(&mut BufReader::new(file))?;
      let verified = MerkleTree::<H>::compute_root(&proof) == root;
      println!("{verified}");
      if !verified {
        return Ok(ExitCode::FAILURE);
      }
    }
    Command::Bench { data_size, division, trials, output, session } => {
      bench::<H>(data_size, division, trials, &output, &session)?;
    }
  }
  Ok(ExitCode::SUCCESS)
}

fn bench<H: Hasher>(data_size: u64, division: u64, trials: usize, dir: &Path, session: &str) -> Result<()> {
  if division == 0 || trials == 0 {
    bail!("division and trials must be positive");
  }
  create_dir_all(dir)?;
  println!("Working directory: {:?}", dir);
  println!("[{}::root+proof]", H::NAME);

  let mut roots = stat::Report::new();
  let mut proofs = stat::Report::new();
  let mut rng = rand::rng();
  let step = (data_size / division).max(1);
  for n in (step..=data_size).step_by(step as usize) {
    let leaves = workload(n);
    let mut indices = (0..leaves.len()).collect::<Vec<_>>();
    indices.shuffle(&mut rng);

    for trial in 0..trials {
      let t0 = Instant::now();
      let root = MerkleTree::<H>::root(&leaves)?;
      roots.add(n, t0.elapsed());

      let index = indices[trial % indices.len()];
      let t0 = Instant::now();
      let proof = MerkleTree::<H>::proof(&leaves, index)?;
      let verified = MerkleTree::<H>::verify(&root, &proof);
      proofs.add(n, t0.elapsed());
      if !verified {
        bail!("proof for leaf {index} of {n} was rejected");
      }
    }
    if let (Some(root), Some(proof)) = (roots.stat(n), proofs.stat(n)) {
      println!("  n={n}: root {root}; proof {proof}");
    }
  }

  // write report
  for (name, report) in [("root", &roots), ("proof", &proofs)] {
    let path = dir.join(format!("{session}-{}-{name}.csv", H::NAME));
    report.save_to_csv(&path)?;
    println!("==> {}", path.to_string_lossy());
  }
  Ok(())
}
