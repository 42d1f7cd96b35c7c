//! Name-recovery CLI.
//!
//! Provides the `namerec` binary: `train` fits weights on a corpus and stores
//! them, `infer` predicts names for new programs with a stored model,
//! `evaluate` reports accuracy over a labelled corpus, and `list` shows the
//! stored models. Results go to stdout as JSON; logs go to stderr.
//!
//! Exit codes: 0 = success, 1 = learning error, 2 = ingestion error,
//! 3 = I/O or storage error.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use namerec_core::{Corpus, IngestError};
use namerec_learn::{
    correct, AcceptPolicy, Bounds, HammingLoss, InferenceConfig, InferenceEngine, LearnError,
    Model, StepSchedule, Trainer, TrainerConfig, ZeroLoss,
};
use namerec_storage::{ModelId, ModelSnapshot, ModelStore, SqliteStore, StorageError};

/// Variable-name recovery via structured prediction.
#[derive(Parser)]
#[command(name = "namerec", about = "Recover variable names from naming graphs")]
struct Cli {
    /// Log at DEBUG instead of INFO.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model on a corpus and store it.
    Train {
        /// A `.json` program or a directory of them.
        #[arg(short, long)]
        corpus: PathBuf,

        /// Path to the model database file.
        #[arg(long, env = "NAMEREC_DB_PATH")]
        db: String,

        /// Name to store the model under.
        #[arg(short, long)]
        name: String,

        #[arg(long, default_value_t = 30)]
        iterations: usize,

        /// Step-size constant `c`.
        #[arg(long, default_value_t = 0.03)]
        step: f64,

        #[arg(long, value_enum, default_value_t = Schedule::Harmonic)]
        schedule: Schedule,

        /// Regularizer coefficient of the reported loss.
        #[arg(long, default_value_t = 0.5)]
        lambda: f64,

        #[arg(long, default_value_t = 0.0)]
        lower_bound: f64,

        #[arg(long, default_value_t = 0.5)]
        upper_bound: f64,

        /// Starting weight of every feature not taken from `--from-model`.
        #[arg(long, default_value_t = 0.15)]
        initial_weight: f64,

        /// Continue from the weights of a model stored in `--db`.
        #[arg(long)]
        from_model: Option<i64>,

        #[command(flatten)]
        inference: InferenceArgs,

        /// Compute per-program subgradients on all cores.
        #[arg(long)]
        parallel: bool,
    },

    /// Predict names for one program or a directory of programs.
    Infer {
        #[arg(long, env = "NAMEREC_DB_PATH")]
        db: String,

        /// Stored model ID.
        #[arg(short, long)]
        model: i64,

        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        inference: InferenceArgs,
    },

    /// Report name accuracy over a labelled corpus.
    ///
    /// Without `--model` the corpus's own features are used at the initial
    /// training weight, which shows what training starts from.
    Evaluate {
        #[arg(short, long)]
        corpus: PathBuf,

        #[arg(long, env = "NAMEREC_DB_PATH")]
        db: Option<String>,

        #[arg(short, long, requires = "db")]
        model: Option<i64>,

        #[command(flatten)]
        inference: InferenceArgs,
    },

    /// List stored models.
    List {
        #[arg(long, env = "NAMEREC_DB_PATH")]
        db: String,
    },
}

#[derive(Args, Clone, Copy)]
struct InferenceArgs {
    /// Greedy passes over the nodes.
    #[arg(long, default_value_t = 20)]
    sweeps: usize,

    /// Candidates tried per incident edge.
    #[arg(long, default_value_t = 8)]
    top_candidates: usize,

    #[arg(long, value_enum, default_value_t = Accept::Strict)]
    accept: Accept,
}

impl From<InferenceArgs> for InferenceConfig {
    fn from(args: InferenceArgs) -> Self {
        InferenceConfig {
            sweeps: args.sweeps,
            top_candidates: args.top_candidates,
            accept: match args.accept {
                Accept::Strict => AcceptPolicy::StrictImprovement,
                Accept::NotWorse => AcceptPolicy::NotWorse,
            },
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum Schedule {
    /// c / t
    Harmonic,
    /// c / sqrt(t)
    Sqrt,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum Accept {
    Strict,
    NotWorse,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("learning error: {0}")]
    Learn(#[from] LearnError),

    #[error("ingestion error: {0}")]
    Ingest(#[from] IngestError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Learn(_) => 1,
            CliError::Ingest(IngestError::Io { .. }) => 3,
            CliError::Ingest(_) => 2,
            CliError::Storage(_) => 3,
        }
    }
}

#[derive(Debug, Serialize)]
struct TrainReport {
    model: ModelId,
    name: String,
    programs: usize,
    features: usize,
    loss: f64,
    iteration: usize,
    losses: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct Prediction {
    file: String,
    predicted: Vec<String>,
    correct: usize,
    total: usize,
    accuracy: f64,
}

#[derive(Debug, Serialize)]
struct InferReport {
    model: ModelId,
    programs: Vec<Prediction>,
    correct: usize,
    total: usize,
    accuracy: f64,
}

#[derive(Debug, Serialize)]
struct EvaluateReport {
    model: Option<ModelId>,
    programs: usize,
    correct: usize,
    total: usize,
    accuracy: f64,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let output = match cli.command {
        Commands::Train {
            corpus,
            db,
            name,
            iterations,
            step,
            schedule,
            lambda,
            lower_bound,
            upper_bound,
            initial_weight,
            from_model,
            inference,
            parallel,
        } => Bounds::new(lower_bound, upper_bound)
            .map_err(CliError::from)
            .and_then(|bounds| {
                let config = TrainerConfig {
                    iterations,
                    bounds,
                    initial_weight,
                    lambda,
                    inference: inference.into(),
                    parallel,
                };
                let schedule = step_schedule(schedule, step);
                let from = from_model.map(ModelId);
                run_train(&corpus, &db, &name, from, config, schedule)
            })
            .map(|report| to_json(&report)),
        Commands::Infer {
            db,
            model,
            input,
            inference,
        } => run_infer(&db, ModelId(model), &input, inference.into())
            .map(|report| to_json(&report)),
        Commands::Evaluate {
            corpus,
            db,
            model,
            inference,
        } => {
            let stored = db.zip(model.map(ModelId));
            run_evaluate(&corpus, stored, inference.into()).map(|report| to_json(&report))
        }
        Commands::List { db } => run_list(&db),
    };

    match output {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn step_schedule(schedule: Schedule, c: f64) -> StepSchedule {
    match schedule {
        Schedule::Harmonic => StepSchedule::Harmonic { c },
        Schedule::Sqrt => StepSchedule::InverseSqrt { c },
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize result: {}\"}}", e))
}

fn ratio(correct: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64
    }
}

fn open_store(db_path: &str) -> Result<SqliteStore, CliError> {
    tracing::debug!(db = db_path, "opening model database");
    Ok(SqliteStore::new(db_path)?)
}

fn load_model(db_path: &str, id: ModelId) -> Result<Model, CliError> {
    let store = open_store(db_path)?;
    let (features, weights) = store.load_model(id)?.into_parts();
    Ok(Model::with_weights(features, weights)?)
}

/// Loads a stored model and extends it with the corpus's unseen feature keys
/// at `initial_weight`. Stored features keep their ids and weights.
fn warm_start(
    store: &SqliteStore,
    id: ModelId,
    corpus: &Corpus,
    initial_weight: f64,
) -> Result<Model, CliError> {
    let (mut features, mut weights) = store.load_model(id)?.into_parts();
    let stored = features.len();
    for program in &corpus.programs {
        features.register_program(program);
    }
    weights.resize(features.len(), initial_weight);
    tracing::info!(
        model = %id,
        stored,
        added = features.len() - stored,
        "continuing from stored model"
    );
    Ok(Model::with_weights(features, weights)?)
}

fn run_train(
    corpus_path: &Path,
    db_path: &str,
    name: &str,
    from: Option<ModelId>,
    config: TrainerConfig,
    schedule: StepSchedule,
) -> Result<TrainReport, CliError> {
    let corpus = Corpus::load(corpus_path)?;
    let mut store = open_store(db_path)?;

    let mut trainer = match from {
        Some(id) => Trainer::from_model(
            warm_start(&store, id, &corpus, config.initial_weight)?,
            config,
        ),
        None => Trainer::new(corpus.features.clone(), config),
    };
    let outcome = trainer.train(&corpus.programs, schedule.steps(), &HammingLoss)?;

    let (features, weights) = trainer.into_model().into_parts();
    let feature_count = features.len();
    let snapshot = ModelSnapshot::new(features, weights)?;
    let id = store.save_model(name, &snapshot)?;
    tracing::info!(model = %id, name, loss = outcome.loss, "model stored");

    Ok(TrainReport {
        model: id,
        name: name.to_string(),
        programs: corpus.len(),
        features: feature_count,
        loss: outcome.loss,
        iteration: outcome.iteration,
        losses: outcome.losses,
    })
}

fn run_infer(
    db_path: &str,
    id: ModelId,
    input: &Path,
    config: InferenceConfig,
) -> Result<InferReport, CliError> {
    let model = load_model(db_path, id)?;
    let corpus = Corpus::load(input)?;
    let engine = InferenceEngine::new(&model, config);

    let mut programs = Vec::with_capacity(corpus.len());
    for (program, source) in corpus.programs.iter().zip(&corpus.sources) {
        let predicted = engine.infer(program, &ZeroLoss);
        let hits = correct(program.truth(), predicted.labels());
        programs.push(Prediction {
            file: source.display().to_string(),
            predicted: predicted.labels().iter().map(ToString::to_string).collect(),
            correct: hits,
            total: program.node_count(),
            accuracy: ratio(hits, program.node_count()),
        });
    }

    let hits = programs.iter().map(|p| p.correct).sum();
    let total = programs.iter().map(|p| p.total).sum();
    Ok(InferReport {
        model: id,
        programs,
        correct: hits,
        total,
        accuracy: ratio(hits, total),
    })
}

fn run_evaluate(
    corpus_path: &Path,
    stored: Option<(String, ModelId)>,
    config: InferenceConfig,
) -> Result<EvaluateReport, CliError> {
    let corpus = Corpus::load(corpus_path)?;
    let model = match &stored {
        Some((db_path, id)) => load_model(db_path, *id)?,
        None => {
            tracing::info!("no model given; evaluating initial weights");
            Model::uniform(
                corpus.features.clone(),
                TrainerConfig::default().initial_weight,
            )
        }
    };

    let engine = InferenceEngine::new(&model, config);
    let mut hits = 0;
    let mut total = 0;
    for program in &corpus.programs {
        let predicted = engine.infer(program, &ZeroLoss);
        hits += correct(program.truth(), predicted.labels());
        total += program.node_count();
    }

    Ok(EvaluateReport {
        model: stored.map(|(_, id)| id),
        programs: corpus.len(),
        correct: hits,
        total,
        accuracy: ratio(hits, total),
    })
}

fn run_list(db_path: &str) -> Result<String, CliError> {
    let store = open_store(db_path)?;
    Ok(to_json(&store.list_models()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn train_defaults_match_trainer_defaults() {
        let cli = Cli::try_parse_from([
            "namerec", "train", "--corpus", "c", "--db", "m.db", "--name", "n",
        ])
        .unwrap();
        let Commands::Train {
            iterations,
            step,
            schedule,
            lambda,
            lower_bound,
            upper_bound,
            initial_weight,
            inference,
            parallel,
            ..
        } = cli.command
        else {
            panic!("expected train");
        };
        let defaults = TrainerConfig::default();
        assert_eq!(iterations, defaults.iterations);
        assert_eq!(lambda, defaults.lambda);
        assert_eq!(initial_weight, defaults.initial_weight);
        assert_eq!(
            Bounds::new(lower_bound, upper_bound).unwrap(),
            defaults.bounds
        );
        assert_eq!(InferenceConfig::from(inference), defaults.inference);
        assert_eq!(step_schedule(schedule, step), StepSchedule::default());
        assert!(!parallel);
    }

    #[test]
    fn value_enums_parse() {
        let cli = Cli::try_parse_from([
            "namerec", "-v", "infer", "--db", "m.db", "--model", "3", "--input", "p.json",
            "--accept", "not-worse",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Commands::Infer {
            model, inference, ..
        } = cli.command
        else {
            panic!("expected infer");
        };
        assert_eq!(model, 3);
        assert_eq!(
            InferenceConfig::from(inference).accept,
            AcceptPolicy::NotWorse
        );
        assert_eq!(
            step_schedule(Schedule::Sqrt, 1.0),
            StepSchedule::InverseSqrt { c: 1.0 }
        );
    }

    #[test]
    fn evaluate_model_requires_db() {
        let result = Cli::try_parse_from(["namerec", "evaluate", "--corpus", "c", "--model", "1"]);
        if std::env::var_os("NAMEREC_DB_PATH").is_none() {
            assert!(result.is_err());
        }
    }

    #[test]
    fn exit_codes() {
        assert_eq!(CliError::from(LearnError::EmptyCorpus).exit_code(), 1);
        assert_eq!(CliError::from(IngestError::MissingNodes).exit_code(), 2);
        let io = IngestError::Io {
            path: PathBuf::from("x"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(CliError::from(io).exit_code(), 3);
        assert_eq!(CliError::from(StorageError::ModelNotFound(1)).exit_code(), 3);
    }

    #[test]
    fn ratio_handles_empty() {
        assert_eq!(ratio(0, 0), 0.0);
        assert_eq!(ratio(1, 4), 0.25);
    }

    const PROGRAM: &str = r#"{
        "y_names": ["0ᐧa", "0ᐧb"],
        "e0": {"type": "var-lit", "xName": "a", "xScopeId": 0, "yName": "document", "sequence": "arg"},
        "e1": {"type": "var-var", "xName": "a", "xScopeId": 0, "yName": "b", "yScopeId": 0, "sequence": "call"}
    }"#;

    #[test]
    fn train_infer_and_list_through_one_database() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("corpus");
        std::fs::create_dir(&corpus).unwrap();
        std::fs::write(corpus.join("p.json"), PROGRAM).unwrap();
        let db = dir.path().join("models.db");
        let db = db.to_str().unwrap();

        let config = TrainerConfig {
            parallel: false,
            ..TrainerConfig::default()
        };
        let trained =
            run_train(&corpus, db, "demo", None, config, StepSchedule::default()).unwrap();
        assert_eq!(trained.programs, 1);
        assert_eq!(trained.features, 2);
        assert_eq!(trained.losses.len(), 31);

        let inferred =
            run_infer(db, trained.model, &corpus, InferenceConfig::default()).unwrap();
        assert_eq!(inferred.programs[0].predicted, vec!["0ᐧa", "0ᐧb"]);
        assert_eq!(inferred.accuracy, 1.0);

        let evaluated = run_evaluate(
            &corpus,
            Some((db.to_string(), trained.model)),
            InferenceConfig::default(),
        )
        .unwrap();
        assert_eq!(evaluated.correct, 2);

        let listed = run_list(db).unwrap();
        assert!(listed.contains("\"demo\""));
    }

    const OTHER: &str = r#"{
        "y_names": ["0ᐧq"],
        "e0": {"type": "var-lit", "xName": "q", "xScopeId": 0, "yName": "window", "sequence": "ret"}
    }"#;

    #[test]
    fn warm_start_keeps_stored_weights_and_appends_new_keys() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("corpus");
        std::fs::create_dir(&corpus).unwrap();
        std::fs::write(corpus.join("p.json"), PROGRAM).unwrap();
        let db = dir.path().join("models.db");
        let db = db.to_str().unwrap();

        let config = TrainerConfig {
            parallel: false,
            ..TrainerConfig::default()
        };
        let first =
            run_train(&corpus, db, "first", None, config, StepSchedule::default()).unwrap();
        let stored = load_model(db, first.model).unwrap();

        // Same corpus: the first evaluation sees exactly the stored weights.
        let resumed = run_train(
            &corpus,
            db,
            "resumed",
            Some(first.model),
            config,
            StepSchedule::default(),
        )
        .unwrap();
        assert_eq!(resumed.features, 2);
        assert_eq!(resumed.losses[0], first.loss);

        std::fs::write(corpus.join("q.json"), OTHER).unwrap();
        let grown = Corpus::load(&corpus).unwrap();
        let store = open_store(db).unwrap();
        let model = warm_start(&store, first.model, &grown, 0.25).unwrap();
        assert_eq!(model.features().len(), 3);
        assert_eq!(&model.weights()[..2], stored.weights());
        assert_eq!(model.weights()[2], 0.25);
    }

    #[test]
    fn unknown_warm_start_model_fails_before_training() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("p.json");
        std::fs::write(&file, PROGRAM).unwrap();
        let db = dir.path().join("models.db");
        let err = run_train(
            &file,
            db.to_str().unwrap(),
            "n",
            Some(ModelId(9)),
            TrainerConfig::default(),
            StepSchedule::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Storage(StorageError::ModelNotFound(9))));
    }

    #[test]
    fn missing_model_is_a_storage_failure() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("models.db");
        let err = load_model(db.to_str().unwrap(), ModelId(7)).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn malformed_corpus_is_an_ingestion_failure() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bad.json");
        std::fs::write(&file, r#"{"e0": {}}"#).unwrap();
        let err = run_evaluate(&file, None, InferenceConfig::default()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
