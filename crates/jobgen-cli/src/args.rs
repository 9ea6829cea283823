use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "jobgen", version, about = "Generate PBS/SLURM submission scripts")]
pub struct Cli {
    /// Emit JSON output on stdout.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Render a submission script from the job configuration.
    Generate {
        /// Machine name as declared under `machine:` (e.g. XC50, EGEON).
        #[arg(long)]
        machine: String,

        /// Scheduler dialect: PBS or SLURM.
        #[arg(long)]
        scheduler: String,

        /// Maximum number of cores per node (defaults to the machine profile).
        #[arg(long)]
        max_cores_per_node: Option<i64>,

        /// Total number of MPI tasks.
        #[arg(long)]
        mpi_tasks: i64,

        /// Threads per MPI task.
        #[arg(long)]
        threads_per_mpi_task: Option<i64>,

        /// Job configuration file.
        #[arg(long, default_value = "config.yml")]
        config: String,

        /// Directive catalog file (default: built-in catalog).
        #[arg(long)]
        catalog: Option<String>,

        /// Directive override, highest precedence. Repeatable.
        #[arg(long = "set", value_name = "NAME=VALUE")]
        overrides: Vec<String>,

        /// Output file (default: <SCHEDULER>_submission_script.sh).
        #[arg(long)]
        out: Option<String>,

        /// Print the script on stdout instead of writing a file.
        #[arg(long, conflicts_with = "out")]
        stdout: bool,

        /// Freeze the clock used for redirect date masks (YYYY-MM-DD[THH:MM:SS]).
        #[arg(long)]
        now: Option<String>,
    },

    /// Show the parallel decomposition for a resource shape.
    Plan {
        #[arg(long)]
        max_cores_per_node: i64,
        #[arg(long)]
        mpi_tasks: i64,
        #[arg(long)]
        threads_per_mpi_task: Option<i64>,
        /// Used to derive threads when --threads-per-mpi-task is omitted.
        #[arg(long)]
        tasks_per_node_hint: Option<i64>,
    },

    /// List the directive catalog.
    Directives {
        #[arg(long)]
        catalog: Option<String>,
        /// Only show directives with a token for this dialect.
        #[arg(long)]
        scheduler: Option<String>,
    },
}
