//! CLI argument parsing for the packaging workflow.
//!
//! The CLI only collects paths and flags and hands them to `config` for
//! validation; the pipeline never sees raw arguments.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "iotapack",
    version,
    about = "Assemble problem packages for the judging platform",
    after_help = "Examples:\n  iotapack pack abc sol.py py tests/ doc.pdf -o -z\n  iotapack pack abc sol.cpp cpp gen.cpp statement.html -k chk.cpp -z -f\n  iotapack build --manifest abc/package.json --json\n  iotapack unpack abc.zip --dest /tmp/abc-check",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Emit debug-level trace lines
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Pack(PackArgs),
    Build(BuildArgs),
    Unpack(UnpackArgs),
}

/// Package assembly from positional sources.
#[derive(Parser, Debug)]
#[command(about = "Assemble a problem package from source artifacts")]
pub struct PackArgs {
    /// Problem identifier, used as directory name and file-name prefix
    pub name: String,

    /// Model solution source
    pub model: PathBuf,

    /// Model solution language tag (py or cpp; cpp needs a compiled binary next to the source)
    pub lang: String,

    /// Directory with .in files, or a generator program
    pub inputs: PathBuf,

    /// Problem statement document (.pdf, .html or an HTML .zip)
    pub doc: PathBuf,

    /// The .yml config file
    #[arg(short = 'c', long = "cfg", value_name = "PATH")]
    pub cfg: Option<PathBuf>,

    /// Additional solution (repeatable)
    #[arg(short = 'a', long = "addsol", value_name = "PATH")]
    pub addsol: Vec<PathBuf>,

    /// Statement source to embed (e.g. a .tex file)
    #[arg(short = 's', long = "pdfsrc", value_name = "PATH")]
    pub pdfsrc: Option<PathBuf>,

    /// Checker program
    #[arg(short = 'k', long = "checker", value_name = "PATH")]
    pub checker: Option<PathBuf>,

    #[command(flatten)]
    pub run: RunFlags,
}

/// Package assembly from a JSON manifest.
#[derive(Parser, Debug)]
#[command(about = "Assemble a problem package described by a JSON manifest")]
pub struct BuildArgs {
    /// Manifest path; relative sources resolve against its directory
    #[arg(long, value_name = "PATH")]
    pub manifest: PathBuf,

    #[command(flatten)]
    pub run: RunFlags,
}

/// Flags shared by `pack` and `build`.
#[derive(Args, Debug, Clone, Default)]
pub struct RunFlags {
    /// Generate outputs by running the model solution on every input
    #[arg(short = 'o', long)]
    pub outputs: bool,

    /// Create `<name>.zip` once packing is done
    #[arg(short = 'z', long)]
    pub zip: bool,

    /// Remove the package directory after zipping
    #[arg(short = 'f', long = "fullcleanup", requires = "zip")]
    pub full_cleanup: bool,

    /// Rewrite CRLF to LF in inputs and outputs (default on Windows only)
    #[arg(long)]
    pub normalize_line_endings: bool,

    /// Directory the package is built in (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub base: Option<PathBuf>,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Archive extraction.
#[derive(Parser, Debug)]
#[command(about = "Extract a package archive")]
pub struct UnpackArgs {
    /// Archive to extract
    pub archive: PathBuf,

    /// Destination directory (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub dest: Option<PathBuf>,
}
