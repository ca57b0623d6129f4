use anyhow::{bail, Result};
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "chainbind")]
pub struct Args {
    /// Type universe (JSON) deciding which operands react.
    #[structopt(long, short)]
    pub types: Option<String>,

    /// Expressions to bind, eg: "5 mi:Length / hr:Time"
    pub exprs: Vec<String>,

    /// Load expression log file(s). Supports jsonl, gzip'd jsonl and tree-buf.
    #[structopt(short, long)]
    pub load_log: Vec<String>,

    /// Save the expression log file. Only tree-buf is supported.
    #[structopt(long)]
    pub save_log: Option<String>,

    /// Take a sample of the expression log. Unit interval.
    #[structopt(long, default_value = "1.0")]
    pub sample: f64,

    /// Chains with more operands than this are rejected without a search.
    #[structopt(long, default_value = "24")]
    pub max_operands: usize,

    /// Share pure binder lookups across every expression.
    #[structopt(long, requires("types"))]
    pub shared_cache: bool,

    /// Keep implicit products as the search grouped them.
    #[structopt(long, requires("types"))]
    pub no_normalize: bool,

    /// Print an outline of each tree bound from the command line.
    #[structopt(long, requires("types"))]
    pub outline: bool,
}

impl Args {
    /// Rejects combinations that would exit without doing anything.
    pub fn check(&self) -> Result<()> {
        if self.types.is_none() {
            if !self.exprs.is_empty() {
                bail!("Binding expressions requires a type universe. Pass one with --types")
            }
            if !self.load_log.is_empty() && self.save_log.is_none() {
                bail!("Loaded logs need --types to bind them or --save-log to save them")
            }
        }
        Ok(())
    }
}

pub fn load() -> Args {
    Args::from_args()
}
