mod args;
mod chain_loader;
mod errors;
mod model_loader;
mod runner;
mod showcase;

use anyhow::Result;
use chain_loader::ExprRecord;
use runner::Binding;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tree_buf::prelude::*;

const CHUNK_SIZE_HINT: usize = 262144 * 4;

/// Binds operand chains against a type universe. This can...
/// * Bind expressions given on the command line and print their trees
/// * Load multiple expression logs in treebuf and/or jsonl format
/// * Bind every logged expression and report on types and failures
/// * Sample logs
/// * Save logs in the treebuf format
/// For usage details, see the command-line help
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "chainbind=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = args::load();
    args.check()?;

    if let Some(types) = &args.types {
        let universe = model_loader::load(types)?;
        let binding = Binding::new(&universe, args.max_operands)
            .shared_cache(args.shared_cache)
            .normalize(!args.no_normalize);

        for source in &args.exprs {
            print_one(&binding, source, args.outline);
        }
        if !args.load_log.is_empty() {
            bind_logs(&binding, &args.load_log, args.sample)?;
        }
    }

    if let Some(save_log) = &args.save_log {
        save(save_log, &args.load_log, args.sample)?;
    }

    Ok(())
}

fn print_one(binding: &Binding, source: &str, outline: bool) {
    let universe = binding.universe();
    match binding.bind(source) {
        Ok(expr) => {
            println!("{} => {} : {}", source, &expr, universe.name(expr.ty()));
            if outline {
                print!("{}", expr.outline(universe));
            }
        }
        Err(failure) => println!("{} => {}", source, failure),
    }
}

fn bind_logs(binding: &Binding, logs: &[String], sample: f64) -> Result<()> {
    let mut result = runner::BindSummary::default();
    for chunk in chain_loader::load_all_chunks::<ExprRecord>(logs, sample) {
        let update = runner::bind_many(binding, chunk?);
        result = result.merge(update);
    }

    println!("{}", &result);
    Ok(())
}

fn save(path: &str, logs: &[String], sample: f64) -> Result<()> {
    use std::{fs::File, io::Write};
    let mut out_chunk = Vec::new();
    let mut out_file = errors::InFile::context(path, |p| File::create(p))?;

    let mut flush = move |data: &mut Vec<ExprRecord>| -> Result<()> {
        // Makes the file smaller
        data.sort_unstable();
        let bin = encode(data);
        let size = (bin.len() as u64).to_le_bytes();
        out_file.write_all(&size)?;
        out_file.write_all(&bin)?;
        Ok(())
    };

    for chunk in chain_loader::load_all_chunks::<ExprRecord>(logs, sample) {
        let mut chunk = chunk?;
        if chunk.len() >= CHUNK_SIZE_HINT {
            flush(&mut chunk)?;
        } else {
            out_chunk.extend(chunk);
            if out_chunk.len() >= CHUNK_SIZE_HINT {
                flush(&mut out_chunk)?;
                out_chunk.clear();
            }
        }
    }
    if !out_chunk.is_empty() {
        flush(&mut out_chunk)?;
    }
    tracing::info!(path = %path, "Saved expression log");
    Ok(())
}
