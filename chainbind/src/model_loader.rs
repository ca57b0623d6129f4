use crate::errors::InFile;
use anyhow::Result;
use operand_binder::TypeUniverse;
use std::fs;
use std::path::Path;

pub fn load<P: AsRef<Path>>(types: P) -> Result<TypeUniverse> {
    let text = InFile::context(&types, |p| fs::read_to_string(p))?;
    let universe = InFile::context(&types, |_| TypeUniverse::from_json(&text))?;
    tracing::info!(
        types = universe.len(),
        path = %types.as_ref().display(),
        "Loaded type universe"
    );
    Ok(universe)
}
