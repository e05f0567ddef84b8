use std::error::Error;
use std::fs;
use std::path::Path;

use serde::Serialize;

pub mod clean;
pub mod enumerate;
pub mod factorize;

pub(crate) fn write_json<P: AsRef<Path>, T: Serialize>(
    path: P,
    value: &T,
) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    let json = nloc_algebra::to_canonical_json_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}
