//! JSON report generation module.

use crate::{
    config::Config,
    results::{report::Generator, Results},
};
use anyhow::{Context, Result};
use log::debug;
use std::{fs::File, io::BufWriter};

/// JSON report generator.
#[derive(Debug, Default)]
pub struct Json;

impl Json {
    /// Creates a new JSON report generator.
    pub fn new() -> Self {
        Self
    }
}

impl Generator for Json {
    fn generate(&mut self, config: &Config, results: &Results) -> Result<()> {
        let path = config
            .results_folder()
            .join(results.report_name())
            .join("results.json");
        debug!("Writing the JSON report to {}", path.display());

        let mut f = BufWriter::new(
            File::create(&path)
                .with_context(|| format!("could not create `{}`", path.display()))?,
        );
        serde_json::to_writer_pretty(&mut f, results)?;

        Ok(())
    }
}
