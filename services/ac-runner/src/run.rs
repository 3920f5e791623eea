use anyhow::{Context, Result};
use attrcalc::{
    compute_batch, read_batch_file, AttributeCalculator, ComputationDriver, ResultReporter,
    StdoutProgress,
};
use docbin::Vocab;
use tracing::{info, warn};

use crate::builtin::BuiltinCalculator;
use crate::config::{PluginSpec, RunnerConfig};
use crate::plugin_process::ProcessCalculator;

pub fn build_calculator(cfg: &RunnerConfig) -> Result<Box<dyn AttributeCalculator + Send>> {
    match &cfg.plugin {
        PluginSpec::Builtin { kind, field } => {
            if kind.natural_type() != cfg.check.data_type() {
                warn!(
                    calculator = ?kind,
                    natural = %kind.natural_type(),
                    declared = %cfg.check.data_type(),
                    "calculator output may not fit the declared data type"
                );
            }
            Ok(Box::new(BuiltinCalculator::new(*kind, field.clone())))
        }
        PluginSpec::Process { program, args } => Ok(Box::new(ProcessCalculator::spawn(program, args)?)),
    }
}

/// Read, decode and compute the whole batch, then report it. Nothing is
/// reported unless every record passed. Returns the number of values sent.
pub async fn execute(
    cfg: &RunnerConfig,
    calculator: Box<dyn AttributeCalculator + Send>,
    reporter: &dyn ResultReporter,
) -> Result<usize> {
    info!("Preparing data for attribute calculation.");
    let vocab = Vocab::blank(&cfg.lang)
        .with_context(|| format!("cannot build vocabulary for {:?}", cfg.lang))?;

    let input = cfg.input.clone();
    let check = cfg.check;
    let every = cfg.progress_every;

    // The calculator is blocking and not reentrant: keep the whole batch on
    // one blocking thread.
    let results = tokio::task::spawn_blocking(move || -> Result<_> {
        let batch = read_batch_file(&input)
            .with_context(|| format!("failed to read batch file {}", input.display()))?;

        let mut calculator = calculator;
        let mut driver = ComputationDriver::new(calculator.as_mut(), check).with_progress_every(every);
        Ok(compute_batch(batch, &vocab, &mut driver, &mut StdoutProgress)?)
    })
    .await
    .context("attribute calculation task failed")??;

    info!("Finished execution.");
    reporter.report(&results).await?;
    Ok(results.len())
}
