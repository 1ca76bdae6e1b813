//! Final report on stdout.

use colored::Colorize;
use ipm_training::TrainingOutcome;

pub fn print(outcome: &TrainingOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    println!("{}", "IPM Training".bold().cyan());
    println!();
    println!("  {:>9}  {:>14}  {}", "iteration".dimmed(), "loss".dimmed(), "model".dimmed());

    let best_iteration = outcome.best.as_ref().map(|b| b.iteration);
    for (record, model) in outcome.history.records().iter().zip(&outcome.models) {
        let line = format!(
            "  {:>9}  {:>14.6}  {}",
            record.iteration,
            record.loss,
            model.path.display()
        );
        if Some(record.iteration) == best_iteration {
            println!("{}", line.green());
        } else {
            println!("{line}");
        }
    }
    println!();

    match &outcome.best {
        Some(best) => println!(
            "{} {} (iteration {}, loss {})",
            "Best model:".bold().green(),
            best.model.display(),
            best.iteration,
            best.loss
        ),
        None => println!("{}", "No iterations were run.".yellow()),
    }
    Ok(())
}
