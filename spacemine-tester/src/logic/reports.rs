use anyhow::Result;
use colored::Colorize;
use spacemine_core::numbers::{ratio, usize_to_u64};
use std::io::Write;
use std::time::Duration;

use super::ScenarioResult;

fn success_rate(results: &[ScenarioResult]) -> f64 {
    let passed = results.iter().filter(|r| r.passed).count();
    ratio(usize_to_u64(passed), usize_to_u64(results.len())) * 100.0
}

pub fn generate_console_report(
    out: &mut impl Write,
    results: &[ScenarioResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Asteroid Table Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "=================================".cyan())?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "Total runs: {total_tests}")?;
    writeln!(out, "Passed: {}", passed_tests.to_string().green())?;
    writeln!(out, "Failed: {}", failed_tests.to_string().red())?;
    writeln!(out, "Success rate: {:.1}%", success_rate(results))?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };

        writeln!(
            out,
            "{} {} (seed {})",
            status,
            result.scenario_name.bold(),
            result.seed
        )?;
        writeln!(
            out,
            "   Checks: {} over {} iterations",
            result.checks, result.iterations_run
        )?;
        writeln!(out, "   Time: {:?}", result.duration)?;

        for note in &result.notes {
            writeln!(out, "   {}", note.dimmed())?;
        }
        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }

    let fastest = results.iter().min_by_key(|r| r.duration);
    let slowest = results.iter().max_by_key(|r| r.duration);
    if let (Some(fastest), Some(slowest)) = (fastest, slowest) {
        writeln!(out, "{}", "⚡ Performance Summary".bright_yellow().bold())?;
        writeln!(out, "{}", "=====================".yellow())?;
        writeln!(
            out,
            "Fastest: {} ({:?})",
            fastest.scenario_name.green(),
            fastest.duration
        )?;
        writeln!(
            out,
            "Slowest: {} ({:?})",
            slowest.scenario_name.yellow(),
            slowest.duration
        )?;
    }
    Ok(())
}

pub fn generate_json_report(out: &mut impl Write, results: &[ScenarioResult]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(results)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut impl Write, results: &[ScenarioResult]) -> Result<()> {
    writeln!(out, "# Spacemine Asteroid Table Results\n")?;
    writeln!(
        out,
        "_Generated {}_\n",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total runs**: {total_tests}")?;
    writeln!(out, "- **Passed**: {passed_tests}")?;
    writeln!(out, "- **Failed**: {}", total_tests - passed_tests)?;
    writeln!(out, "- **Success rate**: {:.1}%\n", success_rate(results))?;

    writeln!(out, "## Detailed Results\n")?;
    for result in results {
        let status = if result.passed { "✅" } else { "❌" };
        writeln!(
            out,
            "### {} {} (seed {})\n",
            status, result.scenario_name, result.seed
        )?;
        writeln!(
            out,
            "- **Checks**: {} over {} iterations",
            result.checks, result.iterations_run
        )?;
        writeln!(out, "- **Time**: {:?}", result.duration)?;
        if !result.notes.is_empty() {
            writeln!(out, "- **Notes**:")?;
            for note in &result.notes {
                writeln!(out, "  - `{}`", note.trim_start())?;
            }
        }
        if !result.failures.is_empty() {
            writeln!(out, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results() -> Vec<ScenarioResult> {
        vec![
            ScenarioResult {
                scenario_name: "coverage".to_string(),
                seed: 1337,
                passed: true,
                iterations_run: 10,
                checks: 420,
                failures: Vec::new(),
                notes: vec!["module tier 1: 12 intervals".to_string()],
                duration: Duration::from_millis(3),
            },
            ScenarioResult {
                scenario_name: "distribution".to_string(),
                seed: 1337,
                passed: false,
                iterations_run: 10,
                checks: 3,
                failures: vec!["coalAsteroid (LV drone): observed 0.5".to_string()],
                notes: Vec::new(),
                duration: Duration::from_millis(9),
            },
        ]
    }

    #[test]
    fn json_report_round_trips() {
        let mut buffer = Vec::new();
        generate_json_report(&mut buffer, &results()).unwrap();
        let parsed: Vec<ScenarioResult> = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(!parsed[1].passed);
    }

    #[test]
    fn markdown_report_lists_failures() {
        let mut buffer = Vec::new();
        generate_markdown_report(&mut buffer, &results()).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("- **Success rate**: 50.0%"));
        assert!(text.contains("### ❌ distribution (seed 1337)"));
        assert!(text.contains("  - coalAsteroid (LV drone): observed 0.5"));
    }

    #[test]
    fn console_report_handles_no_results() {
        colored::control::set_override(false);
        let mut buffer = Vec::new();
        generate_console_report(&mut buffer, &[], Duration::ZERO).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("Success rate: 0.0%"));
        assert!(!text.contains("Performance Summary"));
    }
}
