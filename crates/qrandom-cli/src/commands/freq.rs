use qrandom_core::{EntropySource, frequency_report};

use super::{CommandResult, SourceOptions, make_sampler};

/// Largest range printed as a full histogram.
const MAX_PRINTED_BINS: usize = 64;

pub fn run(
    opts: &SourceOptions,
    max: u64,
    count: usize,
    output_path: Option<&str>,
) -> CommandResult {
    let sampler = make_sampler(opts)?;
    println!(
        "Sampling {count} values below {max} from '{}'...\n",
        sampler.source().name()
    );
    let values = sampler.sample_ints(max, count)?;
    let report = frequency_report(&values, max)?;

    if report.counts.len() <= MAX_PRINTED_BINS {
        let peak = report.counts.iter().copied().max().unwrap_or(0).max(1);
        println!("  {:>6} {:>8}", "Value", "Count");
        println!("  {}", "-".repeat(56));
        for (value, &n) in report.counts.iter().enumerate() {
            let bar = "█".repeat((n * 40 / peak) as usize);
            println!("  {value:>6} {n:>8} {bar}");
        }
        println!();
    }

    println!("  Expected per value: {:.2}", report.expected);
    println!(
        "  Chi-square:         {:.3} ({} degrees of freedom)",
        report.chi_square, report.degrees_of_freedom
    );
    println!(
        "  p-value:            {:.4}  grade {}  {}",
        report.p_value,
        report.grade(),
        if report.passed { "PASS" } else { "FAIL" }
    );

    if let Some(path) = output_path {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
        println!("\nReport written to {path}");
    }
    Ok(())
}
