//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code in the core, proxy and TUI MUST NOT call sleep methods.
//! Waiting happens on I/O, channels and `tokio::time::interval`, never on a timer
//! guess. Test modules inside `src/` are held to the same rule.

use std::fs;
use std::path::Path;

use architectural_enforcement::production_sources;

/// Test that production code does not contain sleep() calls
#[test]
fn test_no_sleep_in_production_code() {
    let violations = find_sleep_violations();

    if !violations.is_empty() {
        eprintln!("\nCRITICAL: Sleep calls found in production code!\n");

        for violation in &violations {
            eprintln!("  - {violation}");
        }

        eprintln!("\nACCEPTABLE waiting:");
        eprintln!("  - Periodic ticks using tokio::time::interval()");
        eprintln!("  - Bounded waits using tokio::time::timeout()");
        eprintln!("  - Channels, streams and std::future::pending() in tests");
        eprintln!("\nFORBIDDEN:");
        eprintln!("  - Sleep in polling loops");
        eprintln!("  - Sleep as poor man's synchronization");

        panic!(
            "\nFound {} sleep violation(s) in production code.\nFix these before merging!",
            violations.len()
        );
    }
}

/// Find all sleep() calls in production code
fn find_sleep_violations() -> Vec<String> {
    let mut violations = Vec::new();
    for path in production_sources() {
        check_file(&path, &mut violations);
    }
    violations
}

fn check_file(path: &Path, violations: &mut Vec<String>) {
    let Ok(content) = fs::read_to_string(path) else {
        return;
    };

    let lines: Vec<&str> = content.lines().collect();

    for (idx, line) in lines.iter().enumerate() {
        // Skip comments
        let code_part = line.split("//").next().unwrap_or(line);

        if is_sleep_call(code_part) && !is_interval_pattern(&lines, idx) {
            violations.push(format!("{}:{} - {}", path.display(), idx + 1, line.trim()));
        }
    }
}

fn is_sleep_call(code: &str) -> bool {
    code.contains("::sleep(") || code.contains(".sleep(")
}

/// Check if this is a tokio::time::interval loop (acceptable for periodic tasks)
fn is_interval_pattern(lines: &[&str], current_idx: usize) -> bool {
    let back = current_idx.saturating_sub(20)..current_idx;
    if lines[back]
        .iter()
        .any(|line| line.contains("interval.tick()") || line.contains("tokio::time::interval"))
    {
        return true;
    }

    let forward = current_idx..std::cmp::min(current_idx + 5, lines.len());
    lines[forward]
        .iter()
        .any(|line| line.contains("interval.tick()"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sleep_violation_detection() {
        assert!(is_sleep_call(
            "    tokio::time::sleep(Duration::from_millis(10)).await;"
        ));
        assert!(is_sleep_call("    std::thread::sleep(delay);"));
        assert!(!is_sleep_call("    tokio::time::timeout(wait, send).await"));
    }

    #[test]
    fn test_interval_pattern_detection() {
        let test_code = vec![
            "let mut interval = tokio::time::interval(TICK_RATE);",
            "loop {",
            "    interval.tick().await;",
            "    tokio::time::sleep(Duration::ZERO).await;",
            "}",
        ];

        assert!(is_interval_pattern(&test_code, 3));
        assert!(!is_interval_pattern(&["tokio::time::sleep(d).await;"], 0));
    }
}
