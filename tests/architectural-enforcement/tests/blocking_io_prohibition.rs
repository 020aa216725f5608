//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: Production code in the core, proxy and TUI MUST NOT use blocking I/O.
//! **Required**: Use `tokio::fs`, `tokio::net`, `tokio::process`, not `std::fs`, `std::net`, `std::process`

use std::fs;
use std::path::Path;

use architectural_enforcement::production_sources;

/// Test that production code does not use blocking I/O
#[test]
fn test_no_blocking_io_in_production_code() {
    let violations = find_blocking_io_violations();

    if !violations.is_empty() {
        eprintln!("\nCRITICAL: Blocking I/O calls found in production code!\n");

        for violation in &violations {
            eprintln!("  - {violation}");
        }

        eprintln!("\nFORBIDDEN blocking I/O:");
        eprintln!("  - std::fs::read(), std::fs::write(), std::fs::File");
        eprintln!("  - std::net::TcpStream, std::net::TcpListener");
        eprintln!("  - std::process::Command::output()");
        eprintln!("  - reqwest::blocking::*");
        eprintln!("\nREQUIRED async I/O:");
        eprintln!("  - tokio::fs::read().await");
        eprintln!("  - tokio::net::TcpListener::bind().await");
        eprintln!("  - tokio::io::AsyncWrite");
        eprintln!("\nACCEPTABLE blocking I/O:");
        eprintln!("  - Private non-async functions (config loading, log file setup)");
        eprintln!("  - Test code");

        panic!(
            "\nFound {} blocking I/O violation(s) in production code.\nFix these before merging!",
            violations.len()
        );
    }
}

/// Find all blocking I/O calls in production code
fn find_blocking_io_violations() -> Vec<String> {
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
        let line_number = idx + 1;

        // Skip comments
        let code_part = line.split("//").next().unwrap_or(line);

        if is_in_test_function(&lines, idx) || is_in_non_async_function(&lines, idx) {
            continue;
        }

        let mut report = |kind: &str| {
            violations.push(format!(
                "{}:{} - {}: {}",
                path.display(),
                line_number,
                kind,
                line.trim()
            ));
        };

        if code_part.contains("std::fs::") || code_part.contains("use std::fs") {
            report("Blocking file I/O");
        }

        if code_part.contains("std::net::") || code_part.contains("use std::net") {
            report("Blocking network I/O");
        }

        if code_part.contains("std::process::Command") {
            report("Blocking process I/O");
        }

        if code_part.contains("reqwest::blocking") {
            report("Blocking HTTP client");
        }

        if (code_part.contains("std::io::stdin()") || code_part.contains("std::io::stdout()"))
            && is_in_async_function(&lines, idx)
        {
            report("Blocking stdin/stdout in async");
        }
    }
}

/// Check if line is inside a test function
fn is_in_test_function(lines: &[&str], current_idx: usize) -> bool {
    let mut found_fn_idx = None;
    for i in (0..current_idx).rev() {
        let line = lines[i].trim();

        if line.starts_with("fn ") || line.contains(" fn ") {
            found_fn_idx = Some(i);
            break;
        }

        // Stop at module boundaries
        if line.starts_with("mod ") || (line.starts_with("impl ") && line.contains('{')) {
            return false;
        }
    }

    let Some(fn_idx) = found_fn_idx else {
        return false;
    };

    for i in (0..fn_idx).rev() {
        let line = lines[i].trim();

        if line.starts_with("#[test]") || line.starts_with("#[tokio::test") {
            return true;
        }

        if line.starts_with("fn ") || line.starts_with("mod ") || line.starts_with("impl ") {
            break;
        }
    }

    false
}

/// Check if line is inside an async function
fn is_in_async_function(lines: &[&str], current_idx: usize) -> bool {
    for i in (0..current_idx).rev() {
        let line = lines[i].trim();

        if line.contains("async fn ") {
            return true;
        }

        if line.starts_with("fn ") {
            return false;
        }

        if line.starts_with("mod ") || (line.starts_with("impl ") && line.contains('{')) {
            return false;
        }
    }
    false
}

/// Check if line is inside a private non-async function (blocking I/O is OK)
fn is_in_non_async_function(lines: &[&str], current_idx: usize) -> bool {
    for i in (0..current_idx).rev() {
        let line = lines[i].trim();

        if line.starts_with("fn ") {
            return true;
        }

        if line.contains("async fn ") {
            return false;
        }

        if line.starts_with("mod ") || (line.starts_with("impl ") && line.contains('{')) {
            return false;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocking_io_detection() {
        let test_code = vec![
            "async fn bad_function() {",
            "    let contents = std::fs::read_to_string(\"file.txt\")?;",
            "}",
        ];

        assert!(is_in_async_function(&test_code, 1));
        assert!(!is_in_non_async_function(&test_code, 1));
    }

    #[test]
    fn test_non_async_function_detection() {
        let test_code = vec![
            "fn read_config_file(path: &Path) -> Result<String> {",
            "    std::fs::read_to_string(path)",
            "}",
        ];

        assert!(is_in_non_async_function(&test_code, 1));
    }

    #[test]
    fn test_public_functions_are_not_exempt() {
        let test_code = vec![
            "pub fn load() -> String {",
            "    std::fs::read_to_string(\"relay.toml\").unwrap_or_default()",
            "}",
        ];

        assert!(!is_in_non_async_function(&test_code, 1));
    }

    #[test]
    fn test_test_function_detection() {
        let test_code = vec![
            "#[test]",
            "fn test_something() {",
            "    let contents = std::fs::read_to_string(\"test.txt\")?;",
            "}",
        ];

        assert!(is_in_test_function(&test_code, 2));
    }
}
