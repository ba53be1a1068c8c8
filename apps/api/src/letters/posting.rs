//! Best-effort extraction of role and company names from raw job postings.
//!
//! Postings come in as unstructured pasted text. We only look at the top of
//! the posting where titles and company names conventionally live.

const ROLE_SUFFIXES: &[&str] = &[
    "Manager",
    "Developer",
    "Engineer",
    "Analyst",
    "Designer",
    "Director",
    "Specialist",
    "Coordinator",
    "Lead",
    "Architect",
    "Consultant",
];

/// Case-insensitive prefix strip. Offsets stay within `line` itself, so
/// multi-byte text after the label cannot shift the cut point.
fn strip_prefix_ci<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    line.get(..prefix.len())
        .filter(|head| head.eq_ignore_ascii_case(prefix))
        .map(|_| line[prefix.len()..].trim())
}

/// Case-insensitive substring search for an ASCII needle. A match is all
/// ASCII bytes, so the returned offset and the end of the match are always
/// char boundaries in `haystack`.
fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
}

/// Guesses the job title from the first few lines of a posting.
pub fn extract_role(job_posting: &str) -> Option<String> {
    for line in job_posting.lines().take(5) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        for prefix in ["position:", "role:", "title:", "job title:"] {
            if let Some(value) = strip_prefix_ci(line, prefix) {
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
        // A short standalone line ending in a known role word is almost
        // certainly the title itself.
        if line.split_whitespace().count() <= 6
            && ROLE_SUFFIXES.iter().any(|s| line.ends_with(s))
        {
            return Some(line.to_string());
        }
    }
    None
}

/// Guesses the hiring company from the first few lines of a posting.
pub fn extract_company(job_posting: &str) -> Option<String> {
    for line in job_posting.lines().take(10) {
        let line = line.trim();
        for prefix in ["company:", "employer:", "organization:"] {
            if let Some(value) = strip_prefix_ci(line, prefix) {
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
        for marker in [" at ", " with ", " join "] {
            if let Some(idx) = find_ascii_ci(line, marker) {
                let tail = line[idx + marker.len()..].trim();
                let name: String = tail
                    .split_whitespace()
                    .take_while(|w| w.chars().next().is_some_and(char::is_uppercase))
                    .collect::<Vec<_>>()
                    .join(" ");
                let name = name.trim_end_matches([',', '.', '!']);
                if !name.is_empty() {
                    return Some(name.to_string());
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labeled_role_is_extracted() {
        let posting = "Position: Senior Rust Engineer\nWe are a fast growing startup.";
        assert_eq!(extract_role(posting).as_deref(), Some("Senior Rust Engineer"));
    }

    #[test]
    fn standalone_title_line_is_recognized() {
        let posting = "Backend Developer\n\nAcme Corp is hiring.";
        assert_eq!(extract_role(posting).as_deref(), Some("Backend Developer"));
    }

    #[test]
    fn labeled_company_is_extracted() {
        let posting = "Role: Engineer\nCompany: Acme Corp\nLocation: Remote";
        assert_eq!(extract_company(posting).as_deref(), Some("Acme Corp"));
    }

    #[test]
    fn company_after_at_is_extracted() {
        let posting = "Come build the future at Stellar Dynamics, a leader in robotics.";
        assert_eq!(extract_company(posting).as_deref(), Some("Stellar Dynamics"));
    }

    #[test]
    fn multibyte_text_after_role_label_is_handled() {
        // U+1E9E shrinks from 3 bytes to 2 under to_lowercase; byte offsets
        // computed on a lowercased copy would land mid-character here.
        assert_eq!(
            extract_role("Role:\u{1E9E}Engineer").as_deref(),
            Some("\u{1E9E}Engineer")
        );
        assert_eq!(
            extract_role("Position: Ingénieur Développeur").as_deref(),
            Some("Ingénieur Développeur")
        );
    }

    #[test]
    fn multibyte_text_before_company_marker_is_handled() {
        assert_eq!(
            extract_company("Gro\u{1E9E}e Chancen at Acme Corp today").as_deref(),
            Some("Acme Corp")
        );
        assert_eq!(
            extract_company("Company:Zürich Insurance").as_deref(),
            Some("Zürich Insurance")
        );
    }

    #[test]
    fn marker_match_is_case_insensitive() {
        assert_eq!(
            extract_company("Build things AT Stellar Dynamics now").as_deref(),
            Some("Stellar Dynamics")
        );
    }

    #[test]
    fn unstructured_posting_yields_none() {
        let posting = "we need someone who can do many things quickly";
        assert_eq!(extract_role(posting), None);
        assert_eq!(extract_company(posting), None);
    }
}
