use std::fmt::Write;

use crate::cumulative::CumulativeRecordRow;
use crate::profile::CarrierProfile;
use crate::summary::TermSummary;

fn average_label(average: Option<f64>) -> String {
    match average {
        Some(value) => format!("{value:.2}"),
        None => "n/a".to_string(),
    }
}

/// Markdown career report for one carrier. `latest` pairs the title of the
/// most recent term with its peer summary.
pub fn build_report(
    profile: &CarrierProfile,
    records: &[CumulativeRecordRow],
    latest: Option<(&str, &TermSummary)>,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Academic Record Report");
    let _ = writeln!(
        output,
        "Generated for {} (carrier {}, {})",
        profile.student_name, profile.carrier_id, profile.subfield
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Career");
    let _ = writeln!(
        output,
        "- Degree: {} ({} admission, {})",
        profile.degree_type, profile.admission_type, profile.status
    );
    match profile.entry_year {
        Some(year) => {
            let _ = writeln!(output, "- Entry year: {year}");
        }
        None => {
            let _ = writeln!(output, "- Entry year: not yet enrolled");
        }
    }
    let _ = writeln!(
        output,
        "- Credits: {} taken, {} passed",
        profile.total_credits_taken, profile.total_credits_passed
    );
    let _ = writeln!(output, "- Average: {}", average_label(profile.average));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Term Records");

    if records.is_empty() {
        let _ = writeln!(output, "No terms recorded for this carrier.");
    } else {
        let _ = writeln!(
            output,
            "| Term | Taken | Passed | Average | Considered | Taken (total) | Passed (total) | Average (total) | Considered (total) |"
        );
        let _ = writeln!(output, "|---|---|---|---|---|---|---|---|---|");
        for row in records {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} | {} | {} | {} | {} |",
                row.term_title,
                row.total_credits_taken,
                row.total_credits_passed,
                average_label(row.average),
                row.credits_considered_in_average,
                row.total_credits_taken_till_now,
                row.total_credits_passed_till_now,
                average_label(row.average_till_now),
                row.credits_considered_in_average_till_now
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Latest Term Against Peers");

    match latest {
        None => {
            let _ = writeln!(output, "No terms recorded for this carrier.");
        }
        Some((title, summary)) => {
            let _ = writeln!(output, "Term {title}:");
            let _ = writeln!(
                output,
                "- Carrier: {}",
                average_label(summary.carrier_average)
            );
            let _ = writeln!(output, "- Field: {}", average_label(summary.field_average));
            let _ = writeln!(
                output,
                "- Department: {}",
                average_label(summary.department_average)
            );
            let _ = writeln!(
                output,
                "- College: {}",
                average_label(summary.college_average)
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> CarrierProfile {
        CarrierProfile {
            carrier_id: 7,
            student_name: "Avery Lee".to_string(),
            subfield: "Software, Systems".to_string(),
            degree_type: "bachelor",
            admission_type: "day",
            status: "studying",
            entry_year: Some(2023),
            total_credits_taken: 36,
            total_credits_passed: 32,
            average: Some(14.88),
        }
    }

    fn row(title: &str, average: Option<f64>) -> CumulativeRecordRow {
        CumulativeRecordRow {
            term_title: title.to_string(),
            total_credits_taken: 18,
            total_credits_passed: 18,
            average,
            credits_considered_in_average: 18,
            total_credits_taken_till_now: 36,
            total_credits_passed_till_now: 32,
            credits_considered_in_average_till_now: 32,
            average_till_now: Some(14.88),
        }
    }

    #[test]
    fn report_lists_terms_and_peers() {
        let summary = TermSummary {
            credits_taken: 18,
            credits_passed: 18,
            credits_considered: 18,
            carrier_average: Some(14.0),
            field_average: Some(13.5),
            department_average: None,
            college_average: Some(12.25),
        };
        let records = vec![row("2024 first half", Some(14.0))];
        let latest = Some(("2024 first half", &summary));
        let report = build_report(&profile(), &records, latest);

        assert!(report.contains("Generated for Avery Lee (carrier 7, Software, Systems)"));
        assert!(report.contains("| 2024 first half | 18 | 18 | 14.00 | 18 | 36 | 32 | 14.88 | 32 |"));
        assert!(report.contains("- Department: n/a"));
        assert!(report.contains("- College: 12.25"));
    }

    #[test]
    fn empty_record_is_explicit() {
        let mut fresh = profile();
        fresh.entry_year = None;
        fresh.average = None;
        let report = build_report(&fresh, &[], None);

        assert!(report.contains("- Entry year: not yet enrolled"));
        assert!(report.contains("- Average: n/a"));
        assert!(report.contains("No terms recorded for this carrier."));
    }
}
