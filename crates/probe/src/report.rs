//! Rendering of notification subjects and HTML bodies.

use crate::job::JobSet;
use std::fmt::Write;

/// Body of the report sent when the probe stops.
pub const EXIT_BODY: &str = "Probe Exit.";

/// Subject of the report sent after the first round.
pub fn start_subject(probe_name: &str) -> String {
    format!("[{}] Start Detection", probe_name)
}

/// Subject of a status change notification.
pub fn change_subject(probe_name: &str) -> String {
    format!("[{}] Notification of status changes", probe_name)
}

/// Subject of a periodic alive report.
pub fn alive_subject(probe_name: &str) -> String {
    format!("[{}] Alive Report", probe_name)
}

/// Subject of the report sent on shutdown.
pub fn exit_subject(probe_name: &str) -> String {
    format!("[{}] Exit Report", probe_name)
}

/// Render one block per job in `indices`, in the given order.
///
/// An empty `indices` renders every job in index order. Indices outside
/// the job set are skipped.
pub fn render_report(jobs: &JobSet, indices: &[usize]) -> String {
    let all: Vec<usize>;
    let indices = if indices.is_empty() {
        all = (0..jobs.len()).collect();
        &all
    } else {
        indices
    };

    let mut body = String::new();
    for job in indices.iter().filter_map(|&i| jobs.get(i)) {
        // Writing to a String cannot fail
        let _ = write!(
            body,
            "<b>[{}]</b><br>Check: {}<br>Target: {}<br>Status: {}<br>",
            escape(&job.name),
            job.kind,
            escape(&job.target),
            escape(&job.last_info),
        );
    }
    body
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::Job;
    use detectors::CheckKind;

    fn sample_jobs() -> JobSet {
        let mut web = Job::new("web", CheckKind::Get, "http://example.com");
        web.last_info = "Alive".to_string();
        let mut db = Job::new("db", CheckKind::Port, "10.0.0.2:5432");
        db.last_info = "Dial Error".to_string();
        JobSet::new(vec![web, db]).unwrap()
    }

    #[test]
    fn test_single_block_format() {
        let body = render_report(&sample_jobs(), &[1]);
        assert_eq!(
            body,
            "<b>[db]</b><br>Check: port<br>Target: 10.0.0.2:5432<br>Status: Dial Error<br>"
        );
    }

    #[test]
    fn test_empty_indices_render_all_in_order() {
        let jobs = sample_jobs();
        let body = render_report(&jobs, &[]);

        assert_eq!(body.matches("<b>[").count(), 2);
        let web = body.find("[web]").unwrap();
        let db = body.find("[db]").unwrap();
        assert!(web < db);
        assert_eq!(body, render_report(&jobs, &[0, 1]));
    }

    #[test]
    fn test_out_of_range_index_is_skipped() {
        let body = render_report(&sample_jobs(), &[0, 7]);
        assert_eq!(body.matches("<b>[").count(), 1);
        assert!(body.contains("[web]"));
    }

    #[test]
    fn test_markup_in_values_is_escaped() {
        let mut job = Job::new("a<b>", CheckKind::Get, "http://x/?a=1&b=2");
        job.last_info = "Get Error".to_string();
        let jobs = JobSet::new(vec![job]).unwrap();

        let body = render_report(&jobs, &[]);
        assert!(body.starts_with("<b>[a&lt;b&gt;]</b><br>"));
        assert!(body.contains("Target: http://x/?a=1&amp;b=2<br>"));
    }

    #[test]
    fn test_subjects() {
        assert_eq!(start_subject("office"), "[office] Start Detection");
        assert_eq!(
            change_subject("office"),
            "[office] Notification of status changes"
        );
        assert_eq!(alive_subject("office"), "[office] Alive Report");
        assert_eq!(exit_subject("office"), "[office] Exit Report");
    }
}
