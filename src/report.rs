//! HTML rendering of an interpreted log.

use crate::interpreter::ParsedReport;

/// Label shown in the Name column
pub const PROJECT_LABEL: &str = "jdnielss-go-smoke";

/// Value of the Result column. Independent of the quality gate verdict.
const RESULT_COLUMN: &str = "PASS";

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Project Results</title>
    <link href="https://cdn.jsdelivr.net/npm/tailwindcss@2.2.19/dist/tailwind.min.css" rel="stylesheet">
</head>
<body>
    <div class="container mx-auto mt-10">
        <h1 class="text-2xl font-bold mb-5">Project Test Results</h1>
        <table class="table-auto w-full text-left">
            <thead>
                <tr>
                    <th class="px-4 py-2">Name</th>
                    <th class="px-4 py-2">Unit Test</th>
                    <th class="px-4 py-2">Quality Gate</th>
                    <th class="px-4 py-2">Smoke Test</th>
                    <th class="px-4 py-2">Endpoint</th>
                    <th class="px-4 py-2">Result</th>
                </tr>
            </thead>
            <tbody>
"#;

const PAGE_TAIL: &str = r#"            </tbody>
        </table>
    </div>
</body>
</html>
"#;

/// Render the single-row results page. Unset fields render as empty cells.
pub fn render_report(report: &ParsedReport) -> String {
    let endpoint = report.endpoint();
    let mut html = String::with_capacity(PAGE_HEAD.len() + PAGE_TAIL.len() + 512);

    html.push_str(PAGE_HEAD);
    html.push_str("                <tr>\n");
    push_cell(&mut html, &html_escape::encode_text(PROJECT_LABEL));
    push_cell(&mut html, &html_escape::encode_text(report.unit_test_status()));
    push_cell(&mut html, &html_escape::encode_text(report.quality_gate()));
    push_cell(&mut html, &html_escape::encode_text(report.smoke_test_status()));
    push_cell(
        &mut html,
        &format!(
            r#"<a href="{}" class="text-blue-500">{}</a>"#,
            html_escape::encode_double_quoted_attribute(endpoint),
            html_escape::encode_text(endpoint),
        ),
    );
    push_cell(&mut html, RESULT_COLUMN);
    html.push_str("                </tr>\n");
    html.push_str(PAGE_TAIL);

    html
}

fn push_cell(html: &mut String, content: &str) {
    html.push_str(r#"                    <td class="border px-4 py-2">"#);
    html.push_str(content);
    html.push_str("</td>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::QualityGate;

    fn report(endpoint: Option<&str>) -> ParsedReport {
        ParsedReport {
            unit_test_ok: true,
            quality_gate: QualityGate::Pass,
            gate_markers: 6,
            smoke_test_ok: true,
            endpoint: endpoint.map(String::from),
        }
    }

    fn cells(html: &str) -> Vec<&str> {
        html.lines()
            .filter_map(|l| l.trim().strip_prefix(r#"<td class="border px-4 py-2">"#))
            .filter_map(|l| l.strip_suffix("</td>"))
            .collect()
    }

    #[test]
    fn test_render_row() {
        let html = render_report(&report(Some("http://x/y")));
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert_eq!(
            cells(&html),
            vec![
                "jdnielss-go-smoke",
                "Ok",
                "PASS",
                "OK",
                r#"<a href="http://x/y" class="text-blue-500">http://x/y</a>"#,
                "PASS",
            ]
        );
    }

    #[test]
    fn test_unset_fields_render_empty() {
        let empty = ParsedReport {
            unit_test_ok: false,
            quality_gate: QualityGate::Fail,
            gate_markers: 0,
            smoke_test_ok: false,
            endpoint: None,
        };
        let html = render_report(&empty);
        assert_eq!(
            cells(&html),
            vec![
                "jdnielss-go-smoke",
                "",
                "FAIL",
                "",
                r#"<a href="" class="text-blue-500"></a>"#,
                "PASS",
            ]
        );
    }

    #[test]
    fn test_result_column_ignores_verdict() {
        let mut failing = report(None);
        failing.quality_gate = QualityGate::Fail;
        let html = render_report(&failing);
        assert_eq!(cells(&html).last(), Some(&"PASS"));
    }

    #[test]
    fn test_endpoint_is_escaped() {
        let html = render_report(&report(Some(r#"http://x/"><script>alert(1)</script>"#)));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains(r#"href="http://x/&quot;&gt;"#));
    }
}
