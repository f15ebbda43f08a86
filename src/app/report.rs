use crate::args::ReportArgs;
use crate::error::AppResult;
use crate::sinks::{ResultRow, read_results_csv};

const HEADER: [&str; 11] = [
    "QoS", "SubQoS", "Delay", "Size", "Count", "Rate/s", "Loss%", "OutOfOrd%", "Dup%", "Gap(ms)",
    "GapSD",
];

pub(crate) async fn run_report(args: ReportArgs) -> AppResult<()> {
    let rows = read_results_csv(&args.path).await?;
    for line in report_lines(&rows, args.matched_qos) {
        println!("{}", line);
    }
    Ok(())
}

/// Aligned text table, one line per run.
pub(crate) fn report_lines(rows: &[ResultRow], matched_qos: bool) -> Vec<String> {
    let cells: Vec<[String; 11]> = rows
        .iter()
        .filter(|row| !matched_qos || row.params.publish_qos == row.params.subscribe_qos)
        .map(|row| {
            let params = row.params;
            let metrics = row.metrics;
            [
                params.publish_qos.to_string(),
                params.subscribe_qos.to_string(),
                params.delay_ms.to_string(),
                params.payload_size.to_string(),
                params.publisher_count.to_string(),
                format!("{:.2}", metrics.message_rate),
                format!("{:.2}", metrics.avg_message_loss),
                format!("{:.2}", metrics.avg_out_of_order),
                format!("{:.2}", metrics.avg_duplicates),
                format!("{:.2}", metrics.avg_mean_gap),
                format!("{:.2}", metrics.avg_std_dev_gap),
            ]
        })
        .collect();

    let mut widths = HEADER.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut lines = Vec::with_capacity(cells.len().saturating_add(2));
    lines.push(render_row(HEADER.iter().copied(), &widths));
    lines.push(
        widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in &cells {
        lines.push(render_row(row.iter().map(String::as_str), &widths));
    }
    if cells.is_empty() {
        lines.push("(no runs)".to_owned());
    }
    lines
}

fn render_row<'cell>(values: impl Iterator<Item = &'cell str>, widths: &[usize]) -> String {
    values
        .zip(widths)
        .map(|(value, width)| format!("{:>width$}", value, width = *width))
        .collect::<Vec<_>>()
        .join("  ")
}
