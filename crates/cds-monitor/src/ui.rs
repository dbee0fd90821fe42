//! UI rendering for the monitoring dashboard

use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::aggregate::{HatcheryBucket, QueueRow};
use crate::app::{DashboardState, NoticeLevel};
use crate::format::{age, pad};
use crate::model::{param, LineStatus, Status, StatusLine};
use crate::status::{classify, classify_known, urgency, ColorTag, Urgency};

/// Height of the status and hatchery panels.
const HEIGHT_BOTTOM: u16 = 25;

/// Main UI rendering function
pub fn draw(frame: &mut Frame, app: &mut DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),             // Legend
            Constraint::Length(1),             // Message line
            Constraint::Min(4),                // Queue
            Constraint::Length(HEIGHT_BOTTOM), // Status + hatcheries
        ])
        .split(frame.area());

    frame.render_widget(Paragraph::new(header_line()), chunks[0]);
    draw_message(frame, app, chunks[1]);
    app.queue.render(frame, chunks[2]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(7, 12), Constraint::Ratio(5, 12)])
        .split(chunks[3]);
    app.status.render(frame, bottom[0]);
    app.hatcheries.render(frame, bottom[1]);
}

fn draw_message(frame: &mut Frame, app: &DashboardState, area: Rect) {
    let style = match app.notice().map(|n| n.level) {
        Some(NoticeLevel::Error) => Style::default().fg(Color::White).bg(Color::Red),
        _ => Style::default().fg(Color::Cyan),
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(app.message_text(), style))),
        area,
    );
}

/// Terminal color of a color tag.
pub const fn color(tag: ColorTag) -> Color {
    match tag {
        ColorTag::Default => Color::Reset,
        ColorTag::Cyan => Color::Cyan,
        ColorTag::Blue => Color::Blue,
        ColorTag::Grey => Color::DarkGray,
        ColorTag::Yellow => Color::Yellow,
        ColorTag::Green => Color::Green,
        ColorTag::Red => Color::Red,
    }
}

/// Key and status legend.
pub fn header_line() -> Line<'static> {
    let mut spans = vec![Span::styled(
        "CDS | (h)elp | (q)uit | Legend: ",
        Style::default().fg(Color::Cyan),
    )];
    for status in [Status::Checking, Status::Waiting, Status::Building, Status::Disabled] {
        let (icon, tag) = classify_known(status);
        spans.push(Span::styled(
            format!("{status}:{icon} "),
            Style::default().fg(color(tag)),
        ));
    }
    Line::from(spans)
}

/// Placeholder shown before the first fetch completes.
pub fn loading_line() -> Line<'static> {
    Line::from(Span::styled("loading...", Style::default().fg(Color::Cyan)))
}

/// Column titles of the queue panel.
pub fn queue_header() -> Line<'static> {
    Line::from(Span::styled(
        format!(
            "_ {} {}{} {} ➤ {} ➤ {} ➤ requirements",
            pad("since", 9),
            pad("by", 27),
            pad("run", 7),
            pad("project/workflow", 30),
            pad("node", 20),
            pad("triggered by", 17),
        ),
        Style::default().fg(Color::Cyan),
    ))
}

/// One queue row, with its age computed as of `now`.
pub fn queue_line(row: &QueueRow, now: DateTime<Utc>) -> Line<'static> {
    let waited = row.age(now);
    let (_, status_color) = classify(&row.status);

    let by = if row.status == Status::Building.as_str() {
        format!(" {}.{} ", row.worker_name, row.worker_id)
    } else if row.booked_by_id != 0 {
        format!(" {}.{} ", row.booked_by_name, row.booked_by_id)
    } else {
        String::new()
    };

    let (run, location) = if row.is_workflow_job {
        (
            param(&row.parameters, "cds.run").to_string(),
            format!(
                "{} ➤ {}",
                pad(&format!("{}/{}", row.project, row.workflow_or_pipeline), 30),
                pad(&row.node, 20)
            ),
        )
    } else {
        (
            row.id.to_string(),
            format!(
                "{} ➤ {}",
                pad(
                    &format!("{}/{}", row.project, param(&row.parameters, "cds.application")),
                    30
                ),
                pad(&format!("{}/{}", row.workflow_or_pipeline, row.node), 20)
            ),
        )
    };

    let requirements: String = row
        .requirements
        .iter()
        .map(|(kind, value)| format!("{kind}:{value} "))
        .collect();

    let rest = format!(
        "{} {} {} ➤ {} ➤ {}",
        pad(&by, 27),
        pad(&run, 7),
        location,
        pad(&row.triggered_by, 17),
        requirements
    );

    let age_style = if row.status == Status::Waiting.as_str() {
        match urgency(waited) {
            Urgency::Default => Style::default(),
            tier => Style::default().fg(Color::Black).bg(color(tier.color())),
        }
    } else {
        Style::default()
    };

    let rest_style = if row.is_workflow_job {
        Style::default()
    } else {
        Style::default().fg(Color::Magenta)
    };

    Line::from(vec![
        Span::styled(" ", Style::default().bg(color(status_color))),
        Span::raw(" "),
        Span::styled(pad(&age(waited), 9), age_style),
        Span::styled(rest, rest_style),
    ])
}

/// One hatchery with its non-zero worker counts.
pub fn hatchery_line(bucket: &HatcheryBucket) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = bucket
        .counts_by_status
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(status, count)| {
            let (icon, tag) = classify(status);
            Span::styled(format!("[ {count}{icon} ]"), Style::default().fg(color(tag)))
        })
        .collect();
    if spans.is_empty() {
        spans.push(Span::styled("[ _ ]", Style::default().fg(Color::White)));
    }
    spans.push(Span::styled(
        format!(" {}", bucket.name),
        Style::default().fg(Color::White),
    ));
    Line::from(spans)
}

/// One global status line.
pub fn status_line(line: &StatusLine) -> Line<'static> {
    let style = match line.status {
        LineStatus::Warn => Style::default().fg(Color::Yellow),
        LineStatus::Ok => Style::default(),
        LineStatus::Other(_) => Style::default()
            .bg(Color::Red)
            .add_modifier(Modifier::BOLD),
    };
    Line::from(Span::styled(line.to_string(), style))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::build_queue_rows;
    use crate::aggregate::QueueTab;
    use crate::data::{PlatformSnapshot, QueueSnapshot};
    use crate::events::DataEvent;
    use crate::model::{BookedBy, ExecutedJob, Parameter, PipelineBuildJob, Worker, WorkflowNodeJobRun};
    use chrono::TimeZone;
    use ratatui::{backend::TestBackend, Terminal};
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).single().unwrap()
    }

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn waiting_legacy() -> PipelineBuildJob {
        PipelineBuildJob {
            id: 77,
            status: "Waiting".into(),
            queued: at(0),
            parameters: vec![
                Parameter::new("cds.project", "PRJ"),
                Parameter::new("cds.application", "api"),
                Parameter::new("cds.pipeline", "deploy"),
                Parameter::new("git.branch", "main"),
                Parameter::new("cds.environment", "prod"),
            ],
            job: ExecutedJob::default(),
            booked_by: BookedBy { id: 4, name: "swarm".into() },
        }
    }

    #[test]
    fn waiting_age_colored_by_urgency() {
        let rows = build_queue_rows(&[waiting_legacy()], &[], QueueTab::Waiting);
        let critical = queue_line(&rows[0], at(70));
        assert_eq!(critical.spans[2].style.bg, Some(Color::Red));
        let fresh = queue_line(&rows[0], at(10));
        assert_eq!(fresh.spans[2].style.bg, None);
        let warning = queue_line(&rows[0], at(30));
        assert_eq!(warning.spans[2].style.bg, Some(Color::Yellow));
    }

    #[test]
    fn legacy_line_layout() {
        let rows = build_queue_rows(&[waiting_legacy()], &[], QueueTab::Waiting);
        let line = queue_line(&rows[0], at(70));
        let text = line_text(&line);
        assert!(text.starts_with("  1m10s    "));
        assert!(text.contains(" swarm.4 "));
        assert!(text.contains("PRJ/api"));
        assert!(text.contains("deploy/main/prod"));
        assert_eq!(line.spans[3].style.fg, Some(Color::Magenta));
        assert_eq!(line.spans[0].style.bg, Some(Color::Cyan));
    }

    #[test]
    fn building_line_shows_worker() {
        let job = WorkflowNodeJobRun {
            id: 5,
            status: "Building".into(),
            queued: at(0),
            parameters: vec![Parameter::new("cds.run", "12")],
            job: ExecutedJob {
                worker_name: "worker-a".into(),
                worker_id: "9".into(),
                ..ExecutedJob::default()
            },
            booked_by: BookedBy::default(),
        };
        let rows = build_queue_rows(&[], &[job], QueueTab::Building);
        let line = queue_line(&rows[0], at(5));
        let text = line_text(&line);
        assert!(text.contains(" worker-a.9 "));
        assert!(text.contains("12     "));
        assert_eq!(line.spans[0].style.bg, Some(Color::Blue));
    }

    #[test]
    fn empty_bucket_shows_placeholder() {
        let bucket = HatcheryBucket { name: "swarm".into(), counts_by_status: BTreeMap::new() };
        assert_eq!(line_text(&hatchery_line(&bucket)), "[ _ ] swarm");
    }

    #[test]
    fn bucket_lists_counts_with_icons() {
        let bucket = HatcheryBucket {
            name: "swarm".into(),
            counts_by_status: BTreeMap::from([("Building".to_string(), 2), ("Waiting".to_string(), 1)]),
        };
        assert_eq!(line_text(&hatchery_line(&bucket)), "[ 2b ][ 1w ] swarm");
    }

    #[test]
    fn status_line_styles() {
        let warn = StatusLine { component: "DB".into(), status: LineStatus::Warn, message: "slow".into() };
        assert_eq!(status_line(&warn).spans[0].style.fg, Some(Color::Yellow));
        let down = StatusLine { component: "DB".into(), status: LineStatus::Other("AL".into()), message: "down".into() };
        assert_eq!(status_line(&down).spans[0].style.bg, Some(Color::Red));
    }

    #[test]
    fn draws_all_panels() {
        let mut app = DashboardState::new();
        app.apply_data_event(DataEvent::Platform(Ok(PlatformSnapshot {
            workers: vec![Worker { status: "Waiting".into(), ..Worker::default() }],
            legacy_jobs: vec![waiting_legacy()],
            ..PlatformSnapshot::default()
        })));
        app.apply_data_event(DataEvent::Queue(Ok(QueueSnapshot {
            tab: QueueTab::Waiting,
            jobs: Vec::new(),
            latency: Duration::from_millis(3),
        })));
        app.refresh_view(at(20));

        let backend = TestBackend::new(160, 40);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| draw(frame, &mut app)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(text.contains("CDS | (h)elp | (q)uit"));
        assert!(text.contains("Queue(Waiting):1"));
        assert!(text.contains("Without hatchery"));
        assert!(text.contains(" Hatcheries 1w "));
        assert!(text.contains("queue wf 3ms"));
    }
}
