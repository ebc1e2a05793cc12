//! Human-readable rendering of the state and statistics of a run.
//!
//! Every function here consumes the engine read-only; the tables reflect
//! the state as of the most recent caused event.

use std::io;
use std::time::Duration;

use simpl::Engine;

const MIN_COLUMN_WIDTH: usize = 5;

fn header(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|cell| (*cell).to_string()).collect()
}

/// Renders `rows` (the first being the header) as a framed table. Column
/// widths follow the widest cell, measured in characters rather than bytes
/// so multi-byte names line up.
fn render_table(rows: &[Vec<String>]) -> String {
    let columns = rows.first().map_or(0, Vec::len);
    let mut widths = vec![MIN_COLUMN_WIDTH; columns];
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let separator = widths.iter().fold(String::from("+"), |mut line, width| {
        line.push_str(&"-".repeat(width + 2));
        line.push('+');
        line
    });

    let mut table = String::new();
    table.push_str(&separator);
    table.push('\n');
    for row in rows {
        let mut line = String::from("|");
        for (cell, width) in row.iter().zip(&widths) {
            line.push(' ');
            line.push_str(cell);
            line.push_str(&" ".repeat(width - cell.chars().count() + 1));
            line.push('|');
        }
        table.push_str(&line);
        table.push('\n');
        table.push_str(&separator);
        table.push('\n');
    }
    table
}

/// Renders the pending events in causal order.
#[must_use]
pub fn pending_events(engine: &Engine) -> String {
    let mut rows = vec![header(&["time", "kind", "transact"])];
    rows.extend(engine.pending().map(|event| {
        vec![
            format!("{:?}", event.time()),
            event.kind().to_string(),
            event.transact().to_string(),
        ]
    }));
    format!("pending events:\n{}", render_table(&rows))
}

/// Renders every device along with the transact occupying it, if any.
#[must_use]
pub fn device_states(engine: &Engine) -> String {
    let mut rows = vec![header(&["device", "transact"])];
    rows.extend(engine.devices().map(|device| {
        vec![
            device.name().to_string(),
            device
                .status()
                .map_or_else(|| "-".to_string(), |occupant| occupant.to_string()),
        ]
    }));
    format!("devices:\n{}", render_table(&rows))
}

/// Renders the waiting transacts of every queue in dequeue order.
#[must_use]
pub fn queue_contents(engine: &Engine) -> String {
    let mut rows = vec![header(&["queue", "priority", "arrived", "transact", "stage"])];
    for queue in engine.queues() {
        if queue.length() == 0 {
            let mut row = vec![queue.name().to_string()];
            row.resize(rows[0].len(), "-".to_string());
            rows.push(row);
        } else {
            rows.extend(queue.items().map(|item| {
                vec![
                    queue.name().to_string(),
                    item.priority().to_string(),
                    format!("{:?}", item.arrived_at()),
                    item.transact().to_string(),
                    item.stage().to_string(),
                ]
            }));
        }
    }
    format!("queues:\n{}", render_table(&rows))
}

/// Renders the full instantaneous state of the run: the simulation time,
/// the pending events, and the state of every device and queue.
#[must_use]
pub fn monitor(engine: &Engine) -> String {
    format!(
        "*** simulation time: {:?}\n{}{}{}",
        engine.time(),
        pending_events(engine),
        device_states(engine),
        queue_contents(engine),
    )
}

fn device_summary(engine: &Engine) -> String {
    let elapsed = engine.time();
    let mut rows = vec![header(&["device", "mean service", "busy %", "completed"])];
    rows.extend(engine.devices().map(|device| {
        vec![
            device.name().to_string(),
            device
                .mean_service_time()
                .map_or_else(|| "-".to_string(), |mean| format!("{:?}", mean)),
            if elapsed > Duration::default() {
                format!("{:.2}", device.utilization() * 100.0)
            } else {
                "-".to_string()
            },
            device.completed().to_string(),
        ]
    }));
    format!("devices:\n{}", render_table(&rows))
}

fn queue_summary(engine: &Engine) -> String {
    let elapsed = engine.time();
    let mut rows = vec![header(&[
        "queue",
        "mean wait",
        "stdev wait",
        "max",
        "mean length",
        "length",
    ])];
    rows.extend(engine.queues().map(|queue| {
        vec![
            queue.name().to_string(),
            queue
                .mean_wait()
                .map_or_else(|| "-".to_string(), |mean| format!("{:?}", mean)),
            queue
                .stdev_wait()
                .map_or_else(|| "-".to_string(), |stdev| format!("{:.2}s", stdev)),
            queue.max_length().to_string(),
            if elapsed > Duration::default() {
                format!("{:.2}", queue.mean_length())
            } else {
                "-".to_string()
            },
            queue.length().to_string(),
        ]
    }));
    format!("queues:\n{}", render_table(&rows))
}

/// Renders the end-of-run statistics of every device and queue.
#[must_use]
pub fn summary(engine: &Engine) -> String {
    format!(
        "simulation time: {:?}\n{}{}",
        engine.time(),
        device_summary(engine),
        queue_summary(engine),
    )
}

/// Writes one row per device with its raw accumulators.
///
/// # Errors
///
/// Returns an error if the underlying writer fails.
pub fn write_device_csv<W: io::Write>(engine: &Engine, writer: W) -> eyre::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(&["device", "completed", "busy_time_s", "utilization"])?;
    for device in engine.devices() {
        writer.write_record(&[
            device.name().to_string(),
            device.completed().to_string(),
            device.busy_time().as_secs_f64().to_string(),
            device.utilization().to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes one row per queue with its raw accumulators.
///
/// # Errors
///
/// Returns an error if the underlying writer fails.
pub fn write_queue_csv<W: io::Write>(engine: &Engine, writer: W) -> eyre::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(&[
        "queue",
        "dequeued",
        "max_length",
        "wait_time_s",
        "wait_time_sq_s2",
        "length_time_s",
    ])?;
    for queue in engine.queues() {
        writer.write_record(&[
            queue.name().to_string(),
            queue.dequeued().to_string(),
            queue.max_length().to_string(),
            queue.wait_time_sum().as_secs_f64().to_string(),
            queue.wait_time_sq_sum().to_string(),
            queue.length_time_sum().as_secs_f64().to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    use rstest::{fixture, rstest};
    use simpl::{EventKind, Priority, Stage, TransactId};

    #[fixture]
    fn engine() -> Engine {
        Engine::default()
    }

    fn advance(engine: &mut Engine, secs: u64) {
        engine.schedule(
            Duration::from_secs(secs),
            EventKind::new(0),
            TransactId::new(0),
        );
        engine.cause().unwrap();
    }

    #[rstest]
    fn test_occupied_device_renders_its_transact(mut engine: Engine) {
        let machine = engine.add_device("machine");
        engine.device_mut(machine).reserve(TransactId::new(7)).unwrap();

        let expected = "\
devices:
+---------+----------+
| device  | transact |
+---------+----------+
| machine | 7        |
+---------+----------+
";
        assert_eq!(device_states(&engine), expected);
    }

    #[rstest]
    fn test_free_device_renders_a_dash(mut engine: Engine) {
        let _ = engine.add_device("machine");
        assert!(device_states(&engine).contains("| machine | -        |"));
    }

    #[rstest]
    fn test_pending_events_render_in_causal_order(mut engine: Engine) {
        engine.schedule(Duration::from_secs(5), EventKind::new(2), TransactId::new(9));
        engine.schedule(Duration::from_secs(2), EventKind::new(1), TransactId::new(8));

        let expected = "\
pending events:
+-------+-------+----------+
| time  | kind  | transact |
+-------+-------+----------+
| 2s    | 1     | 8        |
+-------+-------+----------+
| 5s    | 2     | 9        |
+-------+-------+----------+
";
        assert_eq!(pending_events(&engine), expected);
    }

    #[rstest]
    fn test_queue_contents_follow_dequeue_order(mut engine: Engine) {
        let backlog = engine.add_queue("backlog");
        engine.enqueue(backlog, TransactId::new(1), Priority::new(1), Stage::new(0));
        engine.enqueue(backlog, TransactId::new(2), Priority::new(0), Stage::new(0));

        let rendered = queue_contents(&engine);
        let first = rendered.find("| backlog | 0").unwrap();
        let second = rendered.find("| backlog | 1").unwrap();
        assert!(first < second);
    }

    #[rstest]
    fn test_empty_queue_renders_a_dash_row(mut engine: Engine) {
        let _ = engine.add_queue("backlog");
        assert!(queue_contents(&engine).contains("| backlog | -"));
    }

    #[rstest]
    fn test_summary_placeholders_before_any_statistics(mut engine: Engine) {
        let _ = engine.add_device("machine");
        let _ = engine.add_queue("backlog");

        let rendered = summary(&engine);
        assert!(rendered.starts_with("simulation time: 0ns\n"));
        assert!(rendered.contains("| machine | -"));
        assert!(rendered.contains("| backlog | -"));
    }

    #[rstest]
    fn test_summary_statistics_after_a_service(mut engine: Engine) {
        let machine = engine.add_device("machine");
        let backlog = engine.add_queue("backlog");

        engine.enqueue(backlog, TransactId::new(2), Priority::new(0), Stage::new(0));
        engine.device_mut(machine).reserve(TransactId::new(1)).unwrap();
        advance(&mut engine, 5);
        engine.head(backlog).unwrap();
        advance(&mut engine, 5);
        engine.device_mut(machine).release().unwrap();

        let rendered = summary(&engine);
        // Machine: one 10s service over a 10s run.
        assert!(rendered.contains("| 10s"));
        assert!(rendered.contains("| 100.00"));
        // Backlog: one transact waited 5s, half the run at length one.
        assert!(rendered.contains("| 5s"));
        assert!(rendered.contains("| 0.00s"));
        assert!(rendered.contains("| 0.50"));
    }

    #[rstest]
    fn test_monitor_combines_all_sections(mut engine: Engine) {
        let _ = engine.add_device("machine");
        let _ = engine.add_queue("backlog");
        advance(&mut engine, 3);

        let rendered = monitor(&engine);
        assert!(rendered.starts_with("*** simulation time: 3s\n"));
        assert!(rendered.contains("pending events:\n"));
        assert!(rendered.contains("devices:\n"));
        assert!(rendered.contains("queues:\n"));
    }

    #[rstest]
    fn test_device_csv_rows(mut engine: Engine) {
        let machine = engine.add_device("machine");
        engine.device_mut(machine).reserve(TransactId::new(1)).unwrap();
        advance(&mut engine, 10);
        engine.device_mut(machine).release().unwrap();

        let mut buffer = Vec::new();
        write_device_csv(&engine, &mut buffer).unwrap();
        let csv = String::from_utf8(buffer).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("device,completed,busy_time_s,utilization")
        );
        assert_eq!(lines.next(), Some("machine,1,10,1"));
        assert_eq!(lines.next(), None);
    }

    #[rstest]
    fn test_queue_csv_rows(mut engine: Engine) {
        let backlog = engine.add_queue("backlog");
        engine.enqueue(backlog, TransactId::new(1), Priority::new(0), Stage::new(0));
        advance(&mut engine, 5);
        engine.head(backlog).unwrap();

        let mut buffer = Vec::new();
        write_queue_csv(&engine, &mut buffer).unwrap();
        let csv = String::from_utf8(buffer).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("queue,dequeued,max_length,wait_time_s,wait_time_sq_s2,length_time_s")
        );
        assert_eq!(lines.next(), Some("backlog,1,1,5,25,5"));
        assert_eq!(lines.next(), None);
    }
}
