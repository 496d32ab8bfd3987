// NDJSON change-event files: one JSON event object per line.

use std::path::Path;

use streamgrid_engine::events::ChangeEvent;

/// A parsed event file. Lines that are not JSON objects are counted and
/// skipped here; structurally valid events missing `rowId` flow through to
/// the reconciler, which drops and reports them.
#[derive(Debug, Default)]
pub struct EventLog {
    pub events: Vec<ChangeEvent>,
    pub skipped_lines: usize,
}

pub fn read_events(path: &Path) -> Result<EventLog, String> {
    let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    Ok(parse_events(&content))
}

fn parse_events(content: &str) -> EventLog {
    let mut log = EventLog::default();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<ChangeEvent>(line) {
            Ok(event) => log.events.push(event),
            Err(_) => log.skipped_lines += 1,
        }
    }
    log
}

/// Serialize events back to NDJSON, used by tests and replay fixtures.
pub fn write_events(path: &Path, events: &[ChangeEvent]) -> Result<(), String> {
    let mut out = String::new();
    for event in events {
        out.push_str(&serde_json::to_string(event).map_err(|e| e.to_string())?);
        out.push('\n');
    }
    std::fs::write(path, out).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    use streamgrid_engine::events::ChangeKind;
    use streamgrid_engine::row::RowId;

    #[test]
    fn test_reads_one_event_per_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.ndjson");
        fs::write(
            &path,
            concat!(
                "{\"kind\":\"created\",\"rowId\":1,\"row\":{\"name\":\"Ann\"}}\n",
                "{\"kind\":\"deleted\",\"rowId\":1}\n",
            ),
        )
        .unwrap();

        let log = read_events(&path).unwrap();
        assert_eq!(log.events.len(), 2);
        assert_eq!(log.skipped_lines, 0);
        assert_eq!(log.events[0].kind, ChangeKind::Created);
        assert_eq!(log.events[1].row_id, Some(RowId(1)));
    }

    #[test]
    fn test_non_json_lines_are_counted_and_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.ndjson");
        fs::write(
            &path,
            concat!(
                "{\"kind\":\"created\",\"rowId\":1,\"row\":{}}\n",
                "this is not json\n",
                "\n",
                "{\"kind\":\"deleted\",\"rowId\":1}\n",
            ),
        )
        .unwrap();

        let log = read_events(&path).unwrap();
        assert_eq!(log.events.len(), 2);
        assert_eq!(log.skipped_lines, 1, "blank lines are not counted");
    }

    #[test]
    fn test_events_missing_row_id_still_parse() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.ndjson");
        fs::write(&path, "{\"kind\":\"updated\",\"row\":{\"name\":\"Ann\"}}\n").unwrap();

        // malformed at the domain level, not the file level; the
        // reconciler is the one that drops it
        let log = read_events(&path).unwrap();
        assert_eq!(log.events.len(), 1);
        assert!(log.events[0].row_id.is_none());
    }

    #[test]
    fn test_write_read_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.ndjson");
        let events = vec![
            ChangeEvent::new(ChangeKind::Created, RowId(1))
                .with_field("name", serde_json::json!("Ann")),
            ChangeEvent::new(ChangeKind::Deleted, RowId(1)),
        ];

        write_events(&path, &events).unwrap();
        let log = read_events(&path).unwrap();
        assert_eq!(log.events, events);
    }
}
