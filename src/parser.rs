use std::io::BufRead;
use std::path::Path;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ConvertError;
use crate::event::{Event, LineRecord, ParsedLog, SessionStamp};

/// Date/time block the testing tool embeds in log filenames:
/// `..._2021-07-16_09h56.52.759.log`
static SESSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4}-\d{2}-\d{2})_(\d{2})h(\d{2})\.(\d{2})\.(\d{3})").expect("valid regex")
});

/// Parse decoded log content into an ordered event sequence.
///
/// Events are kept strictly in file order; nothing is re-sorted or
/// deduplicated. Lines without the timestamp/category/payload shape are
/// skipped silently (logs routinely start with banner lines), while lines
/// with the right shape but a bad timestamp are counted as malformed.
/// Invalid UTF-8 is replaced rather than rejected, matching how the logs
/// are read everywhere else in the lab pipeline.
pub fn parse_log<R: BufRead>(mut reader: R, source: &Path) -> Result<ParsedLog, ConvertError> {
    let mut log = ParsedLog {
        session: session_stamp(source),
        ..Default::default()
    };

    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| ConvertError::Unreadable {
                path: source.to_path_buf(),
                source: e,
            })?;
        if n == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        match classify_line(&line) {
            LineRecord::Parsed(event) => log.events.push(event),
            LineRecord::Malformed => log.malformed_lines += 1,
            LineRecord::Skipped => {}
        }
    }

    Ok(log)
}

/// Classify one raw line as an event, a silent skip, or a malformed skip.
///
/// Only tab-separated lines can come out malformed: that is the shape the
/// tool emits, so a bad timestamp there is worth counting. A space-separated
/// line with a non-numeric head is indistinguishable from prose and is
/// skipped as a banner.
pub fn classify_line(line: &str) -> LineRecord {
    let line = line.trim_end_matches(['\n', '\r']);
    if line.trim().is_empty() {
        return LineRecord::Skipped;
    }

    if line.contains('\t') {
        let Some((ts_str, category, payload)) = split_tabs(line) else {
            return LineRecord::Skipped;
        };
        match ts_str.parse::<f64>() {
            Ok(timestamp) => LineRecord::Parsed(make_event(timestamp, category, payload)),
            Err(_) => LineRecord::Malformed,
        }
    } else {
        match split_whitespace_fields(line) {
            Some((ts_str, category, payload)) => match ts_str.parse::<f64>() {
                Ok(timestamp) => LineRecord::Parsed(make_event(timestamp, category, payload)),
                Err(_) => LineRecord::Skipped,
            },
            None => LineRecord::Skipped,
        }
    }
}

fn make_event(timestamp: f64, category: &str, payload: &str) -> Event {
    Event {
        timestamp,
        category: category.to_string(),
        payload: payload.to_string(),
        fields: extract_fields(payload),
    }
}

/// Tab-separated split, the shape the testing tool emits. The payload keeps
/// its inner spacing verbatim.
fn split_tabs(line: &str) -> Option<(&str, &str, &str)> {
    let mut parts = line.splitn(3, '\t');
    let ts = parts.next()?;
    let category = parts.next()?;
    let payload = parts.next()?;
    Some((ts.trim(), category.trim(), payload))
}

/// Whitespace-run fallback for hand-edited logs without tabs.
fn split_whitespace_fields(line: &str) -> Option<(&str, &str, &str)> {
    let rest = line.trim_start();
    let ts_end = rest.find(char::is_whitespace)?;
    let (ts, tail) = rest.split_at(ts_end);
    let tail = tail.trim_start();
    let cat_end = tail.find(char::is_whitespace)?;
    let (category, payload) = tail.split_at(cat_end);
    Some((ts, category, payload.trim_start()))
}

/// Pull `key=value` and `key = value` pairs out of a payload.
///
/// Extraction never fails: a payload with no recognizable pairs just yields
/// an empty map. Duplicate keys keep their first position; the last value
/// wins.
fn extract_fields(payload: &str) -> IndexMap<String, String> {
    let mut fields = IndexMap::new();
    let tokens: Vec<&str> = payload.split_ascii_whitespace().collect();

    let mut i = 0;
    while i < tokens.len() {
        if tokens.get(i + 1) == Some(&"=") {
            // spaced form: key = value
            if let Some(value) = tokens.get(i + 2) {
                fields.insert(tokens[i].to_string(), (*value).to_string());
                i += 3;
                continue;
            }
        }
        if let Some((key, value)) = tokens[i].split_once('=') {
            if !key.is_empty() {
                fields.insert(key.to_string(), value.to_string());
            }
        }
        i += 1;
    }

    fields
}

/// Recover the experiment date and time encoded in the log filename.
/// Returns `None` when the filename does not carry the pattern; that is
/// normal for logs renamed by hand.
pub fn session_stamp(path: &Path) -> Option<SessionStamp> {
    let name = path.file_name()?.to_str()?;
    let caps = SESSION_RE.captures(name)?;
    Some(SessionStamp {
        date: caps[1].to_string(),
        time: format!("{}:{}:{}.{}", &caps[2], &caps[3], &caps[4], &caps[5]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn parse_str(content: &str) -> ParsedLog {
        parse_log(Cursor::new(content), Path::new("test.log")).unwrap()
    }

    #[test]
    fn classifies_tab_separated_event() {
        let record = classify_line("12.4685\tEXP\tfirstImg: autoDraw = true\n");
        let LineRecord::Parsed(event) = record else {
            panic!("expected parsed event");
        };
        assert_eq!(event.timestamp, 12.4685);
        assert_eq!(event.category, "EXP");
        assert_eq!(event.payload, "firstImg: autoDraw = true");
        assert_eq!(event.fields.get("autoDraw"), Some(&"true".to_string()));
    }

    #[test]
    fn classifies_whitespace_separated_event() {
        let record = classify_line("3.25 DATA Keydown: 1");
        let LineRecord::Parsed(event) = record else {
            panic!("expected parsed event");
        };
        assert_eq!(event.timestamp, 3.25);
        assert_eq!(event.category, "DATA");
        assert_eq!(event.payload, "Keydown: 1");
    }

    #[test]
    fn blank_and_banner_lines_are_skipped_silently() {
        assert_eq!(classify_line(""), LineRecord::Skipped);
        assert_eq!(classify_line("   \n"), LineRecord::Skipped);
        assert_eq!(classify_line("PsychoPy version 2021.2.3"), LineRecord::Skipped);
        assert_eq!(classify_line("onlyoneword"), LineRecord::Skipped);
    }

    #[test]
    fn bad_timestamp_with_event_shape_is_malformed() {
        assert_eq!(classify_line("oops\tEXP\tsomething"), LineRecord::Malformed);
        assert_eq!(classify_line("12,5\tEXP\tcomma decimal"), LineRecord::Malformed);
    }

    #[test]
    fn malformed_lines_are_counted_not_fatal() {
        let content = "\
1.0\tEXP\tstart
bad\tEXP\tno timestamp
2.0\tEXP\tend
";
        let log = parse_str(content);
        assert_eq!(log.events.len(), 2);
        assert_eq!(log.malformed_lines, 1);
    }

    #[test]
    fn event_order_follows_file_order_not_timestamps() {
        let content = "3.5\tEXP\ta\n1.5\tEXP\tb\n2.5\tEXP\tc\n";
        let log = parse_str(content);
        let stamps: Vec<f64> = log.events.iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![3.5, 1.5, 2.5]);
    }

    #[test]
    fn duplicate_events_are_both_kept() {
        let content = "1.0\tDATA\tKeydown: 1\n1.0\tDATA\tKeydown: 1\n";
        let log = parse_str(content);
        assert_eq!(log.events.len(), 2);
        assert_eq!(log.events[0], log.events[1]);
    }

    #[test]
    fn non_ascii_payload_is_preserved() {
        let record = classify_line("5.0\tEXP\ttext = Привет");
        let LineRecord::Parsed(event) = record else {
            panic!("expected parsed event");
        };
        assert_eq!(event.payload, "text = Привет");
        assert_eq!(event.fields.get("text"), Some(&"Привет".to_string()));
    }

    #[test]
    fn extracts_compact_and_spaced_pairs() {
        let fields = extract_fields("pos=(0,0) firstImg: autoDraw = null size = 1.5");
        assert_eq!(fields.get("pos"), Some(&"(0,0)".to_string()));
        assert_eq!(fields.get("autoDraw"), Some(&"null".to_string()));
        assert_eq!(fields.get("size"), Some(&"1.5".to_string()));
        let keys: Vec<&str> = fields.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, ["pos", "autoDraw", "size"]);
    }

    #[test]
    fn payload_without_pairs_yields_no_fields() {
        assert!(extract_fields("Keydown: space").is_empty());
        assert!(extract_fields("").is_empty());
    }

    #[test]
    fn session_stamp_from_typical_filename() {
        let path =
            PathBuf::from("P01_time_perception_2021-07-16_09h56.52.759.log.gz");
        let stamp = session_stamp(&path).unwrap();
        assert_eq!(stamp.date, "2021-07-16");
        assert_eq!(stamp.time, "09:56:52.759");
    }

    #[test]
    fn session_stamp_absent_for_plain_names() {
        assert_eq!(session_stamp(Path::new("renamed.log")), None);
    }

    proptest! {
        #[test]
        fn tab_separated_payload_survives_verbatim(payload in "[^\\t\\r\\n]{0,60}") {
            let line = format!("12.5\tEXP\t{payload}");
            match classify_line(&line) {
                LineRecord::Parsed(event) => prop_assert_eq!(event.payload, payload),
                other => prop_assert!(false, "expected parsed event, got {:?}", other),
            }
        }

        #[test]
        fn finite_timestamps_roundtrip(ts in 0.0f64..1.0e6) {
            let line = format!("{ts}\tEXP\tmarker");
            match classify_line(&line) {
                LineRecord::Parsed(event) => prop_assert_eq!(event.timestamp, ts),
                other => prop_assert!(false, "expected parsed event, got {:?}", other),
            }
        }
    }
}
