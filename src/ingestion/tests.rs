//! Ingestion Module Tests
//!
//! ## Test Scopes
//! - **Record Parsing**: Field layout, hint lists, malformed lines.
//! - **Batch Reader**: Batching by size, headers, blank and malformed lines, end of input.
//! - **Collector**: Ordering of answers and failures across flushes.

#[cfg(test)]
mod tests {
    use crate::config::ClusterConfig;
    use crate::coordinator::protocol::{MasterHandle, MasterMessage};
    use crate::error::RecordParseError;
    use crate::hashing::types::ContentHash;
    use crate::ingestion::collector::Collector;
    use crate::ingestion::reader::BatchReader;
    use crate::ingestion::types::Record;
    use std::io::Cursor;
    use tokio::sync::mpsc;

    fn line(id: u32, name: &str, password: &str, hints: &[&str]) -> String {
        let mut fields = vec![
            id.to_string(),
            name.to_string(),
            "ABCDE".to_string(),
            password.len().to_string(),
            ContentHash::digest(password.as_bytes()).to_hex(),
        ];
        fields.extend(hints.iter().map(|h| ContentHash::digest(h.as_bytes()).to_hex()));
        fields.join(",")
    }

    fn config(batch_size: usize, has_header: bool) -> ClusterConfig {
        ClusterConfig {
            batch_size,
            has_header,
            ..ClusterConfig::default()
        }
    }

    fn reader(input: String, config: &ClusterConfig) -> BatchReader<Cursor<Vec<u8>>> {
        BatchReader::new(Cursor::new(input.into_bytes()), config)
    }

    // ============================================================
    // RECORD PARSING
    // ============================================================

    #[test]
    fn test_parse_full_record() {
        let input = line(7, "Ada", "ABBA", &["ABCD", "BCDE"]);

        let record = Record::from_line(&input, ',').unwrap();

        assert_eq!(record.id, 7);
        assert_eq!(record.name, "Ada");
        assert_eq!(record.password_chars, "ABCDE");
        assert_eq!(record.password_length, 4);
        assert_eq!(record.password_hash, ContentHash::digest(b"ABBA"));
        assert_eq!(
            record.hint_hashes,
            vec![ContentHash::digest(b"ABCD"), ContentHash::digest(b"BCDE")]
        );
    }

    #[test]
    fn test_parse_record_without_hints() {
        let record = Record::from_line(&line(1, "Bob", "AB", &[]), ',').unwrap();

        assert!(record.hint_hashes.is_empty());
    }

    #[test]
    fn test_parse_custom_delimiter_and_whitespace() {
        let input = line(3, "Eve", "CC", &["ABCD"]).replace(',', " ; ");

        let record = Record::from_line(&input, ';').unwrap();

        assert_eq!(record.id, 3);
        assert_eq!(record.name, "Eve");
        assert_eq!(record.hint_hashes.len(), 1);
    }

    #[test]
    fn test_parse_ignores_trailing_delimiter() {
        let input = format!("{},", line(3, "Eve", "CC", &["ABCD"]));

        let record = Record::from_line(&input, ',').unwrap();

        assert_eq!(record.hint_hashes.len(), 1);
    }

    #[test]
    fn test_parse_rejects_short_line() {
        let result = Record::from_line("1,Ada,ABCD,4", ',');

        assert!(matches!(result, Err(RecordParseError::FieldCount(4))));
    }

    #[test]
    fn test_parse_rejects_non_numeric_fields() {
        let bad_id = line(1, "Ada", "AB", &[]).replacen('1', "x", 1);
        assert!(matches!(
            Record::from_line(&bad_id, ','),
            Err(RecordParseError::InvalidNumber { field: "id", .. })
        ));

        let bad_length = "1,Ada,ABCDE,four,".to_string() + &ContentHash::digest(b"x").to_hex();
        assert!(matches!(
            Record::from_line(&bad_length, ','),
            Err(RecordParseError::InvalidNumber {
                field: "passwordLength",
                ..
            })
        ));
    }

    #[test]
    fn test_parse_rejects_bad_hint_hash() {
        let input = format!("{},nothex", line(1, "Ada", "AB", &["ABCD"]));

        match Record::from_line(&input, ',') {
            Err(RecordParseError::InvalidHash { field, .. }) => assert_eq!(field, "hint2"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    // ============================================================
    // BATCH READER
    // ============================================================

    #[tokio::test]
    async fn test_reader_splits_input_into_batches() {
        // ARRANGE: five records, batches of two
        let input: Vec<String> = (1..=5).map(|id| line(id, "n", "AB", &[])).collect();
        let mut reader = reader(input.join("\n"), &config(2, false));

        // ACT
        let sizes = [
            reader.next_batch().await.len(),
            reader.next_batch().await.len(),
            reader.next_batch().await.len(),
            reader.next_batch().await.len(),
        ];

        // ASSERT: the last read is the end-of-input marker
        assert_eq!(sizes, [2, 2, 1, 0]);
    }

    #[tokio::test]
    async fn test_reader_skips_header_blank_and_malformed_lines() {
        let input = [
            "id,name,chars,length,hash,hints".to_string(),
            line(1, "a", "AB", &[]),
            String::new(),
            "   ".to_string(),
            "garbage".to_string(),
            line(2, "b", "AB", &[]),
        ]
        .join("\n");
        let mut reader = reader(input, &config(10, true));

        let batch = reader.next_batch().await;

        let ids: Vec<u32> = batch.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(reader.next_batch().await.is_empty());
    }

    #[tokio::test]
    async fn test_reader_task_answers_requests_in_order() {
        // ARRANGE
        let input: Vec<String> = (1..=3).map(|id| line(id, "n", "AB", &[])).collect();
        let (handle, task) = reader(input.join("\n"), &config(2, false)).spawn();
        let (master_tx, mut master_rx) = mpsc::unbounded_channel();
        let master = MasterHandle::new(master_tx);

        // ACT / ASSERT
        let mut sizes = Vec::new();
        for _ in 0..3 {
            handle.request_batch(master.clone());
            match master_rx.recv().await {
                Some(MasterMessage::Batch(records)) => sizes.push(records.len()),
                _ => panic!("expected a batch"),
            }
        }
        assert_eq!(sizes, vec![2, 1, 0]);

        drop(handle);
        task.await.unwrap();
    }

    // ============================================================
    // COLLECTOR
    // ============================================================

    #[tokio::test]
    async fn test_collector_writes_answers_before_failures() {
        // ARRANGE
        let (collector, task) = Collector::new(Box::new(std::io::sink())).spawn();

        // ACT
        collector.failure("failed 2".to_string());
        collector.collect("answer 1".to_string());
        collector.flush();
        collector.collect("answer 3".to_string());
        drop(collector);

        // ASSERT: the second answer is flushed when the collector stops
        let results = task.await.unwrap().unwrap();
        assert_eq!(results.answers, vec!["answer 1", "answer 3"]);
        assert_eq!(results.failures, vec!["failed 2"]);
    }

    #[tokio::test]
    async fn test_collector_with_nothing_to_write() {
        let (collector, task) = Collector::new(Box::new(std::io::sink())).spawn();

        collector.flush();
        drop(collector);

        let results = task.await.unwrap().unwrap();
        assert!(results.answers.is_empty());
        assert!(results.failures.is_empty());
    }
}
