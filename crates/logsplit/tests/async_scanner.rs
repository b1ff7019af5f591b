#![cfg(feature = "tokio")]

use std::time::Duration;

use logsplit::TokenizerConfig;
use tokio::io::AsyncWriteExt;

fn tokenizer(toml: &str) -> logsplit::Tokenizer {
    TokenizerConfig::from_toml_str(toml).unwrap().build().unwrap()
}

#[tokio::test(start_paused = true)]
async fn held_multiline_record_is_flushed_after_idle_period() {
    let tokenizer = tokenizer(
        r#"
flush_at_eof = true
force_flush_period_ms = 200

[multiline]
line_start_pattern = "^LOG:"
"#,
    );
    assert_eq!(
        tokenizer.force_flush_period(),
        Some(Duration::from_millis(200))
    );

    let (mut writer, reader) = tokio::io::duplex(256);
    let mut scanner = tokenizer.scan_async(reader);

    writer
        .write_all(b"LOG:one\n  detail\nLOG:two  \n")
        .await
        .unwrap();

    let first = scanner.next_record().await.unwrap().unwrap();
    assert_eq!(first.bytes, b"LOG:one\n  detail");

    // No third marker arrives; the idle timer releases the held record,
    // trimmed like any other.
    let second = scanner.next_record().await.unwrap().unwrap();
    assert_eq!(second.bytes, b"LOG:two");
    assert_eq!(second.offset, 17);
    assert!(scanner.pending().is_empty());

    writer.write_all(b"LOG:three\n").await.unwrap();
    writer.shutdown().await.unwrap();
    drop(writer);

    let third = scanner.next_record().await.unwrap().unwrap();
    assert_eq!(third.bytes, b"LOG:three");
    assert_eq!(third.record_number, 3);
    assert!(scanner.next_record().await.is_none());
}

#[tokio::test]
async fn continuation_arriving_in_time_joins_the_record() {
    let tokenizer = tokenizer(
        r#"
flush_at_eof = true
force_flush_period_ms = 60000

[multiline]
line_start_pattern = "^LOG:"
"#,
    );
    let (mut writer, reader) = tokio::io::duplex(256);
    let mut scanner = tokenizer.scan_async(reader);

    let feed = tokio::spawn(async move {
        for chunk in [&b"LOG:a\n"[..], b"  more\n", b"LOG:b"] {
            writer.write_all(chunk).await.unwrap();
            tokio::task::yield_now().await;
        }
    });

    let mut records = Vec::new();
    while let Some(record) = scanner.next_record().await {
        records.push(record.unwrap().bytes);
    }
    feed.await.unwrap();

    assert_eq!(records, vec![b"LOG:a\n  more".to_vec(), b"LOG:b".to_vec()]);
}

#[tokio::test]
async fn zero_period_disables_force_flush() {
    let tokenizer = tokenizer("force_flush_period_ms = 0\n");
    assert_eq!(tokenizer.force_flush_period(), None);

    let data: &[u8] = b"kept\nheld";
    let mut scanner = tokenizer.scan_async(data);
    let first = scanner.next_record().await.unwrap().unwrap();
    assert_eq!(first.bytes, b"kept");
    assert!(scanner.next_record().await.is_none());
    assert_eq!(scanner.pending(), b"held");
    assert_eq!(scanner.position(), 5);
}
