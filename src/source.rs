use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tracing::debug;

use crate::splitter::{SplitMode, Statement, StatementSplitter};

pub enum SourceMessage {
    Statement(Statement),
    /// Input exhausted after `statements` statements.
    Finished { statements: u64 },
}

/// Read `reader` to the end, sending each statement as soon as it is
/// complete.
///
/// Stops early, without error, once the receiving side is gone.
pub async fn run_source<R>(
    mut reader: R,
    mode: SplitMode,
    tx: mpsc::Sender<SourceMessage>,
) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut splitter = StatementSplitter::new(mode);
    let mut buf = vec![0u8; 16384];
    let mut parse_buf = BytesMut::with_capacity(16384);

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }

        parse_buf.extend_from_slice(&buf[..n]);

        while let Some((statement, consumed)) = splitter.try_split(&parse_buf) {
            let _ = parse_buf.split_to(consumed);
            if tx.send(SourceMessage::Statement(statement)).await.is_err() {
                debug!("Receiver dropped, stopping input");
                return Ok(());
            }
        }
    }

    if let Some(statement) = splitter.finish(&parse_buf) {
        parse_buf.clear();
        if tx.send(SourceMessage::Statement(statement)).await.is_err() {
            return Ok(());
        }
    }

    let statements = splitter.statements();
    debug!("Input finished after {statements} statements");
    let _ = tx.send(SourceMessage::Finished { statements }).await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect(input: &'static [u8], mode: SplitMode) -> (Vec<Statement>, u64) {
        let (tx, mut rx) = mpsc::channel(4);
        let handle = tokio::spawn(run_source(input, mode, tx));

        let mut statements = Vec::new();
        let mut finished = None;
        while let Some(msg) = rx.recv().await {
            match msg {
                SourceMessage::Statement(statement) => statements.push(statement),
                SourceMessage::Finished { statements } => finished = Some(statements),
            }
        }
        handle.await.unwrap().unwrap();
        (statements, finished.unwrap())
    }

    #[tokio::test]
    async fn test_script_source() {
        let input = b"SELECT 1;\nINSERT INTO t VALUES (1),(2);\nSELECT 'tail'";
        let (statements, total) = collect(input, SplitMode::Script).await;
        assert_eq!(total, 3);
        assert_eq!(statements[1].sql, "INSERT INTO t VALUES (1),(2)");
        assert_eq!(statements[2].sql, "SELECT 'tail'");
    }

    #[tokio::test]
    async fn test_lines_source() {
        let (statements, total) = collect(b"1.5\tSELECT 1\nSELECT 2\n", SplitMode::Lines).await;
        assert_eq!(total, 2);
        assert!(statements[0].duration.is_some());
        assert_eq!(statements[1].duration, None);
    }

    #[tokio::test]
    async fn test_dropped_receiver_stops_quietly() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let result = run_source(&b"SELECT 1; SELECT 2;"[..], SplitMode::Script, tx).await;
        assert!(result.is_ok());
    }
}
