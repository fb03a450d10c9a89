use crate::mcp::{registry::ToolRegistry, rpc};
use futures::StreamExt;
use std::sync::Arc;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    sync::mpsc,
};
use tokio_stream::wrappers::SplitStream;
use tracing::{debug, info};

pub async fn serve(registry: Arc<ToolRegistry>) -> anyhow::Result<()> {
    serve_io(registry, tokio::io::stdin(), tokio::io::stdout()).await?;
    Ok(())
}

/// Newline-delimited JSON-RPC. Each message runs on its own task; a single
/// writer task owns `writer`, which is handed back once input is exhausted
/// and every in-flight reply has been written.
pub async fn serve_io<R, W>(registry: Arc<ToolRegistry>, reader: R, writer: W) -> anyhow::Result<W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<String>(64);
    let writer_task = tokio::spawn(async move {
        let mut writer = writer;
        while let Some(line) = rx.recv().await {
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
        Ok::<_, std::io::Error>(writer)
    });

    // A line that is not UTF-8 is answered with a parse error.
    let mut lines = SplitStream::new(BufReader::new(reader).split(b'\n'));
    while let Some(line) = lines.next().await {
        let line = line?;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let registry = registry.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let response = match std::str::from_utf8(&line) {
                Ok(text) => rpc::handle_raw(&registry, text).await,
                Err(e) => Some(rpc::parse_failure(e)),
            };
            if let Some(response) = response {
                if tx.send(response.to_string()).await.is_err() {
                    debug!("stdio writer closed before reply was sent");
                }
            }
        });
    }
    drop(tx);
    info!("stdin closed, draining replies");

    let writer = writer_task.await??;
    Ok(writer)
}
