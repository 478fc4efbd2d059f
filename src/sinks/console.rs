use discovery::TargetGroup;
use tokio::io::{AsyncWrite, AsyncWriteExt};

pub struct Console<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> Console<W> {
    pub fn new(writer: W) -> Self {
        Console { writer }
    }

    /// Writes the batch as one JSON line.
    pub async fn write(&mut self, batch: &[TargetGroup]) -> std::io::Result<()> {
        let mut buf = serde_json::to_vec(batch)?;
        buf.push(b'\n');

        self.writer.write_all(&buf).await?;
        self.writer.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn json_lines() {
        let mut console = Console::new(Vec::new());

        console
            .write(&[TargetGroup {
                source: "/app1".to_string(),
                targets: vec![[("__address__".to_string(), "host:80".to_string())].into()],
                labels: Default::default(),
            }])
            .await
            .unwrap();
        console
            .write(&[TargetGroup::deleted("/app1")])
            .await
            .unwrap();

        assert_eq!(
            String::from_utf8(console.writer).unwrap(),
            concat!(
                r#"[{"source":"/app1","targets":[{"__address__":"host:80"}],"labels":{}}]"#,
                "\n",
                r#"[{"source":"/app1","targets":[],"labels":{}}]"#,
                "\n",
            )
        );
    }

    #[tokio::test]
    async fn slow_reader_does_not_block_the_runtime() {
        // a pipe with a tiny buffer, nobody reads until the batch is written
        let (writer, mut reader) = tokio::io::duplex(8);
        let mut console = Console::new(writer);

        let write = tokio::spawn(async move {
            console.write(&[TargetGroup::deleted("/app1")]).await
        });

        // the current thread runtime can only get here if the write yields
        tokio::task::yield_now().await;
        assert!(!write.is_finished());

        let mut out = vec![0; 64];
        let mut read = 0;
        while !out[..read].ends_with(b"\n") {
            read += tokio::io::AsyncReadExt::read(&mut reader, &mut out[read..])
                .await
                .unwrap();
        }

        write.await.unwrap().unwrap();
        assert_eq!(
            &out[..read],
            b"[{\"source\":\"/app1\",\"targets\":[],\"labels\":{}}]\n"
        );
    }
}
