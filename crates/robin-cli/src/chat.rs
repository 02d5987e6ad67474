use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use robin_core::{Message, Result, SessionId, Turn};

use crate::app::App;

const QUIT: &str = "/quit";

/// Line-oriented chat loop. Every user line is recorded, and so is every
/// reply, so later messages can be answered from earlier turns.
///
/// Routing errors are printed and the loop continues; only I/O errors end it.
pub async fn run(app: &App, session: SessionId) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text == QUIT {
            break;
        }

        let message = Message::new(text).with_session(session.clone()).now();
        let outcome = app.robin.generate_reply(&message).await;
        app.history.record(&session, Turn::user(text));

        match outcome {
            Ok(reply) => {
                let rendered = reply.render();
                stdout.write_all(format!("{rendered}\n").as_bytes()).await?;
                app.history.record(&session, Turn::assistant(reply.text));
            }
            Err(e) => {
                eprintln!("error [{}]: {}", e.code(), e);
            }
        }
    }

    Ok(())
}
