use std::env;
use std::error::Error;
use std::io::{self, Write};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use lobby_protocol::{decode_client_event, decode_server_event};
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Where to connect: env override or default.
    let url = env::var("LOBBY_CLIENT_URL").unwrap_or_else(|_| "ws://127.0.0.1:9000".to_string());

    println!("Connecting to {}...", url);
    let (ws_stream, _) = connect_async(url.as_str()).await?;
    let (mut write, mut read) = ws_stream.split();
    println!("Connected.");
    println!("Type one JSON envelope per line, e.g.:");
    println!(r#"  {{"event":"createLobby","data":{{"machine":{{"player1":{{"playerId":"P1","profileName":"me"}}}}}}}}"#);
    println!(r#"  {{"event":"searchLobby"}}"#);
    println!("Type 'quit' or 'exit' to leave.\n");

    let stdin = io::stdin();

    loop {
        print!(">> ");
        io::stdout().flush()?;

        let mut line = String::new();
        let n = stdin.read_line(&mut line)?;
        if n == 0 {
            println!("\nEOF on stdin, exiting client.");
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
            println!("Exiting client.");
            break;
        }

        if let Err(e) = decode_client_event(trimmed.as_bytes()) {
            eprintln!("Not a valid client envelope: {}", e);
            continue;
        }
        write.send(Message::text(trimmed.to_string())).await?;

        // Print everything that arrives shortly after.
        loop {
            let frame = match timeout(Duration::from_millis(100), read.next()).await {
                Ok(Some(Ok(frame))) => frame,
                Ok(Some(Err(e))) => return Err(e.into()),
                Ok(None) => {
                    println!("Server closed the connection.");
                    return Ok(());
                }
                Err(_) => break,
            };

            if let Message::Text(text) = frame {
                match decode_server_event(text.as_bytes()) {
                    Ok(event) => println!("<< {:?}", event),
                    Err(_) => println!("<< {}", text.as_str()),
                }
            }
        }
    }

    let _ = write.send(Message::Close(None)).await;
    Ok(())
}
